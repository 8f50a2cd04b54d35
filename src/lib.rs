pub mod annotation;
pub mod breakpoints;
pub mod chromosome;
pub mod classify;
pub mod cmd;
pub mod constants;
pub mod error;
pub mod group;
pub mod io;
pub mod logger;
pub mod matcher;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod score;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;
