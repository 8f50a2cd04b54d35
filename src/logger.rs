use env_logger::{fmt::Formatter, Builder, Env};
use log::{LevelFilter, Record};
use std::{io::Write, path::Path};

/// Install the global logger. `RUST_LOG` wins over the default level; `verbose`
/// lowers the default from info to debug.
pub fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format(|buf: &mut Formatter, record: &Record| {
        let file = record.file().unwrap_or("unknown");
        let filename = Path::new(file)
            .file_name()
            .and_then(|f| f.to_str().map(|s| s.trim_end_matches(".rs")))
            .unwrap_or(file);

        writeln!(
            buf,
            "rtdetect [{}] [{}] {}",
            filename,
            record.level(),
            record.args()
        )
    });

    if verbose {
        builder.filter_module("rtdetect", LevelFilter::Debug);
    }

    // a second init (e.g. from tests) is harmless
    let _ = builder.try_init();
}
