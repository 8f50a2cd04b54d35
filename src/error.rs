use std::fmt;
use std::num::ParseIntError;

#[derive(Debug)]
pub enum RtError {
    ParseInt(ParseIntError),
    InvalidInput(String),
    Inconsistent(String),
}

impl fmt::Display for RtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtError::ParseInt(err) => write!(f, "Parse int error: {}", err),
            RtError::InvalidInput(msg) => write!(f, "InvalidInput: {}", msg),
            RtError::Inconsistent(msg) => write!(f, "Internal inconsistency: {}", msg),
        }
    }
}

impl std::error::Error for RtError {}

impl From<ParseIntError> for RtError {
    fn from(err: ParseIntError) -> RtError {
        RtError::ParseInt(err)
    }
}

pub type RtResult<T> = std::result::Result<T, RtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_converts() {
        fn pos(s: &str) -> RtResult<u64> {
            Ok(s.parse::<u64>()?)
        }
        assert!(matches!(pos("12x"), Err(RtError::ParseInt(_))));
        assert_eq!(pos("12").unwrap(), 12);
    }

    #[test]
    fn test_display() {
        let err = RtError::Inconsistent("partner missing".to_string());
        assert_eq!(err.to_string(), "Internal inconsistency: partner missing");
    }
}
