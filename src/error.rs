use thiserror::Error;

/// Stage of chart assembly an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Directive misuse, surfaced while directives are built or applied
    Usage,
    /// No usable data range at finalize time
    DegenerateRange,
    /// Malformed encoded data handed to the decoder
    Encoding,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Unknown directive '{0}'")]
    UnknownDirective(String),

    #[error("Too few arguments to '{directive}': expected at least {min}, got {got}")]
    TooFewArguments {
        directive: String,
        min: usize,
        got: usize,
    },

    #[error("Too many arguments to '{directive}': expected at most {max}, got {got}")]
    TooManyArguments {
        directive: String,
        max: usize,
        got: usize,
    },

    #[error("'{directive}' is not allowed {location}")]
    MisplacedDirective {
        directive: String,
        location: &'static str,
    },

    #[error("Unknown argument to '{directive}': '{argument}'")]
    UnknownArgument { directive: String, argument: String },

    #[error("Sorry, '{0}' isn't implemented yet!")]
    NotImplemented(String),

    #[error("Invalid axis: {0}")]
    InvalidAxis(String),

    #[error("Invalid color '{0}': expected six hex digits")]
    InvalidColor(String),

    #[error("Invalid chart size '{0}': expected WIDTHxHEIGHT")]
    InvalidSize(String),

    #[error("Cannot infer a data range: no dataset contains any values")]
    EmptyData,

    #[error("Degenerate data range ({min}, {max}): range width is zero")]
    DegenerateRange { min: f64, max: f64 },

    #[error("Invalid extended encoding: {0}")]
    InvalidEncoding(String),
}

impl ChartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChartError::EmptyData | ChartError::DegenerateRange { .. } => {
                ErrorKind::DegenerateRange
            }
            ChartError::InvalidEncoding(_) => ErrorKind::Encoding,
            _ => ErrorKind::Usage,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ChartError::EmptyData.kind(), ErrorKind::DegenerateRange);
        assert_eq!(
            ChartError::DegenerateRange { min: 1.0, max: 1.0 }.kind(),
            ErrorKind::DegenerateRange
        );
        assert_eq!(
            ChartError::UnknownDirective("chart-foo".to_string()).kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            ChartError::InvalidEncoding("x".to_string()).kind(),
            ErrorKind::Encoding
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ChartError::TooFewArguments {
            directive: "chart-size".to_string(),
            min: 1,
            got: 0,
        };
        assert!(err.to_string().contains("Too few arguments to 'chart-size'"));
        assert_eq!(
            ChartError::NotImplemented("saveas".to_string()).to_string(),
            "Sorry, 'saveas' isn't implemented yet!"
        );
    }
}
