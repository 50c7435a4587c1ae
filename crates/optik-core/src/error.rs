use thiserror::Error;

/// Top-level error type for the Optik system.
///
/// Collaborator failures (`Input`, `Dictation`) are reported by the frame
/// pipeline without stopping it. `Config` errors are raised at construction
/// time, never while frames are being processed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OptikError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Landmark error: {0}")]
    Landmark(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Input injection error: {0}")]
    Input(String),

    #[error("Dictation error: {0}")]
    Dictation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Shutdown in progress")]
    ShuttingDown,
}

impl From<toml::de::Error> for OptikError {
    fn from(err: toml::de::Error) -> Self {
        OptikError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OptikError {
    fn from(err: toml::ser::Error) -> Self {
        OptikError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OptikError {
    fn from(err: serde_json::Error) -> Self {
        OptikError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Optik operations.
pub type Result<T> = std::result::Result<T, OptikError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OptikError::Config("alpha out of range".to_string());
        assert_eq!(err.to_string(), "Configuration error: alpha out of range");
    }

    #[test]
    fn test_error_display_collaborators() {
        let cases: Vec<(OptikError, &str)> = vec![
            (
                OptikError::Input("permission denied".to_string()),
                "Input injection error: permission denied",
            ),
            (
                OptikError::Dictation("microphone busy".to_string()),
                "Dictation error: microphone busy",
            ),
            (
                OptikError::Landmark("expected 21 points, got 20".to_string()),
                "Landmark error: expected 21 points, got 20",
            ),
            (
                OptikError::Capture("replay file ended".to_string()),
                "Capture error: replay file ended",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OptikError = io_err.into();
        assert!(matches!(err, OptikError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let optik_err: OptikError = err.unwrap_err().into();
        assert!(matches!(optik_err, OptikError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let optik_err: OptikError = err.unwrap_err().into();
        assert!(matches!(optik_err, OptikError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(format!("value={}", value))
        }

        assert_eq!(inner().unwrap(), "value=42");
    }
}
