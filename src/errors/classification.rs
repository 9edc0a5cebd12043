use super::types::ScanwatchError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl ScanwatchError {
    /// Classify this error to determine its type and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient transport failures
            ScanwatchError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                retryable: true,
            },
            ScanwatchError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                retryable: true,
            },
            ScanwatchError::Stream(_) => ErrorClassification {
                error_type: "StreamError",
                retryable: true,
            },

            ScanwatchError::Config(_) => ErrorClassification {
                error_type: "ConfigurationError",
                retryable: false,
            },
            ScanwatchError::Protocol(_) => ErrorClassification {
                error_type: "ProtocolError",
                retryable: false,
            },
            ScanwatchError::NotFound(_) => ErrorClassification {
                error_type: "NotFoundError",
                retryable: false,
            },
            ScanwatchError::InvalidRequest(_) => ErrorClassification {
                error_type: "InvalidRequestError",
                retryable: false,
            },
            ScanwatchError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: false,
            },
            ScanwatchError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                retryable: false,
            },
            ScanwatchError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                retryable: false,
            },
            ScanwatchError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                retryable: false,
            },
        }
    }

    /// Process exit code used by the CLI for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanwatchError::Config(_) | ScanwatchError::Yaml(_) => 2,
            ScanwatchError::Network(_) | ScanwatchError::Timeout(_) | ScanwatchError::Stream(_) => 3,
            ScanwatchError::NotFound(_) => 4,
            ScanwatchError::InvalidRequest(_) => 5,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(ScanwatchError::Network("reset".into()).classify().retryable);
        assert!(ScanwatchError::Timeout("slow".into()).classify().retryable);
        assert!(ScanwatchError::Stream("closed".into()).classify().retryable);
    }

    #[test]
    fn test_request_errors_are_not_retryable() {
        let class = ScanwatchError::NotFound("project".into()).classify();
        assert!(!class.retryable);
        assert_eq!(class.error_type, "NotFoundError");
        assert!(!ScanwatchError::Protocol("bad frame".into()).classify().retryable);
        assert!(!ScanwatchError::Config("bad".into()).classify().retryable);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ScanwatchError::Config("x".into()).exit_code(), 2);
        assert_eq!(ScanwatchError::Network("x".into()).exit_code(), 3);
        assert_eq!(ScanwatchError::NotFound("x".into()).exit_code(), 4);
        assert_eq!(ScanwatchError::InvalidRequest("x".into()).exit_code(), 5);
        assert_eq!(ScanwatchError::Internal("x".into()).exit_code(), 1);
    }
}
