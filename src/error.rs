//! Errors returned by senders and the sender factory

/// Broad class of a `SendError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or missing required settings
    Configuration,
    /// Open/close/send called out of order
    LifecycleMisuse,
    /// Failure reported by the destination or its client library
    Transport,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("SENDER_PACKAGE {0} is not valid")]
    InvalidBackend(String),

    #[error("sendhec requires HEC_TOKEN")]
    MissingToken,

    #[error("OpenSvc() called again; session is already open")]
    AlreadyOpen,

    #[error("session is not open; OpenSvc() must be called first")]
    NotOpen,

    #[error("AMQP connection closed unexpectedly: {cause}{}", close_suffix(.close_error))]
    ConnectionClosed { cause: String, close_error: Option<String> },

    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("HEC rejected event with status {status} (code {code}): {text}")]
    Collector { status: u16, code: i64, text: String },

    #[error("SNS publish failed: {0}")]
    Sns(String),

    #[error("Failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to start runtime: {0}")]
    Runtime(String),

    #[error("Failed to write trace output: {0}")]
    Diagnostics(#[from] std::io::Error),
}

impl SendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SendError::InvalidBackend(_) | SendError::MissingToken => ErrorKind::Configuration,
            SendError::AlreadyOpen | SendError::NotOpen => ErrorKind::LifecycleMisuse,
            SendError::ConnectionClosed { .. }
            | SendError::Amqp(_)
            | SendError::Http(_)
            | SendError::Collector { .. }
            | SendError::Sns(_)
            | SendError::Serialize(_)
            | SendError::Runtime(_)
            | SendError::Diagnostics(_) => ErrorKind::Transport,
        }
    }
}

fn close_suffix(close_error: &Option<String>) -> String {
    close_error
        .as_ref()
        .map(|e| format!("; also got error from CloseSvc: {}", e))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SendError::InvalidBackend("i do not exist".to_string());
        assert_eq!(error.to_string(), "SENDER_PACKAGE i do not exist is not valid");
        assert_eq!(SendError::MissingToken.to_string(), "sendhec requires HEC_TOKEN");
    }

    #[test]
    fn test_connection_closed_display() {
        let error = SendError::ConnectionClosed {
            cause: "broker went away".to_string(),
            close_error: None,
        };
        assert_eq!(error.to_string(), "AMQP connection closed unexpectedly: broker went away");

        let error = SendError::ConnectionClosed {
            cause: "broker went away".to_string(),
            close_error: Some("socket closed".to_string()),
        };
        assert!(error.to_string().ends_with("also got error from CloseSvc: socket closed"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(SendError::InvalidBackend("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(SendError::MissingToken.kind(), ErrorKind::Configuration);
        assert_eq!(SendError::AlreadyOpen.kind(), ErrorKind::LifecycleMisuse);
        assert_eq!(SendError::NotOpen.kind(), ErrorKind::LifecycleMisuse);
        assert_eq!(SendError::Sns("denied".into()).kind(), ErrorKind::Transport);
        assert_eq!(
            SendError::Collector {
                status: 403,
                code: 4,
                text: "Invalid token".into()
            }
            .kind(),
            ErrorKind::Transport
        );
    }
}
