//! Error types for the event log.

/// Error type for event log operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dispatcher side of the channel has gone away.
    #[error("event channel closed")]
    ChannelClosed,

    /// Appending to the log failed.
    #[error("append failed: {0}")]
    Append(String),

    /// A consumer could not poll, seek or commit.
    #[error("consumer error: {0}")]
    Consumer(String),

    /// Reading or writing a log file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An event could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for event log operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_closed_displays_correctly() {
        assert_eq!(Error::ChannelClosed.to_string(), "event channel closed");
    }

    #[test]
    fn append_error_includes_reason() {
        let err = Error::Append("disk full".into());
        assert!(err.to_string().contains("disk full"));
    }
}
