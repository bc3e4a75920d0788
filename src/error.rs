use crate::invocation::BoxError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pool saturated: {capacity} tasks already in flight")]
    Saturated { capacity: usize },

    #[error("pool shut down")]
    Shutdown,

    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("pool already started")]
    AlreadyStarted,

    #[error("{kind}: {message}")]
    Recognized { kind: String, message: String },

    #[error("unexpected error")]
    Unexpected(#[source] BoxError),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn recognized<K: Into<String>, M: Into<String>>(kind: K, message: M) -> Self {
        Error::Recognized {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Classify an arbitrary failure cause.
    ///
    /// A cause that is already a framework [`Error`] passes through
    /// unchanged; anything else is wrapped in [`Error::Unexpected`] with
    /// the original retained as its `source()`.
    pub(crate) fn classify(cause: BoxError) -> Self {
        match cause.downcast::<Error>() {
            Ok(err) => *err,
            Err(cause) => Error::Unexpected(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_passes_framework_errors_through() {
        let cause: BoxError = Box::new(Error::recognized("NotFound", "no such route"));

        match Error::classify(cause) {
            Error::Recognized { kind, message } => {
                assert_eq!(kind, "NotFound");
                assert_eq!(message, "no such route");
            }
            other => panic!("expected Recognized, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_wraps_arbitrary_errors() {
        let cause: BoxError = Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));

        let err = Error::classify(cause);
        match &err {
            Error::Unexpected(_) => {}
            other => panic!("expected Unexpected, got {:?}", other),
        }

        let source = std::error::Error::source(&err).expect("cause retained");
        assert!(source.to_string().contains("disk on fire"));
    }
}
