//! Unit-of-work representation.

/// Failure cause raised by an invocation or a plugin callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One unit of application work executed under the lifecycle contract.
///
/// An invocation is consumed by its single run; it has no identity beyond
/// the state it closes over. Any closure `FnOnce() -> Result<(), BoxError>`
/// is an invocation.
pub trait Invocation: Send {
    fn execute(self: Box<Self>) -> std::result::Result<(), BoxError>;
}

impl<F> Invocation for F
where
    F: FnOnce() -> std::result::Result<(), BoxError> + Send,
{
    fn execute(self: Box<Self>) -> std::result::Result<(), BoxError> {
        (*self)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_invocation() {
        let task = || -> Result<(), BoxError> { Ok(()) };
        assert!(Box::new(task).execute().is_ok());
    }

    #[test]
    fn test_failing_invocation() {
        let task = || -> Result<(), BoxError> { Err("boom".into()) };
        let err = Box::new(task).execute().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
