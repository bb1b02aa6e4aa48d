//! Attach an action and subject to foreign errors on their way into
//! [`ApplicationError::OperationFailed`].

use std::fmt::Display;

use crate::application::{ApplicationError, ApplicationResult};

pub trait OperationContext<T> {
    /// Wrap the error as `"{action}: {subject}"`.
    ///
    /// ```ignore
    /// fs.write(&target, &json).during("write export", target.display())?;
    /// ```
    fn during(self, action: &str, subject: impl Display) -> ApplicationResult<T>;
}

impl<T, E> OperationContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn during(self, action: &str, subject: impl Display) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{action}: {subject}"),
            source: Box::new(e),
        })
    }
}
