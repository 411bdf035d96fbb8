//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Component {} does not exist ({available} components available)", .index + 1)]
    IndexOutOfRange { index: usize, available: usize },
    #[error("invalid component label '{0}'")]
    InvalidLabel(String),
}
