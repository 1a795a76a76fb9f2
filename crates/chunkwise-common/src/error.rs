//! Shared error conversions
//!
//! Crate error enums implement [`CommonError`] and then get their
//! `From` impls for I/O and `anyhow` failures from
//! [`impl_common_conversions!`].

/// Constructors for the catch-all variants every crate error carries
pub trait CommonError: std::error::Error + Send + Sync + 'static {
    fn io_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;

    /// Anything without a dedicated variant
    fn other_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;
}

/// Implement `From<std::io::Error>` and `From<anyhow::Error>` for a
/// [`CommonError`] type
///
/// # Example
/// ```no_run
/// # use chunkwise_common::{CommonError, impl_common_conversions};
/// # use thiserror::Error;
/// #
/// # #[derive(Debug, Error)]
/// # enum JobError {
/// #     #[error("IO error: {0}")]
/// #     Io(String),
/// #     #[error("{0}")]
/// #     Other(String),
/// # }
/// #
/// # impl CommonError for JobError {
/// #     fn io_error(msg: impl Into<String>) -> Self { Self::Io(msg.into()) }
/// #     fn other_error(msg: impl Into<String>) -> Self { Self::Other(msg.into()) }
/// # }
/// impl_common_conversions!(JobError);
/// ```
#[macro_export]
macro_rules! impl_common_conversions {
    ($error_type:ident) => {
        impl From<std::io::Error> for $error_type {
            fn from(e: std::io::Error) -> Self {
                <$error_type as $crate::CommonError>::io_error(e.to_string())
            }
        }

        impl From<anyhow::Error> for $error_type {
            fn from(e: anyhow::Error) -> Self {
                <$error_type as $crate::CommonError>::other_error(e.to_string())
            }
        }
    };
}
