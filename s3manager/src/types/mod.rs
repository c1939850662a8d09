mod configuration;
mod error;
mod signature;

pub use configuration::{Configuration, ConfigurationError, LogFormat};
pub use error::{ApiErrorResponse, AppError};
pub use signature::SignatureType;
