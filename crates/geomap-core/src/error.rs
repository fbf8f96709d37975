use std::sync::Arc;

use thiserror::Error;

use crate::api::ApiError;
use crate::validation::ValidationErrors;

/// Every failure the query layer can hand back to a caller.
///
/// Network and decoding problems live inside `ApiError` next to HTTP status
/// failures, as separate variants. The API error is shared because one
/// failed request may be reported to several waiting readers.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Api(Arc<ApiError>),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Error::Api(Arc::new(e))
    }
}

impl Error {
    /// The API error, if this is one.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e.as_ref()),
            Error::Validation(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.api().is_some_and(ApiError::is_not_found)
    }
}
