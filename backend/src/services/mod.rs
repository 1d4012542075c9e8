//! Service layer between the HTTP handlers and the stores.
//!
//! The gateways validate payloads, call the repositories and classify the
//! outcome as one [`GatewayError`] variant. They know nothing about HTTP.

pub mod dictionary;
pub mod time_series;
pub mod validation;

pub use dictionary::DictionaryGateway;
pub use time_series::{RangeParams, TimeSeriesGateway};
pub use validation::{BatchRejection, Rejection};

use crate::db::repository::RepositoryError;

/// Outcome classes of a gateway operation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A write batch held at least one invalid command.
    #[error("At least 1 invalid command.")]
    InvalidCommand(#[source] BatchRejection),

    /// A dictionary batch held at least one invalid entry.
    #[error("At least 1 invalid data dictionary.")]
    InvalidEntry(#[source] BatchRejection),

    /// The query parameters cannot be turned into a store query.
    #[error("{0}")]
    InvalidQuery(String),

    /// A filtered read matched nothing.
    #[error("{0}")]
    NotFound(String),

    /// The store failed or could not be reached.
    #[error("{message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: RepositoryError,
    },
}

impl GatewayError {
    pub(crate) fn store(message: impl Into<String>, source: RepositoryError) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source,
        }
    }

    /// The rejected record, for the two batch variants.
    pub fn rejection(&self) -> Option<&BatchRejection> {
        match self {
            Self::InvalidCommand(r) | Self::InvalidEntry(r) => Some(r),
            _ => None,
        }
    }
}
