//! Store-layer errors.
//!
//! Every store backend reports failures through [`RepositoryError`], with an
//! [`ErrorContext`] describing where the failure happened.

use std::fmt;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Where a store failure happened.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "write_point", "find_equipment")
    pub operation: Option<String>,
    /// The store or collection involved (e.g., "influx", "datas")
    pub entity: Option<String>,
    /// Store-supplied detail, such as the HTTP status
    pub details: Option<String>,
    /// Set for transport failures
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labelled = [
            ("operation", self.operation.as_deref()),
            ("entity", self.entity.as_deref()),
            ("details", self.details.as_deref()),
            ("retryable", self.retryable.then_some("true")),
        ];
        let parts: Vec<String> = labelled
            .iter()
            .filter_map(|(label, value)| value.map(|v| format!("{}={}", label, v)))
            .collect();

        if parts.is_empty() {
            Ok(())
        } else {
            write!(f, "[{}]", parts.join(", "))
        }
    }
}

/// Failure reported by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Store unreachable or connection dropped.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    /// The store rejected or failed a query or write.
    #[error("Query error: {message} {context}")]
    QueryError {
        message: String,
        context: ErrorContext,
    },

    /// The store answered with data this crate cannot interpret.
    #[error("Decode error: {message} {context}")]
    DecodeError {
        message: String,
        context: ErrorContext,
    },

    /// Bad settings, or a backend that was not compiled in.
    #[error("Configuration error: {message} {context}")]
    ConfigurationError {
        message: String,
        context: ErrorContext,
    },

    /// Timeout waiting for the store.
    #[error("Timeout error: {message} {context}")]
    TimeoutError {
        message: String,
        context: ErrorContext,
    },
}

impl RepositoryError {
    /// Transport failures start out retryable.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn query_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::QueryError {
            message: message.into(),
            context,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::TimeoutError {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            Self::ConnectionError { message, context }
            | Self::QueryError { message, context }
            | Self::DecodeError { message, context }
            | Self::ConfigurationError { message, context }
            | Self::TimeoutError { message, context } => (message, context),
        }
    }

    /// The bare message, without context decoration.
    pub fn message(&self) -> &str {
        self.parts().0
    }

    pub fn context(&self) -> &ErrorContext {
        self.parts().1
    }

    /// Connection drops and timeouts are worth retrying; everything else is not.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::ConnectionError { context, .. }
            | Self::QueryError { context, .. }
            | Self::DecodeError { context, .. }
            | Self::ConfigurationError { context, .. }
            | Self::TimeoutError { context, .. } => context,
        }
    }

    /// Record the store operation that failed.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Record the store or collection involved.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context_mut().entity = Some(entity.into());
        self
    }
}

#[cfg(feature = "influx-repo")]
impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            RepositoryError::timeout(message)
        } else if err.is_connect() || err.is_request() {
            RepositoryError::connection(message)
        } else if err.is_decode() || err.is_body() {
            RepositoryError::decode(message)
        } else if err.is_builder() {
            RepositoryError::configuration(message)
        } else {
            RepositoryError::query(message)
        }
    }
}

#[cfg(feature = "mongo-repo")]
impl From<mongodb::error::Error> for RepositoryError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        let message = err.to_string();
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::ConnectionPoolCleared { .. } => {
                RepositoryError::connection(message)
            }
            ErrorKind::InvalidArgument { .. } | ErrorKind::Authentication { .. } => {
                RepositoryError::configuration(message)
            }
            ErrorKind::BsonDeserialization(_) => RepositoryError::decode(message),
            _ => RepositoryError::query(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("write_point")
            .with_entity("influx")
            .with_details("status=503")
            .retryable();
        assert_eq!(
            ctx.to_string(),
            "[operation=write_point, entity=influx, details=status=503, retryable=true]"
        );
        assert_eq!(ErrorContext::default().to_string(), "");
    }

    #[test]
    fn test_connection_errors_are_retryable() {
        assert!(RepositoryError::connection("refused").is_retryable());
        assert!(RepositoryError::timeout("slow").is_retryable());
        assert!(!RepositoryError::query("bad flux").is_retryable());
    }

    #[test]
    fn test_with_operation_keeps_message() {
        let err = RepositoryError::query("E11000 duplicate key")
            .with_operation("insert_data_items")
            .with_entity("datas");

        assert_eq!(err.message(), "E11000 duplicate key");
        assert_eq!(err.context().operation.as_deref(), Some("insert_data_items"));
        assert!(err.to_string().contains("entity=datas"));
    }
}
