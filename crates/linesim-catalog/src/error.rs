//! Catalog error types.
//!
//! Every variant's `Display` is written to be shown to the operator as-is.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while fetching or decoding the scenario catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid catalog URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("catalog request failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("catalog endpoint returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The response body exceeds the accepted size.
    #[error("catalog response is larger than {limit} bytes")]
    TooLarge {
        /// Maximum accepted body size in bytes.
        limit: usize,
    },

    /// The catalog file could not be read.
    #[error("failed to read catalog file {}: {source}", path.display())]
    Io {
        /// Path of the catalog file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The body is not valid JSON.
    #[error("could not parse catalog response: {message}")]
    Parse {
        /// Parser message.
        message: String,
        /// Leading part of the body, for diagnostics.
        snippet: String,
    },

    /// The payload is an object carrying an `error` message from the server.
    #[error("catalog endpoint reported an error: {0}")]
    Server(String),

    /// The payload is valid JSON but not an array of scenarios.
    #[error("catalog data has the wrong shape: expected an array, got {found}")]
    Shape {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

/// Convenience alias for results using [`CatalogError`].
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_status() {
        let err = CatalogError::Status { status: 502 };
        assert_eq!(err.to_string(), "catalog endpoint returned HTTP 502");
    }

    #[test]
    fn error_display_server() {
        let err = CatalogError::Server("Sheet not found".to_string());
        assert_eq!(
            err.to_string(),
            "catalog endpoint reported an error: Sheet not found"
        );
    }

    #[test]
    fn error_display_shape() {
        let err = CatalogError::Shape { found: "object" };
        assert_eq!(
            err.to_string(),
            "catalog data has the wrong shape: expected an array, got object"
        );
    }

    #[test]
    fn error_display_io() {
        let err = CatalogError::Io {
            path: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            err.to_string(),
            "failed to read catalog file /tmp/missing.json: not found"
        );
    }

    #[test]
    fn error_display_too_large() {
        let err = CatalogError::TooLarge { limit: 1024 };
        assert_eq!(err.to_string(), "catalog response is larger than 1024 bytes");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CatalogError>();
    }
}
