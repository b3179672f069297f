//! Error types for knowledge-manager.
//!
//! This module defines all error types used throughout the crate, grouped by
//! the subsystem that raises them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for knowledge-manager operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === HTTP Errors ===
    /// The HTTP transport failed (connection, timeout, body decoding).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {body}")]
    HttpStatus {
        /// Requested URL (API keys stripped).
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// A URL could not be parsed or resolved.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },

    // === Feed Errors ===
    /// A feed document could not be parsed.
    #[error("failed to parse feed from {origin}: {message}")]
    FeedParse {
        /// Feed URL or query that produced the document.
        origin: String,
        /// Parser message.
        message: String,
    },

    // === LLM Errors ===
    /// No API key was configured for the language model.
    #[error("no API key configured for {provider}; set llm.api_key or GOOGLE_API_KEY")]
    MissingApiKey {
        /// Provider name.
        provider: &'static str,
    },

    /// The language model answered with something unusable.
    #[error("unexpected language model response: {message}")]
    LlmResponse {
        /// What was wrong with the response.
        message: String,
    },

    // === Transcript Errors ===
    /// No video id could be extracted from a URL.
    #[error("invalid video URL, cannot find video id: {url}")]
    InvalidVideoUrl {
        /// The URL that was given.
        url: String,
    },

    /// The transcript for a video could not be retrieved.
    #[error("transcript unavailable for video {video_id}: {reason}")]
    TranscriptUnavailable {
        /// Video id.
        video_id: String,
        /// Why no transcript was returned.
        reason: String,
    },

    // === Batch Errors ===
    /// The batch CSV file does not exist.
    #[error("CSV file not found: {path}")]
    BatchFileNotFound {
        /// Path that was given.
        path: PathBuf,
    },

    /// The batch CSV file could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an artifact file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path that couldn't be written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for knowledge-manager operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an LLM response error.
    #[must_use]
    pub fn llm_response(message: impl Into<String>) -> Self {
        Self::LlmResponse {
            message: message.into(),
        }
    }

    /// Create an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a feed parse error.
    #[must_use]
    pub fn feed_parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FeedParse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create a transcript unavailable error.
    #[must_use]
    pub fn transcript_unavailable(video_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TranscriptUnavailable {
            video_id: video_id.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error is worth retrying (transport failures, throttling, 5xx).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if this error is a missing API key.
    #[must_use]
    pub fn is_missing_api_key(&self) -> bool {
        matches!(self, Self::MissingApiKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");

        let err = Error::MissingApiKey { provider: "gemini" };
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus {
            url: "https://example.com/feed".to_string(),
            status: 404,
            body: "not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/feed"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn test_is_retryable_status() {
        let throttled = Error::HttpStatus {
            url: String::new(),
            status: 429,
            body: String::new(),
        };
        let unavailable = Error::HttpStatus {
            url: String::new(),
            status: 503,
            body: String::new(),
        };
        let bad_request = Error::HttpStatus {
            url: String::new(),
            status: 400,
            body: String::new(),
        };
        assert!(throttled.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!Error::llm_response("empty").is_retryable());
    }

    #[test]
    fn test_is_missing_api_key() {
        assert!(Error::MissingApiKey { provider: "gemini" }.is_missing_api_key());
        assert!(!Error::internal("x").is_missing_api_key());
    }

    #[test]
    fn test_feed_parse_display() {
        let err = Error::feed_parse("https://example.com/rss", "unexpected eof");
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/rss"));
        assert!(msg.contains("unexpected eof"));
    }

    #[test]
    fn test_transcript_unavailable_display() {
        let err = Error::transcript_unavailable("dQw4w9WgXcQ", "empty response");
        let msg = err.to_string();
        assert!(msg.contains("dQw4w9WgXcQ"));
        assert!(msg.contains("empty response"));
    }

    #[test]
    fn test_invalid_video_url_display() {
        let err = Error::InvalidVideoUrl {
            url: "https://example.com".to_string(),
        };
        assert!(err.to_string().contains("https://example.com"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_batch_file_not_found_display() {
        let err = Error::BatchFileNotFound {
            path: PathBuf::from("/tmp/missing.csv"),
        };
        assert!(err.to_string().contains("/tmp/missing.csv"));
    }

    #[test]
    fn test_file_write_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::FileWrite {
            path: PathBuf::from("/root/forbidden/raw.md"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden/raw.md"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "rss_limit must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("rss_limit"));
    }
}
