//! Feed loading error types.

use std::path::PathBuf;

/// Errors that can occur while fetching or loading the static feed.
///
/// None of these clear the previously published catalog.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Feed server returned an error status
    #[error("feed server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Reading a local feed file failed
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive is not a readable zip
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A table could not be parsed at all
    #[error("failed to parse {table}: {message}")]
    Parse { table: String, message: String },

    /// A required table is absent from the archive
    #[error("required table missing from feed: {0}")]
    MissingTable(&'static str),

    /// The background build task panicked or was cancelled
    #[error("feed build task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FeedError::MissingTable("shapes");
        assert_eq!(err.to_string(), "required table missing from feed: shapes");

        let err = FeedError::Api {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "feed server returned 503: Service Unavailable");

        let err = FeedError::Parse {
            table: "trips".into(),
            message: "missing header row".into(),
        };
        assert_eq!(err.to_string(), "failed to parse trips: missing header row");

        let err = FeedError::Io {
            path: PathBuf::from("/tmp/feed.zip"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "failed to read /tmp/feed.zip: gone");
    }
}
