use std::path::PathBuf;

/// Error type for cache reading, metadata decoding and stability evaluation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid version string.
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// Invalid keyword string.
    #[error("invalid keyword: {0}")]
    InvalidKeyword(String),

    /// Invalid IUSE flag entry.
    #[error("invalid IUSE entry: {0}")]
    InvalidIUse(String),

    /// The cache file could not be opened or mapped.
    #[error("can't read cache file {path}: {source}")]
    CacheOpen {
        /// Path of the cache file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cache file is too short or its header points outside the file.
    #[error("corrupt cache header in {path}: {reason}")]
    CacheHeader {
        /// Path of the cache file.
        path: PathBuf,
        /// What was wrong with the header.
        reason: String,
    },

    /// A record's length fields run past the record region.
    #[error("corrupt cache record in {path} at offset {offset}")]
    CacheRecord {
        /// Path of the cache file.
        path: PathBuf,
        /// Byte offset of the record header.
        offset: usize,
    },

    /// The metadata blob of a record could not be decoded.
    #[error("can't decode metadata: {0}")]
    Decode(String),

    /// A cache key could not be split into package name and version.
    #[error("can't split '{0}' into package and version")]
    InvalidAtom(String),

    /// No version at the given position in the package.
    #[error("package {package} has no version #{index}")]
    NoSuchVersion {
        /// Package name.
        package: String,
        /// Requested position.
        index: usize,
    },

    /// The saved-flag slot chosen for a version disagrees with what the
    /// policy recorded. This is an internal error and must not be ignored.
    #[error("internal error: stability calculated for {package}-{version} does not match the saved slot")]
    StabilityIndexMismatch {
        /// Package name.
        package: String,
        /// Version string.
        version: String,
    },
}

/// Result type for eix-cache operations.
pub type Result<T> = std::result::Result<T, Error>;
