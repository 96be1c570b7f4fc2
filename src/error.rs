use std::path::PathBuf;

/// Errors surfaced by profile building and personalization.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No cached aggregate exists and no source collection was given.
    #[error("no source collections available to build user profiles (and no cached profiles found)")]
    NoSourceCollections,
    /// None of the requested authors has a profile.
    #[error("usernames provided not found in tweet dataset: {requested:?}")]
    NoMatchingUsers { requested: Vec<String> },
    /// A source collection could not be read.
    #[error("failed to read source collection {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A source collection is not a valid tweet record file.
    #[error("malformed source collection {path}: {source}")]
    SourceMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A search response could not be read or parsed.
    #[error("invalid search response {path}: {reason}")]
    SearchResponse { path: PathBuf, reason: String },
    #[error("cache io error at {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache encode error: {0}")]
    CacheEncode(#[source] serde_cbor::Error),
    #[error("cache decode error: {0}")]
    CacheDecode(#[source] serde_cbor::Error),
    #[error("cache schema version {found} does not match expected {expected}")]
    CacheVersion { found: u32, expected: u32 },
    #[error("cache entry kind {found:?} does not match expected {expected:?}")]
    CacheKind { found: String, expected: String },
    /// The caller abandoned the request; nothing was emitted.
    #[error("personalization cancelled")]
    Cancelled,
    /// Configuration file missing, unreadable or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
