//! Shared error type for parsing, assembly, and output dispatch.

/// Errors surfaced to the host across the whole generation pipeline.
///
/// Parameter errors carry the offending `key=value` entry verbatim so the
/// host can echo it back to the user unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter key outside the recognized set.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// A recognized key with a value it does not accept.
    #[error("invalid parameter: {0}")]
    InvalidParameterValue(String),

    /// The schema file requests generic services, which this generator
    /// cannot target.
    #[error(
        "{file}: generic services are not supported; \
         set \"cc_generic_services = false\" in the schema"
    )]
    UnsupportedServiceMode {
        /// Name of the schema file carrying the flag.
        file: String,
    },

    /// The output sink rejected a write for one artifact.
    #[error("failed to write output \"{filename}\": {source}")]
    OutputWriteFailed {
        /// Target filename of the artifact that failed.
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;
