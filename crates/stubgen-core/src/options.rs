//! Generator options and the `key=value,...` parameter parser.
//!
//! The host hands the generator one opaque parameter string per invocation.
//! Parsing is fail-fast: the first unrecognized entry or malformed boolean
//! aborts with an error quoting the entry verbatim.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parsed generator settings, immutable once built.
///
/// One instance is scoped to one host invocation; both the per-file and the
/// batch path share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Namespace override wrapping generated service declarations.
    pub services_namespace: String,

    /// Emit `#include <...>` (system) instead of `#include "..."` (local).
    pub use_system_headers: bool,

    /// Path prefix for local grpc includes.
    pub grpc_search_path: String,

    /// Also emit the `<stem>_mock.grpc.pb.h` artifact.
    pub generate_mock_code: bool,

    /// Path prefix for the gmock include in mock artifacts.
    pub gmock_search_path: String,

    /// Extra header paths included verbatim in generated headers.
    pub additional_header_includes: Vec<String>,

    /// Override for the message header extension. Empty means the host
    /// default (`.pb.h`).
    pub message_header_extension: String,

    /// Emit an include line for every schema import.
    pub include_import_headers: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            services_namespace: String::new(),
            use_system_headers: true,
            grpc_search_path: String::new(),
            generate_mock_code: false,
            gmock_search_path: String::new(),
            additional_header_includes: Vec::new(),
            message_header_extension: String::new(),
            include_import_headers: false,
        }
    }
}

impl GeneratorOptions {
    /// Parse an opaque `key=value,key=value,...` parameter string.
    ///
    /// An empty string yields the defaults. A repeated key is last-write-wins.
    /// An entry without `=` is treated as a key with an empty value.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut opts = Self::default();
        if raw.is_empty() {
            return Ok(opts);
        }

        for entry in raw.split(',') {
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            match key {
                "services_namespace" => opts.services_namespace = value.to_string(),
                "use_system_headers" => {
                    opts.use_system_headers = parse_bool(entry, value)?;
                }
                "grpc_search_path" => opts.grpc_search_path = value.to_string(),
                "generate_mock_code" => {
                    opts.generate_mock_code = parse_bool(entry, value)?;
                }
                "gmock_search_path" => opts.gmock_search_path = value.to_string(),
                "additional_header_includes" => {
                    opts.additional_header_includes = value
                        .split(':')
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                }
                "message_header_extension" => {
                    opts.message_header_extension = value.to_string();
                }
                "include_import_headers" => {
                    opts.include_import_headers = parse_bool(entry, value)?;
                }
                _ => return Err(Error::UnknownParameter(entry.to_string())),
            }
        }
        Ok(opts)
    }

    /// Message header extension with the host default applied.
    #[must_use]
    pub fn message_header_ext(&self) -> &str {
        if self.message_header_extension.is_empty() {
            ".pb.h"
        } else {
            &self.message_header_extension
        }
    }
}

fn parse_bool(entry: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidParameterValue(entry.to_string())),
    }
}
