//! Read-only view over one parsed schema file.
//!
//! The host adapter builds these from whatever descriptor format it speaks
//! (protobuf `FileDescriptorProto` in the CLI). The generator never mutates
//! them; any number of passes may borrow the same file.

use serde::{Deserialize, Serialize};

/// Strip a trailing `.proto` or `.protodevel` extension from a schema file
/// name. Any other name is returned unchanged.
#[must_use]
pub fn strip_schema_extension(name: &str) -> &str {
    name.strip_suffix(".proto")
        .or_else(|| name.strip_suffix(".protodevel"))
        .unwrap_or(name)
}

/// One schema file in a compilation unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Logical file name as the host knows it (e.g. `"greeter.proto"`).
    pub name: String,

    /// Declared package, empty if none.
    #[serde(default)]
    pub package: String,

    /// Names of imported schema files, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    /// Services declared in this file, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,

    /// File-level flag requesting generic service codegen.
    /// The per-file path rejects files carrying it.
    #[serde(default)]
    pub generic_services: bool,
}

impl SchemaFile {
    /// Create an empty schema file with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Logical name with the trailing schema extension stripped.
    ///
    /// Handles both `.proto` and the legacy `.protodevel`; any other name is
    /// returned unchanged.
    #[must_use]
    pub fn stem(&self) -> &str {
        strip_schema_extension(&self.name)
    }

    /// Total number of methods across all services in this file.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.services.iter().map(|s| s.methods.len()).sum()
    }

    /// Whether the file declares at least one service.
    #[must_use]
    pub fn has_services(&self) -> bool {
        !self.services.is_empty()
    }
}

/// A named RPC endpoint grouping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    /// Service name.
    pub name: String,

    /// Methods in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<Method>,
}

impl Service {
    /// Create a service with no methods.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }
}

/// One callable operation on a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    /// Method name.
    pub name: String,

    /// Fully qualified request message type.
    pub input_type: String,

    /// Fully qualified response message type.
    pub output_type: String,

    /// Streaming mode of the method.
    #[serde(default)]
    pub streaming: Streaming,
}

impl Method {
    /// Create a unary method.
    #[must_use]
    pub fn unary(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            streaming: Streaming::Unary,
        }
    }
}

/// Streaming mode metadata for a method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Streaming {
    /// Single request, single response.
    #[default]
    Unary,
    /// Streamed requests, single response.
    ClientStreaming,
    /// Single request, streamed responses.
    ServerStreaming,
    /// Streamed both ways.
    Bidi,
}

impl Streaming {
    /// Derive the mode from the two descriptor-level flags.
    #[must_use]
    pub const fn from_flags(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => Self::Unary,
            (true, false) => Self::ClientStreaming,
            (false, true) => Self::ServerStreaming,
            (true, true) => Self::Bidi,
        }
    }
}
