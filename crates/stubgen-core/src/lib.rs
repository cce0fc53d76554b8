//! Core types for grpc-stubgen: the schema model consumed by the generator,
//! the parsed generator options, and the shared error type.
//!
//! This crate is deliberately free of I/O. The schema model is a read-only
//! view built by the host adapter (see `stubgen-cli`), and everything here is
//! a pure value type.

pub mod error;
pub mod options;
pub mod schema;

pub use error::{Error, Result};
pub use options::GeneratorOptions;
pub use schema::{Method, SchemaFile, Service, Streaming, strip_schema_extension};
