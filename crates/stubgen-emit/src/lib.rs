//! # stubgen-emit
//!
//! Artifact composition for grpc-stubgen. This crate turns schema files and
//! parsed options into named text artifacts:
//!
//! - **Per-file assembly**: stub header/source, binding header/source, and an
//!   optional mock header for one schema file ([`assemble::assemble`])
//! - **Batch aggregation**: `services.h`, `services.cc`, and `packages.xml`
//!   spanning a whole compilation unit ([`aggregate::aggregate`]), plus an
//!   optional diagnostic summary
//! - **Output dispatch**: the only side-effecting seam, writing artifacts
//!   through a host-provided sink ([`dispatch`])
//!
//! Assembly and aggregation are pure functions of their inputs; running them
//! twice yields byte-identical output.

pub mod aggregate;
pub mod artifact;
pub mod assemble;
pub mod dispatch;
pub mod render;

pub use aggregate::{BatchSummary, REPORT_FILENAME, aggregate, summary};
pub use artifact::Artifact;
pub use assemble::assemble;
pub use dispatch::{DirSink, MemorySink, OutputSink, dispatch, dispatch_all};
pub use render::{ArtifactKind, BatchKind, BatchRole, RenderFn, SectionRole};
