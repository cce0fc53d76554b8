//! `protoc-gen-cppstub`: the host adapter binary.
//!
//! Two modes:
//!
//! - **Plugin mode** (default): read a `CodeGeneratorRequest` from stdin,
//!   write a `CodeGeneratorResponse` to stdout. Generation errors become the
//!   response's `error` field rather than a non-zero exit. Logs go to
//!   stderr; stdout is the wire channel.
//! - **Standalone mode** (`--descriptor-set`): read a serialized
//!   `FileDescriptorSet` from a file and write artifacts under `--out-dir`.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use prost::Message;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse, code_generator_response};
use prost_types::{FileDescriptorProto, FileDescriptorSet};

use stubgen_core::{GeneratorOptions, Method, SchemaFile, Service, Streaming};
use stubgen_emit::{Artifact, DirSink, aggregate, assemble, dispatch_all, summary};

/// CODE_GENERATOR_RESPONSE_FEATURE_PROTO3_OPTIONAL.
const FEATURE_PROTO3_OPTIONAL: u64 = 1;

#[derive(Parser)]
#[command(
    name = "protoc-gen-cppstub",
    about = "gRPC C++ stub generator (protoc plugin)"
)]
struct Cli {
    /// Serialized FileDescriptorSet to generate from. Without this flag the
    /// binary acts as a protoc plugin on stdin/stdout.
    #[arg(long)]
    descriptor_set: Option<PathBuf>,

    /// Generator parameters (`key=value,key=value,...`)
    #[arg(long, default_value = "")]
    param: String,

    /// Output directory (standalone mode only)
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Also emit the batch artifacts services.h, services.cc, packages.xml
    /// (standalone mode only)
    #[arg(long)]
    batch: bool,

    /// Emit the __report__.log diagnostic summary (standalone mode only)
    #[arg(long)]
    report: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.descriptor_set {
        Some(path) => run_standalone(path, &cli),
        None => run_plugin(),
    }
}

fn run_plugin() -> Result<()> {
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .context("failed to read request from stdin")?;
    let request = CodeGeneratorRequest::decode(buf.as_slice())
        .context("failed to decode CodeGeneratorRequest; is this running under protoc?")?;

    // Generation errors go back through the protocol, not the exit code.
    let response = match generate(&request) {
        Ok(files) => CodeGeneratorResponse {
            file: files,
            supported_features: Some(FEATURE_PROTO3_OPTIONAL),
            ..Default::default()
        },
        Err(err) => CodeGeneratorResponse {
            error: Some(format!("{err:#}")),
            supported_features: Some(FEATURE_PROTO3_OPTIONAL),
            ..Default::default()
        },
    };

    let mut out = Vec::new();
    response
        .encode(&mut out)
        .context("failed to encode CodeGeneratorResponse")?;
    std::io::stdout()
        .write_all(&out)
        .context("failed to write response to stdout")?;
    Ok(())
}

/// Produce every response file for one plugin invocation: batch artifacts
/// for the whole unit, then per-file artifacts for each requested file.
fn generate(request: &CodeGeneratorRequest) -> Result<Vec<code_generator_response::File>> {
    let opts = GeneratorOptions::parse(request.parameter())?;

    let by_name: HashMap<&str, &FileDescriptorProto> = request
        .proto_file
        .iter()
        .map(|fd| (fd.name(), fd))
        .collect();
    let mut schemas = Vec::with_capacity(request.file_to_generate.len());
    for name in &request.file_to_generate {
        let fd = by_name
            .get(name.as_str())
            .with_context(|| format!("descriptor for {name} missing from request"))?;
        schemas.push(schema_from_descriptor(fd));
    }
    if schemas.is_empty() {
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    if cfg!(debug_assertions) {
        artifacts.push(summary(&schemas));
    }
    artifacts.extend(aggregate(&schemas, &opts));
    for schema in &schemas {
        artifacts.extend(assemble(schema, &opts)?);
    }

    tracing::debug!(
        files = schemas.len(),
        artifacts = artifacts.len(),
        "generation complete"
    );
    Ok(artifacts.into_iter().map(response_file).collect())
}

fn run_standalone(descriptor_set: &Path, cli: &Cli) -> Result<()> {
    let bytes = fs::read(descriptor_set)
        .with_context(|| format!("failed to read {}", descriptor_set.display()))?;
    let set = FileDescriptorSet::decode(bytes.as_slice())
        .context("failed to decode FileDescriptorSet")?;
    let opts = GeneratorOptions::parse(&cli.param)?;

    let schemas: Vec<SchemaFile> = set.file.iter().map(schema_from_descriptor).collect();
    if schemas.is_empty() {
        bail!("descriptor set contains no files");
    }

    let mut artifacts = Vec::new();
    if cli.batch {
        artifacts.extend(aggregate(&schemas, &opts));
    }
    for schema in &schemas {
        artifacts.extend(assemble(schema, &opts)?);
    }
    if cli.report {
        artifacts.push(summary(&schemas));
    }

    let mut sink = DirSink::new(&cli.out_dir);
    let failures = dispatch_all(&mut sink, &artifacts);
    if !failures.is_empty() {
        bail!("{} artifact write(s) failed", failures.len());
    }
    tracing::info!(
        artifacts = artifacts.len(),
        out_dir = %cli.out_dir.display(),
        "wrote generated artifacts"
    );
    Ok(())
}

/// Build the read-only schema view from one file descriptor.
fn schema_from_descriptor(fd: &FileDescriptorProto) -> SchemaFile {
    let mut file = SchemaFile::new(fd.name());
    file.package = fd.package().to_string();
    file.imports = fd.dependency.clone();
    file.generic_services = fd.options.as_ref().is_some_and(|o| o.cc_generic_services());
    for svc in &fd.service {
        let mut service = Service::new(svc.name());
        for method in &svc.method {
            service.methods.push(Method {
                name: method.name().to_string(),
                input_type: cpp_type_name(method.input_type()),
                output_type: cpp_type_name(method.output_type()),
                streaming: Streaming::from_flags(
                    method.client_streaming(),
                    method.server_streaming(),
                ),
            });
        }
        file.services.push(service);
    }
    file
}

/// Map a fully qualified descriptor type name (`.pkg.Message`) to its C++
/// spelling (`pkg::Message`).
fn cpp_type_name(proto_name: &str) -> String {
    proto_name.trim_start_matches('.').replace('.', "::")
}

fn response_file(artifact: Artifact) -> code_generator_response::File {
    code_generator_response::File {
        name: Some(artifact.name),
        insertion_point: artifact.insertion_point,
        content: Some(artifact.content),
        ..Default::default()
    }
}
