//! Per-file artifact assembly.
//!
//! Given one schema file and the parsed options, produce the complete set of
//! per-file artifacts by concatenating renderer fragments in the fixed
//! section order. Pure: no I/O, no mutation of inputs.

use stubgen_core::{Error, GeneratorOptions, Result, SchemaFile};

use crate::artifact::Artifact;
use crate::render::{ArtifactKind, SECTION_ORDER, section};

/// Assemble all artifacts for one schema file.
///
/// On success the artifacts are, in order: stub header, stub source, binding
/// header, binding source, and — only when `opts.generate_mock_code` — the
/// mock header. A file requesting generic services is rejected before any
/// artifact is produced.
pub fn assemble(file: &SchemaFile, opts: &GeneratorOptions) -> Result<Vec<Artifact>> {
    if file.generic_services {
        return Err(Error::UnsupportedServiceMode {
            file: file.name.clone(),
        });
    }

    let mut kinds = vec![
        ArtifactKind::StubHeader,
        ArtifactKind::StubSource,
        ArtifactKind::BindingHeader,
        ArtifactKind::BindingSource,
    ];
    if opts.generate_mock_code {
        kinds.push(ArtifactKind::MockHeader);
    }

    let artifacts: Vec<Artifact> = kinds
        .into_iter()
        .map(|kind| {
            let mut content = String::new();
            for role in SECTION_ORDER {
                content.push_str(&section(kind, role)(file, opts));
            }
            Artifact::new(kind.filename(file.stem()), content)
        })
        .collect();

    tracing::debug!(
        file = %file.name,
        artifacts = artifacts.len(),
        "assembled per-file artifacts"
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubgen_core::{Method, Service};

    fn greeter() -> SchemaFile {
        let mut file = SchemaFile::new("greeter.proto");
        file.package = "hello".into();
        let mut service = Service::new("Greeter");
        service
            .methods
            .push(Method::unary("SayHello", "HelloRequest", "HelloReply"));
        file.services.push(service);
        file
    }

    #[test]
    fn test_four_artifacts_without_mocks() {
        let artifacts = assemble(&greeter(), &GeneratorOptions::default()).unwrap();
        let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "greeter.stub.h",
                "greeter.stub.cc",
                "greeter.grpc.pb.h",
                "greeter.grpc.pb.cc",
            ]
        );
        assert!(artifacts.iter().all(|a| a.insertion_point.is_none()));
    }

    #[test]
    fn test_mock_option_adds_fifth_artifact() {
        let opts = GeneratorOptions::parse("generate_mock_code=true").unwrap();
        let artifacts = assemble(&greeter(), &opts).unwrap();
        assert_eq!(artifacts.len(), 5);
        assert_eq!(artifacts[4].name, "greeter_mock.grpc.pb.h");
        assert!(artifacts[4].content.contains("MOCK_METHOD"));
    }

    #[test]
    fn test_generic_services_rejected_without_artifacts() {
        let mut file = greeter();
        file.generic_services = true;
        let err = assemble(&file, &GeneratorOptions::default()).unwrap_err();
        match err {
            Error::UnsupportedServiceMode { file } => assert_eq!(file, "greeter.proto"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fragment_order_within_header() {
        let artifacts = assemble(&greeter(), &GeneratorOptions::default()).unwrap();
        let header = &artifacts[0].content;
        let guard_open = header.find("#ifndef").unwrap();
        let includes = header.find("#include").unwrap();
        let body = header.find("class GreeterStub").unwrap();
        let guard_close = header.find("#endif").unwrap();
        assert!(guard_open < includes);
        assert!(includes < body);
        assert!(body < guard_close);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let opts = GeneratorOptions::parse("generate_mock_code=true").unwrap();
        let first = assemble(&greeter(), &opts).unwrap();
        let second = assemble(&greeter(), &opts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filenames_unique_per_invocation() {
        let opts = GeneratorOptions::parse("generate_mock_code=true").unwrap();
        let artifacts = assemble(&greeter(), &opts).unwrap();
        let mut names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), artifacts.len());
    }
}
