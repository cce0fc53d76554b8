//! End-to-end pipeline tests: parameters -> assembly/aggregation -> dispatch.

use stubgen_core::{GeneratorOptions, Method, SchemaFile, Service, Streaming};
use stubgen_emit::{MemorySink, REPORT_FILENAME, aggregate, assemble, dispatch_all, summary};

fn service(name: &str, methods: &[(&str, Streaming)]) -> Service {
    let mut svc = Service::new(name);
    for (method, streaming) in methods {
        svc.methods.push(Method {
            name: (*method).to_string(),
            input_type: format!("{method}Request"),
            output_type: format!("{method}Reply"),
            streaming: *streaming,
        });
    }
    svc
}

fn unit() -> Vec<SchemaFile> {
    let mut greeter = SchemaFile::new("greeter.proto");
    greeter.package = "hello".into();
    greeter.services.push(service(
        "Greeter",
        &[
            ("SayHello", Streaming::Unary),
            ("Chat", Streaming::Bidi),
        ],
    ));

    let mut health = SchemaFile::new("health.proto");
    health.package = "hello".into();
    health
        .services
        .push(service("Health", &[("Watch", Streaming::ServerStreaming)]));

    let types_only = SchemaFile::new("types.proto");

    vec![greeter, health, types_only]
}

#[test]
fn test_full_unit_generation_through_sink() {
    let files = unit();
    let opts = GeneratorOptions::parse("services_namespace=hello_rpc,generate_mock_code=true")
        .unwrap();

    let mut artifacts = aggregate(&files, &opts);
    for file in &files {
        artifacts.extend(assemble(file, &opts).unwrap());
    }
    artifacts.push(summary(&files));

    let mut sink = MemorySink::new();
    let failures = dispatch_all(&mut sink, &artifacts);
    assert!(failures.is_empty());

    // 3 batch + 3 files x 5 per-file + 1 report.
    assert_eq!(sink.files().len(), 19);
    assert!(sink.file("services.h").is_some());
    assert!(sink.file("greeter_mock.grpc.pb.h").is_some());
    assert!(sink.file("health.grpc.pb.cc").is_some());

    let report = String::from_utf8(sink.file(REPORT_FILENAME).unwrap().to_vec()).unwrap();
    assert!(report.starts_with("Proto-files found: 3\n"));
    assert!(report.contains("Services found: 2\n"));
    assert!(report.contains("Methods found: 3\n"));
}

#[test]
fn test_per_file_failure_leaves_batch_untouched() {
    let mut files = unit();
    files[1].generic_services = true;
    let opts = GeneratorOptions::default();

    // Batch aggregation does not enforce the generic-services restriction.
    let batch = aggregate(&files, &opts);
    assert_eq!(batch.len(), 3);

    // The per-file path rejects the flagged file and only that file.
    assert!(assemble(&files[0], &opts).is_ok());
    assert!(assemble(&files[1], &opts).is_err());
    assert!(assemble(&files[2], &opts).is_ok());
}

#[test]
fn test_whole_pipeline_is_idempotent() {
    let files = unit();
    let opts = GeneratorOptions::parse("use_system_headers=false,grpc_search_path=vendor/grpc")
        .unwrap();

    let run = || {
        let mut artifacts = aggregate(&files, &opts);
        for file in &files {
            artifacts.extend(assemble(file, &opts).unwrap());
        }
        artifacts
    };
    assert_eq!(run(), run());
}
