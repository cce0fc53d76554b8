//! Batch aggregation across a whole compilation unit.
//!
//! Builds the three batch-scoped artifacts (`services.h`, `services.cc`,
//! `packages.xml`) from every schema file in the unit, plus an optional
//! diagnostic summary. Batch framing (prologue/epilogue) comes from the
//! first file only; per-file sections iterate all files in input order,
//! declarations pass before bodies pass.

use serde::Serialize;

use stubgen_core::{GeneratorOptions, SchemaFile};

use crate::artifact::Artifact;
use crate::render::{BATCH_KINDS, BatchRole, batch_section};

/// Fixed filename of the diagnostic summary artifact.
pub const REPORT_FILENAME: &str = "__report__.log";

/// Aggregate the batch artifacts for a compilation unit.
///
/// `files` is the full ordered list of schema files in the unit and must be
/// non-empty. Unlike the per-file path, aggregation does not reject files
/// with the generic-services flag; their fragments are included as-is.
pub fn aggregate(files: &[SchemaFile], opts: &GeneratorOptions) -> Vec<Artifact> {
    let Some(first) = files.first() else {
        return Vec::new();
    };

    let artifacts: Vec<Artifact> = BATCH_KINDS
        .into_iter()
        .map(|kind| {
            let mut content = String::new();
            content.push_str(&batch_section(kind, BatchRole::Prologue)(first, opts));
            for file in files {
                content.push_str(&batch_section(kind, BatchRole::Declarations)(file, opts));
            }
            for file in files {
                content.push_str(&batch_section(kind, BatchRole::Body)(file, opts));
            }
            content.push_str(&batch_section(kind, BatchRole::Epilogue)(first, opts));
            Artifact::new(kind.filename(), content)
        })
        .collect();

    tracing::debug!(files = files.len(), "aggregated batch artifacts");
    artifacts
}

/// Counts collected for the diagnostic summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Number of schema files in the unit.
    pub files: usize,
    /// Number of files declaring at least one service.
    pub files_with_services: usize,
    /// Total services across all files.
    pub services: usize,
    /// Total methods across all services.
    pub methods: usize,
    /// File names in input order.
    pub file_names: Vec<String>,
}

impl BatchSummary {
    /// Collect counts over a compilation unit.
    #[must_use]
    pub fn collect(files: &[SchemaFile]) -> Self {
        Self {
            files: files.len(),
            files_with_services: files.iter().filter(|f| f.has_services()).count(),
            services: files.iter().map(|f| f.services.len()).sum(),
            methods: files.iter().map(SchemaFile::method_count).sum(),
            file_names: files.iter().map(|f| f.name.clone()).collect(),
        }
    }

    /// Render the summary text, one fact per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = format!("Proto-files found: {}\n", self.files);
        text += &format!(
            "Proto-files with services found: {}\n",
            self.files_with_services
        );
        text += &format!("Services found: {}\n", self.services);
        text += &format!("Methods found: {}\n", self.methods);
        for name in &self.file_names {
            text += name;
            text.push('\n');
        }
        text
    }
}

/// Build the `__report__.log` diagnostic artifact for a compilation unit.
#[must_use]
pub fn summary(files: &[SchemaFile]) -> Artifact {
    Artifact::new(REPORT_FILENAME, BatchSummary::collect(files).render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubgen_core::{Method, Service};

    fn unit() -> Vec<SchemaFile> {
        // 3 files, 2 with services, 4 services, 5 methods total.
        let mut alpha = SchemaFile::new("alpha.proto");
        alpha.package = "a".into();
        let mut first = Service::new("First");
        first.methods.push(Method::unary("One", "Req", "Res"));
        first.methods.push(Method::unary("Two", "Req", "Res"));
        let mut second = Service::new("Second");
        second.methods.push(Method::unary("Three", "Req", "Res"));
        alpha.services.push(first);
        alpha.services.push(second);

        let mut beta = SchemaFile::new("beta.proto");
        beta.package = "b".into();
        let mut third = Service::new("Third");
        third.methods.push(Method::unary("Four", "Req", "Res"));
        let mut fourth = Service::new("Fourth");
        fourth.methods.push(Method::unary("Five", "Req", "Res"));
        beta.services.push(third);
        beta.services.push(fourth);

        let gamma = SchemaFile::new("gamma.proto");

        vec![alpha, beta, gamma]
    }

    #[test]
    fn test_batch_artifact_names_fixed() {
        let artifacts = aggregate(&unit(), &GeneratorOptions::default());
        let names: Vec<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["services.h", "services.cc", "packages.xml"]);
    }

    #[test]
    fn test_declarations_precede_all_bodies() {
        let artifacts = aggregate(&unit(), &GeneratorOptions::default());
        let header = &artifacts[0].content;

        // Forward declarations of every file come before any class body,
        // including the last file's declaration vs the first file's body.
        let last_decl = header.find("class FourthClient;").unwrap();
        let first_body = header.find("class FirstClient {").unwrap();
        assert!(last_decl < first_body);

        let source = &artifacts[1].content;
        let last_include = source.rfind("#include \"beta.grpc.pb.h\"").unwrap();
        let first_def = source.find("FirstClient::One").unwrap();
        assert!(last_include < first_def);
    }

    #[test]
    fn test_batch_framing_uses_first_file() {
        let artifacts = aggregate(&unit(), &GeneratorOptions::default());
        assert!(
            artifacts[0]
                .content
                .contains("compilation unit of: alpha.proto")
        );
        assert!(!artifacts[0].content.contains("compilation unit of: beta"));
    }

    #[test]
    fn test_generic_services_not_rechecked_in_batch() {
        // Documented asymmetry with the per-file path: batch aggregation
        // includes flagged files rather than rejecting them.
        let mut files = unit();
        files[0].generic_services = true;
        let artifacts = aggregate(&files, &GeneratorOptions::default());
        assert_eq!(artifacts.len(), 3);
        assert!(artifacts[0].content.contains("class FirstClient"));
    }

    #[test]
    fn test_summary_counts_and_order() {
        let report = summary(&unit());
        assert_eq!(report.name, REPORT_FILENAME);
        assert_eq!(
            report.content,
            "Proto-files found: 3\n\
             Proto-files with services found: 2\n\
             Services found: 4\n\
             Methods found: 5\n\
             alpha.proto\n\
             beta.proto\n\
             gamma.proto\n"
        );
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let files = unit();
        let opts = GeneratorOptions::parse("services_namespace=batch").unwrap();
        assert_eq!(aggregate(&files, &opts), aggregate(&files, &opts));
    }

    #[test]
    fn test_manifest_lists_packages_then_services() {
        let artifacts = aggregate(&unit(), &GeneratorOptions::default());
        let manifest = &artifacts[2].content;
        assert!(manifest.starts_with("<?xml version=\"1.0\""));
        let package_entry = manifest.find("<package name=\"b\"").unwrap();
        let services_entry = manifest.find("<services file=\"alpha.proto\"").unwrap();
        assert!(package_entry < services_entry);
        assert!(manifest.ends_with("</packages>\n"));
    }

    #[test]
    fn test_summary_serializes() {
        let summary = BatchSummary::collect(&unit());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["files"], 3);
        assert_eq!(json["methods"], 5);
    }
}
