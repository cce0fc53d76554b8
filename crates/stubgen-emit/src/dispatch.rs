//! Output dispatch — the only side-effecting seam in the pipeline.
//!
//! The host supplies an [`OutputSink`]; the dispatcher hands it each
//! artifact's bytes exactly once. Sink implementations own the open/write/
//! release lifecycle for whatever resource backs a filename, and must
//! release it on every exit path.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use stubgen_core::{Error, Result};

use crate::artifact::Artifact;

/// Host-provided destination for generated artifacts.
pub trait OutputSink {
    /// Create the named output and write `content` as raw bytes.
    fn write(&mut self, filename: &str, content: &[u8]) -> io::Result<()>;

    /// Write `content` at a named insertion point inside an existing output.
    fn write_at(
        &mut self,
        filename: &str,
        insertion_point: &str,
        content: &[u8],
    ) -> io::Result<()>;
}

/// Write one artifact through the sink.
///
/// A sink failure surfaces as [`Error::OutputWriteFailed`] naming the target
/// filename. Content passes through untransformed.
pub fn dispatch(sink: &mut dyn OutputSink, artifact: &Artifact) -> Result<()> {
    let outcome = match &artifact.insertion_point {
        Some(point) => sink.write_at(&artifact.name, point, artifact.content.as_bytes()),
        None => sink.write(&artifact.name, artifact.content.as_bytes()),
    };
    outcome.map_err(|source| Error::OutputWriteFailed {
        filename: artifact.name.clone(),
        source,
    })
}

/// Write every artifact, collecting failures.
///
/// A failed write never blocks the remaining artifacts; completed writes
/// stand regardless of later failures.
pub fn dispatch_all(sink: &mut dyn OutputSink, artifacts: &[Artifact]) -> Vec<Error> {
    let mut failures = Vec::new();
    for artifact in artifacts {
        if let Err(err) = dispatch(sink, artifact) {
            tracing::warn!(filename = %artifact.name, "artifact write failed: {err}");
            failures.push(err);
        }
    }
    failures
}

/// In-memory sink, for tests and hosts that post-process output themselves.
///
/// Rejects a second write to the same filename: artifact names are unique
/// within one invocation.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: BTreeMap<String, Vec<u8>>,
    insertions: Vec<(String, String, Vec<u8>)>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content written for `filename`, if any.
    #[must_use]
    pub fn file(&self, filename: &str) -> Option<&[u8]> {
        self.files.get(filename).map(Vec::as_slice)
    }

    /// All plain file writes, ordered by filename.
    #[must_use]
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    /// All insertion-point writes, in arrival order, as
    /// `(filename, insertion_point, content)`.
    #[must_use]
    pub fn insertions(&self) -> &[(String, String, Vec<u8>)] {
        &self.insertions
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, filename: &str, content: &[u8]) -> io::Result<()> {
        if self.files.contains_key(filename) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("duplicate artifact filename: {filename}"),
            ));
        }
        self.files.insert(filename.to_string(), content.to_vec());
        Ok(())
    }

    fn write_at(
        &mut self,
        filename: &str,
        insertion_point: &str,
        content: &[u8],
    ) -> io::Result<()> {
        self.insertions.push((
            filename.to_string(),
            insertion_point.to_string(),
            content.to_vec(),
        ));
        Ok(())
    }
}

/// Filesystem sink rooted at a directory.
///
/// Insertion-point writes splice content before the matching
/// `@@protoc_insertion_point(<name>)` marker line of an existing file.
#[derive(Debug)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    /// Create a sink writing under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl OutputSink for DirSink {
    fn write(&mut self, filename: &str, content: &[u8]) -> io::Result<()> {
        let path = self.root.join(filename);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    }

    fn write_at(
        &mut self,
        filename: &str,
        insertion_point: &str,
        content: &[u8],
    ) -> io::Result<()> {
        let path = self.root.join(filename);
        let existing = fs::read_to_string(&path)?;
        let inserted = std::str::from_utf8(content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let marker = format!("@@protoc_insertion_point({insertion_point})");
        let Some(marker_pos) = existing.find(&marker) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("insertion point \"{insertion_point}\" not found in {filename}"),
            ));
        };
        // Splice before the start of the marker's line so the marker stays
        // usable for later insertions.
        let line_start = existing[..marker_pos].rfind('\n').map_or(0, |i| i + 1);
        let mut updated = String::with_capacity(existing.len() + inserted.len());
        updated.push_str(&existing[..line_start]);
        updated.push_str(inserted);
        updated.push_str(&existing[line_start..]);
        fs::write(path, updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that refuses one filename and accepts everything else.
    struct RefusingSink {
        inner: MemorySink,
        refuse: String,
    }

    impl OutputSink for RefusingSink {
        fn write(&mut self, filename: &str, content: &[u8]) -> io::Result<()> {
            if filename == self.refuse {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "refused"));
            }
            self.inner.write(filename, content)
        }

        fn write_at(
            &mut self,
            filename: &str,
            insertion_point: &str,
            content: &[u8],
        ) -> io::Result<()> {
            self.inner.write_at(filename, insertion_point, content)
        }
    }

    #[test]
    fn test_dispatch_routes_plain_and_insertion_writes() {
        let mut sink = MemorySink::new();
        dispatch(&mut sink, &Artifact::new("a.h", "alpha")).unwrap();
        dispatch(
            &mut sink,
            &Artifact::at_insertion_point("a.h", "includes", "beta"),
        )
        .unwrap();

        assert_eq!(sink.file("a.h"), Some(b"alpha".as_slice()));
        assert_eq!(
            sink.insertions(),
            &[("a.h".to_string(), "includes".to_string(), b"beta".to_vec())]
        );
    }

    #[test]
    fn test_write_failure_names_filename() {
        let mut sink = RefusingSink {
            inner: MemorySink::new(),
            refuse: "bad.h".into(),
        };
        let err = dispatch(&mut sink, &Artifact::new("bad.h", "x")).unwrap_err();
        match err {
            Error::OutputWriteFailed { filename, .. } => assert_eq!(filename, "bad.h"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_one_failure_does_not_block_the_rest() {
        let mut sink = RefusingSink {
            inner: MemorySink::new(),
            refuse: "b.h".into(),
        };
        let artifacts = vec![
            Artifact::new("a.h", "1"),
            Artifact::new("b.h", "2"),
            Artifact::new("c.h", "3"),
        ];
        let failures = dispatch_all(&mut sink, &artifacts);
        assert_eq!(failures.len(), 1);
        assert!(sink.inner.file("a.h").is_some());
        assert!(sink.inner.file("c.h").is_some());
    }

    #[test]
    fn test_memory_sink_rejects_duplicate_filenames() {
        let mut sink = MemorySink::new();
        sink.write("dup.h", b"one").unwrap();
        let err = sink.write("dup.h", b"two").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_dir_sink_writes_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        sink.write("sub/dir/file.h", b"content").unwrap();
        let written = fs::read_to_string(dir.path().join("sub/dir/file.h")).unwrap();
        assert_eq!(written, "content");
    }

    #[test]
    fn test_dir_sink_splices_at_insertion_point() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        sink.write(
            "gen.h",
            b"#include \"base.h\"\n// @@protoc_insertion_point(includes)\nint x;\n",
        )
        .unwrap();
        sink.write_at("gen.h", "includes", b"#include \"extra.h\"\n")
            .unwrap();

        let updated = fs::read_to_string(dir.path().join("gen.h")).unwrap();
        assert_eq!(
            updated,
            "#include \"base.h\"\n#include \"extra.h\"\n\
             // @@protoc_insertion_point(includes)\nint x;\n"
        );
    }

    #[test]
    fn test_dir_sink_missing_insertion_point_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        sink.write("gen.h", b"int x;\n").unwrap();
        let err = sink.write_at("gen.h", "absent", b"y").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
