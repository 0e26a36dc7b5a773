use std::fs;
use std::path::{Path, PathBuf};

use outdiff_types::{Record, RecordRef};
use tracing::debug;

use crate::error::{ExportError, ExportResult};

/// Resolves record references into full records.
///
/// A resolver is always rooted in one snapshot, so the live tree and a
/// historical tree resolve the same reference independently.
pub trait RecordResolver: Send + Sync {
    fn resolve(&self, reference: &RecordRef) -> ExportResult<Record>;

    /// Resolve every reference, failing on the first unresolvable one.
    fn resolve_all(&self, references: &[RecordRef]) -> ExportResult<Vec<Record>> {
        references.iter().map(|r| self.resolve(r)).collect()
    }
}

/// Reads records from `<fixtures_root>/<group>/<item>.json`.
#[derive(Clone, Debug)]
pub struct FixtureResolver {
    fixtures_root: PathBuf,
}

impl FixtureResolver {
    pub fn new(fixtures_root: impl Into<PathBuf>) -> Self {
        Self {
            fixtures_root: fixtures_root.into(),
        }
    }

    pub fn fixtures_root(&self) -> &Path {
        &self.fixtures_root
    }

    fn record_path(&self, reference: &RecordRef) -> PathBuf {
        self.fixtures_root
            .join(&reference.group)
            .join(format!("{}.json", reference.item))
    }
}

impl RecordResolver for FixtureResolver {
    fn resolve(&self, reference: &RecordRef) -> ExportResult<Record> {
        let path = self.record_path(reference);
        let fail = |reason: String| ExportError::Resolve {
            record: reference.to_string(),
            path: path.clone(),
            reason,
        };

        let raw = fs::read_to_string(&path).map_err(|e| fail(e.to_string()))?;
        let data = serde_json::from_str(&raw).map_err(|e| fail(e.to_string()))?;
        debug!(record = %reference, path = %path.display(), "resolved record");
        Ok(Record::new(reference, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(root: &Path, group: &str, item: &str, body: &str) {
        let dir = root.join(group);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{item}.json")), body).unwrap();
    }

    #[test]
    fn resolves_fixture_json() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "acme", "spot1", r#"{"name": "Spot 1", "channels": 4}"#);

        let resolver = FixtureResolver::new(dir.path());
        let record = resolver.resolve(&RecordRef::new("acme", "spot1")).unwrap();

        assert_eq!(record.group, "acme");
        assert_eq!(record.item, "spot1");
        assert_eq!(record.data["channels"], 4);
    }

    #[test]
    fn missing_fixture_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FixtureResolver::new(dir.path());

        let err = resolver.resolve(&RecordRef::new("acme", "ghost")).unwrap_err();
        match err {
            ExportError::Resolve { record, path, .. } => {
                assert_eq!(record, "acme/ghost");
                assert!(path.ends_with("acme/ghost.json"));
            }
            other => panic!("expected Resolve, got {other:?}"),
        }
    }

    #[test]
    fn malformed_fixture_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "acme", "broken", "{ not json");

        let resolver = FixtureResolver::new(dir.path());
        assert!(resolver.resolve(&RecordRef::new("acme", "broken")).is_err());
    }

    #[test]
    fn resolve_all_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "acme", "b", "2");
        fixture(dir.path(), "acme", "a", "1");

        let resolver = FixtureResolver::new(dir.path());
        let records = resolver
            .resolve_all(&[RecordRef::new("acme", "b"), RecordRef::new("acme", "a")])
            .unwrap();
        let items: Vec<&str> = records.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, ["b", "a"]);
    }
}
