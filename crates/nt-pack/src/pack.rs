//! Pack files: one YAML document per source file.

use std::path::Path;

use chrono::{DateTime, Utc};

use nt_object::{AttributeSet, Object, ObjectKind, TagSet};
use nt_oid::Oid;
use nt_utils::RepoPath;

use crate::data::ObjectData;
use crate::{PackError, Result};

/// One object inside a pack.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PackObject {
    pub oid: Oid,
    pub kind: ObjectKind,
    /// Creation time of this object *version*: bumped when the object's
    /// payload changes, kept otherwise. Status counts derive from it.
    pub ctime: DateTime<Utc>,
    pub description: String,
    pub data: ObjectData,
}

impl PackObject {
    /// Decode the embedded object.
    pub fn decode(&self) -> Result<Object> {
        let yaml = self.data.decode()?;
        Ok(Object::from_yaml(self.kind, &yaml)?)
    }
}

/// Reference to a blob produced while packing a source file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlobRef {
    /// Content-hash OID of the blob bytes.
    pub oid: Oid,
    pub mime: String,
    pub attributes: AttributeSet,
    pub tags: TagSet,
}

/// The atomic unit of storage: all objects derived from one source file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PackFile {
    pub oid: Oid,
    pub file_relative_path: RepoPath,
    pub file_mtime: DateTime<Utc>,
    pub file_size: u64,
    pub ctime: DateTime<Utc>,
    pub objects: Vec<PackObject>,
    pub blobs: Vec<BlobRef>,
}

impl PackFile {
    /// Assemble a pack from freshly built objects.
    ///
    /// When `prior` holds the file's previous pack, unchanged objects keep
    /// their previous `ctime` (and identical payload bytes), so a no-op
    /// re-parse yields a pack that differs only in its own OID.
    pub fn from_objects(
        file_relative_path: &RepoPath,
        file_mtime: DateTime<Utc>,
        file_size: u64,
        objects: &[Object],
        blobs: Vec<BlobRef>,
        prior: Option<&PackFile>,
        now: DateTime<Utc>,
    ) -> Result<PackFile> {
        let mut pack_objects = Vec::with_capacity(objects.len());
        for object in objects {
            let data = ObjectData::encode(&object.to_yaml()?)?;
            let ctime = match prior.and_then(|p| p.find_object(object.oid())) {
                Some(previous) if previous.data == data => previous.ctime,
                _ => now,
            };
            pack_objects.push(PackObject {
                oid: object.oid().clone(),
                kind: object.kind(),
                ctime,
                description: object.description(),
                data,
            });
        }
        Ok(PackFile {
            oid: Oid::random(),
            file_relative_path: file_relative_path.clone(),
            file_mtime,
            file_size,
            ctime: now,
            objects: pack_objects,
            blobs,
        })
    }

    pub fn find_object(&self, oid: &Oid) -> Option<&PackObject> {
        self.objects.iter().find(|o| &o.oid == oid)
    }

    /// Decode every embedded object, in pack order.
    pub fn decode_objects(&self) -> Result<Vec<Object>> {
        self.objects.iter().map(PackObject::decode).collect()
    }

    /// On-disk path relative to the objects directory.
    pub fn relative_path(&self) -> String {
        format!("{}.pack", self.oid.relative_path())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<PackFile> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a pack file from disk.
    pub fn read_from(path: &Path) -> Result<PackFile> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml).map_err(|e| PackError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nt_object::{build_objects, ParsedFile, SchemaSet};

    const GO_MD: &str =
        "# Go\n\n## Note: Syntax\n\nBraces.\n\n## Flashcard: Keywords\n\nHow many?\n\n---\n\n25.\n";

    fn t(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn objects(content: &str, prior: &[Object], now: DateTime<Utc>) -> Vec<Object> {
        let parsed = ParsedFile::build(
            &RepoPath::new("go/go.md"),
            content,
            None,
            &SchemaSet::default(),
            &[],
        )
        .unwrap();
        build_objects(&parsed, prior, now, &|_| None).unwrap()
    }

    #[test]
    fn pack_round_trip() {
        let now = t("2023-01-01T00:00:00Z");
        let objs = objects(GO_MD, &[], now);
        let pack = PackFile::from_objects(
            &RepoPath::new("go/go.md"),
            now,
            GO_MD.len() as u64,
            &objs,
            Vec::new(),
            None,
            now,
        )
        .unwrap();

        let yaml = pack.to_yaml().unwrap();
        let back = PackFile::from_yaml(&yaml).unwrap();
        assert_eq!(back, pack);
        assert_eq!(back.decode_objects().unwrap(), objs);
    }

    #[test]
    fn unchanged_objects_keep_ctime() {
        let t0 = t("2023-01-01T00:00:00Z");
        let objs = objects(GO_MD, &[], t0);
        let pack0 = PackFile::from_objects(
            &RepoPath::new("go/go.md"),
            t0,
            GO_MD.len() as u64,
            &objs,
            Vec::new(),
            None,
            t0,
        )
        .unwrap();

        let t1 = t("2023-01-02T00:00:00Z");
        let edited = GO_MD.replace("Braces.", "Curly braces.");
        let objs1 = objects(&edited, &objs, t1);
        let pack1 = PackFile::from_objects(
            &RepoPath::new("go/go.md"),
            t1,
            edited.len() as u64,
            &objs1,
            Vec::new(),
            Some(&pack0),
            t1,
        )
        .unwrap();

        // The edited note got a fresh ctime, the untouched flashcard kept its own.
        let note1 = pack1
            .objects
            .iter()
            .find(|o| o.kind == ObjectKind::Note && o.description.contains("Syntax"))
            .unwrap();
        let card1 = pack1
            .objects
            .iter()
            .find(|o| o.kind == ObjectKind::Flashcard)
            .unwrap();
        assert_eq!(note1.ctime, t1);
        assert_eq!(card1.ctime, t0);
    }

    #[test]
    fn relative_path_uses_fanout() {
        let now = t("2023-01-01T00:00:00Z");
        let pack = PackFile::from_objects(
            &RepoPath::new("go.md"),
            now,
            0,
            &[],
            Vec::new(),
            None,
            now,
        )
        .unwrap();
        let rel = pack.relative_path();
        assert!(rel.starts_with(&format!("{}/", &pack.oid.as_str()[..2])));
        assert!(rel.ends_with(".pack"));
    }

    #[test]
    fn pack_yaml_has_expected_top_level_keys() {
        let now = t("2023-01-01T00:00:00Z");
        let objs = objects(GO_MD, &[], now);
        let pack = PackFile::from_objects(
            &RepoPath::new("go/go.md"),
            now,
            GO_MD.len() as u64,
            &objs,
            Vec::new(),
            None,
            now,
        )
        .unwrap();
        let yaml = pack.to_yaml().unwrap();
        for key in [
            "oid:",
            "file_relative_path:",
            "file_mtime:",
            "file_size:",
            "ctime:",
            "objects:",
            "blobs:",
        ] {
            assert!(yaml.contains(key), "missing {key} in pack YAML");
        }
    }
}
