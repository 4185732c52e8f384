use bookrec_core::{SimilarityMetric, TrainingStats};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Bumped whenever the on-disk layout of the artifact changes
pub const FORMAT_VERSION: u32 = 1;

/// Size and checksum of one artifact file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub size: u64,
    pub sha256: String,
}

impl FileEntry {
    pub fn for_bytes(data: &[u8]) -> Self {
        Self {
            size: data.len() as u64,
            sha256: sha256_hex(data),
        }
    }
}

/// Description of a trained artifact directory, written last by the trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub trained_at: String,
    pub metric: SimilarityMetric,
    pub stats: TrainingStats,
    pub files: BTreeMap<String, FileEntry>,
}

impl Manifest {
    pub fn new(metric: SimilarityMetric, stats: TrainingStats) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            trained_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            metric,
            stats,
            files: BTreeMap::new(),
        }
    }

    pub fn record_file(&mut self, name: &str, data: &[u8]) {
        self.files.insert(name.to_string(), FileEntry::for_bytes(data));
    }
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry() {
        let entry = FileEntry::for_bytes(b"abc");
        assert_eq!(entry.size, 3);
        assert_eq!(
            entry.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_manifest_json_shape() {
        let mut manifest = Manifest::new(SimilarityMetric::Adjusted, TrainingStats::default());
        manifest.record_file("model.bin", b"abc");
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["format_version"], FORMAT_VERSION);
        assert_eq!(json["metric"], "adjusted");
        assert_eq!(json["files"]["model.bin"]["size"], 3);
    }
}
