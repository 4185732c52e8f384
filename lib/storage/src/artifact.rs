//! Model artifact directory: bincode model, gzip JSON catalog, JSON manifest
use crate::manifest::{sha256_hex, Manifest, FORMAT_VERSION};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use bookrec_core::{Catalog, Error, Model, Recommender, Result, TrainedModel};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MODEL_FILE: &str = "model.bin";
pub const BOOKS_FILE: &str = "books.json.gz";

/// Everything read back from an artifact directory
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub manifest: Manifest,
    pub model: Model,
    pub catalog: Catalog,
}

impl LoadedArtifact {
    pub fn into_recommender(self) -> Recommender {
        Recommender::new(self.model, self.catalog)
    }
}

/// Reads and writes the trained model under a `models/` directory
pub struct ArtifactStore {
    model_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Persist a trained model. The manifest is written last, so a directory
    /// with a manifest always has complete data files next to it.
    pub fn save(&self, trained: &TrainedModel) -> Result<Manifest> {
        fs::create_dir_all(&self.model_dir)?;

        let model_bytes = bincode::serialize(&trained.model)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let books_json = serde_json::to_vec(&trained.catalog)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&books_json)?;
        let books_bytes = encoder.finish()?;

        let mut manifest = Manifest::new(trained.model.metric(), trained.stats.clone());
        manifest.record_file(MODEL_FILE, &model_bytes);
        manifest.record_file(BOOKS_FILE, &books_bytes);
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.write_atomic(MODEL_FILE, &model_bytes)?;
        self.write_atomic(BOOKS_FILE, &books_bytes)?;
        self.write_atomic(MANIFEST_FILE, &manifest_bytes)?;

        info!(
            "Saved model artifact to {:?} ({} bytes model, {} bytes catalog)",
            self.model_dir,
            model_bytes.len(),
            books_bytes.len()
        );
        Ok(manifest)
    }

    /// Load and verify the artifact. Any missing file, checksum mismatch or
    /// inconsistent content is an error.
    pub fn load(&self) -> Result<LoadedArtifact> {
        let manifest_bytes = self.read(MANIFEST_FILE)?;
        let manifest: Manifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| Error::Artifact(format!("malformed {}: {}", MANIFEST_FILE, e)))?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::Artifact(format!(
                "unsupported artifact format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }

        let model_bytes = self.read_verified(&manifest, MODEL_FILE)?;
        let model: Model = bincode::deserialize(&model_bytes)
            .map_err(|e| Error::Artifact(format!("malformed {}: {}", MODEL_FILE, e)))?;
        model.validate()?;

        let books_bytes = self.read_verified(&manifest, BOOKS_FILE)?;
        let mut books_json = Vec::new();
        GzDecoder::new(books_bytes.as_slice())
            .read_to_end(&mut books_json)
            .map_err(|e| Error::Artifact(format!("malformed {}: {}", BOOKS_FILE, e)))?;
        let catalog: Catalog = serde_json::from_slice(&books_json)
            .map_err(|e| Error::Artifact(format!("malformed {}: {}", BOOKS_FILE, e)))?;

        if model.metric() != manifest.metric || model.n_items() != manifest.stats.items {
            return Err(Error::Artifact(
                "manifest does not describe the stored model".to_string(),
            ));
        }

        info!(
            "Loaded model artifact trained at {}: {} items, {} users, {} books",
            manifest.trained_at,
            model.n_items(),
            model.n_users(),
            catalog.len()
        );

        Ok(LoadedArtifact {
            manifest,
            model,
            catalog,
        })
    }

    fn write_atomic(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.model_dir.join(name);
        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(data))
            .map_err(|e| Error::Artifact(format!("failed to write {:?}: {}", path, e)))?;
        debug!("Wrote {:?} ({} bytes)", path, data.len());
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.model_dir.join(name);
        fs::read(&path).map_err(|e| Error::Artifact(format!("cannot read {:?}: {}", path, e)))
    }

    fn read_verified(&self, manifest: &Manifest, name: &str) -> Result<Vec<u8>> {
        let entry = manifest
            .files
            .get(name)
            .ok_or_else(|| Error::Artifact(format!("manifest has no entry for {}", name)))?;
        let data = self.read(name)?;
        if data.len() as u64 != entry.size {
            return Err(Error::Artifact(format!(
                "{} is {} bytes, manifest records {}",
                name,
                data.len(),
                entry.size
            )));
        }
        let actual = sha256_hex(&data);
        if actual != entry.sha256 {
            return Err(Error::ChecksumMismatch {
                file: name.to_string(),
                expected: entry.sha256.clone(),
                actual,
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookrec_core::{train, Book, Dataset, Rating, SimilarityMetric, UnknownBookPolicy};

    fn trained() -> TrainedModel {
        let catalog = Catalog::from_books(vec![
            Book::new("b1", "Fluent Python", "Luciano Ramalho", "python"),
            Book::new("b2", "Effective Python", "Brett Slatkin", "python"),
            Book::new("b3", "Dune", "Frank Herbert", "sci-fi"),
        ]);
        let ratings = vec![
            Rating::new("u1", "b1", 5.0),
            Rating::new("u1", "b2", 4.0),
            Rating::new("u2", "b2", 3.0),
            Rating::new("u2", "b3", 5.0),
        ];
        let dataset = Dataset::from_records(ratings, catalog, UnknownBookPolicy::Drop).unwrap();
        train(&dataset, SimilarityMetric::Cosine).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models"));
        let trained = trained();

        let manifest = store.save(&trained).unwrap();
        assert_eq!(manifest.files.len(), 2);

        let loaded = store.load().unwrap();
        assert_eq!(loaded.model, trained.model);
        assert_eq!(loaded.catalog, trained.catalog);
        assert_eq!(loaded.manifest, manifest);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(err.is_startup_error());
    }

    #[test]
    fn test_corrupted_model_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();

        let path = dir.path().join(MODEL_FILE);
        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        fs::write(&path, data).unwrap();

        assert!(matches!(
            store.load(),
            Err(Error::ChecksumMismatch { ref file, .. }) if file == MODEL_FILE
        ));
    }

    #[test]
    fn test_truncated_file_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();

        let path = dir.path().join(BOOKS_FILE);
        let mut data = fs::read(&path).unwrap();
        data.truncate(data.len() / 2);
        fs::write(&path, data).unwrap();

        match store.load().unwrap_err() {
            Error::Artifact(message) => assert!(message.contains(BOOKS_FILE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), b"{not json").unwrap();
        assert!(matches!(store.load(), Err(Error::Artifact(_))));
    }

    #[test]
    fn test_wrong_format_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut manifest = store.save(&trained()).unwrap();
        manifest.format_version = FORMAT_VERSION + 1;
        fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();
        assert!(matches!(store.load(), Err(Error::Artifact(_))));
    }

    #[test]
    fn test_into_recommender() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let saved = store.save(&trained()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.manifest.trained_at, saved.trained_at);
        let recommender = loaded.into_recommender();
        assert_eq!(recommender.similar("b1", 1).unwrap()[0].item_id, "b2");
    }
}
