pub mod manifest;
pub mod artifact;

pub use manifest::{FileEntry, Manifest, FORMAT_VERSION};
pub use artifact::{ArtifactStore, LoadedArtifact, BOOKS_FILE, MANIFEST_FILE, MODEL_FILE};
