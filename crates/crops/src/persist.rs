//! Chunk-scoped save and restore of crop records.
//!
//! Every chunk that holds crops of one species is stored under a single key,
//! `chunk_<species>_<chunkX>_<chunkZ>`, as a JSON bundle:
//!
//! ```json
//! { "chunkCoords": { "chunkX": 0, "chunkZ": -1 },
//!   "crops": [ { "id": "...", "position": { ... }, "stage": 2, ... } ],
//!   "version": 1,
//!   "lastSaved": 1700000000000 }
//! ```
//!
//! Loading classifies failures as corrupted (not JSON), invalid format (wrong
//! shape) or incompatible version. A single unreadable crop record is skipped
//! with a warning rather than failing the whole chunk.

use std::sync::Arc;

use cropcraft_core::Clock;
use cropcraft_world::{ChunkPos, WorldPos};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::StorageBackend;

/// Bundle format written by this engine. Any other version is rejected.
pub const FORMAT_VERSION: u32 = 1;

/// Storage key for one species' crops in one chunk.
pub fn chunk_key(species: &str, chunk: ChunkPos) -> String {
    format!("chunk_{species}_{}_{}", chunk.x, chunk.z)
}

/// Saved crop position, including the chunk it was saved under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    /// World or dimension name.
    pub world: String,
    /// Block X.
    pub x: i32,
    /// Block Y.
    pub y: i32,
    /// Block Z.
    pub z: i32,
    /// Chunk X at save time.
    pub chunk_x: i32,
    /// Chunk Z at save time.
    pub chunk_z: i32,
}

impl PositionRecord {
    /// The block position this record names.
    pub fn world_pos(&self) -> WorldPos {
        WorldPos::new(self.world.clone(), self.x, self.y, self.z)
    }

    /// The chunk coordinates written alongside the position.
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::new(self.chunk_x, self.chunk_z)
    }
}

impl From<&WorldPos> for PositionRecord {
    fn from(pos: &WorldPos) -> Self {
        let chunk = pos.chunk();
        Self {
            world: pos.world.clone(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            chunk_x: chunk.x,
            chunk_z: chunk.z,
        }
    }
}

/// Persisted subset of a crop. Visual height and particle timing are derived
/// on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecord {
    /// Instance identifier.
    pub id: String,
    /// Where the crop stands.
    pub position: PositionRecord,
    /// Growth stage.
    pub stage: u32,
    /// Seconds into the current stage.
    pub stage_progress: f64,
    /// Seconds since planting.
    pub total_age: f64,
    /// Planting time, epoch milliseconds.
    pub planted_at: i64,
    /// Last growth update, epoch milliseconds.
    pub last_update_time: i64,
}

/// All crops of one species in one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkCropBundle {
    /// Chunk the bundle belongs to.
    pub chunk_coords: ChunkPos,
    /// Saved crops, in position order.
    pub crops: Vec<CropRecord>,
    /// Format version tag.
    pub version: u32,
    /// Save time, epoch milliseconds; stamped by [`PersistenceManager::save_chunk`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<i64>,
}

impl ChunkCropBundle {
    /// Unsaved bundle at the current format version.
    pub fn new(chunk: ChunkPos, crops: Vec<CropRecord>) -> Self {
        Self {
            chunk_coords: chunk,
            crops,
            version: FORMAT_VERSION,
            last_saved: None,
        }
    }

    /// Bundle with no crops.
    pub fn empty(chunk: ChunkPos) -> Self {
        Self::new(chunk, Vec::new())
    }
}

/// Result of reading one chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChunk {
    /// The bundle, with unreadable crop records already removed.
    pub bundle: ChunkCropBundle,
    /// Crop records that could not be decoded.
    pub skipped_records: usize,
}

impl LoadedChunk {
    fn empty(chunk: ChunkPos) -> Self {
        Self {
            bundle: ChunkCropBundle::empty(chunk),
            skipped_records: 0,
        }
    }
}

/// A persistence failure for one chunk.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("chunk {chunk}: {kind}")]
pub struct PersistenceError {
    /// The chunk being saved or loaded.
    pub chunk: ChunkPos,
    /// What went wrong.
    pub kind: PersistenceErrorKind,
}

impl PersistenceError {
    fn new(chunk: ChunkPos, kind: PersistenceErrorKind) -> Self {
        Self { chunk, kind }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Persistence failure taxonomy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceErrorKind {
    /// The stored payload is not parseable.
    #[error("corrupted data: {0}")]
    CorruptedData(String),
    /// The payload parses but lacks the expected structure.
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// Structurally valid but written by a different format version.
    #[error("incompatible version {found}, expected {expected}")]
    IncompatibleVersion {
        /// Version found in the payload.
        found: i64,
        /// Version this engine reads.
        expected: u32,
    },
    /// The backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl PersistenceErrorKind {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CorruptedData(_) => "CORRUPTED_DATA",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::IncompatibleVersion { .. } => "INCOMPATIBLE_VERSION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Decode a stored payload for `chunk`.
///
/// Pure; used by [`PersistenceManager::load_chunk`] after the backend read.
pub fn parse_bundle(chunk: ChunkPos, raw: &str) -> Result<LoadedChunk, PersistenceError> {
    let fail = |kind| PersistenceError::new(chunk, kind);

    let value: Value = serde_json::from_str(raw)
        .map_err(|err| fail(PersistenceErrorKind::CorruptedData(err.to_string())))?;
    let object = value
        .as_object()
        .ok_or_else(|| fail(PersistenceErrorKind::InvalidFormat("payload is not an object".into())))?;

    let coords = object
        .get("chunkCoords")
        .and_then(Value::as_object)
        .ok_or_else(|| fail(PersistenceErrorKind::InvalidFormat("missing chunkCoords".into())))?;
    let coord = |name: &str| {
        coords
            .get(name)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| {
                fail(PersistenceErrorKind::InvalidFormat(format!(
                    "chunkCoords.{name} is not an integer"
                )))
            })
    };
    let stored = ChunkPos::new(coord("chunkX")?, coord("chunkZ")?);

    let crops = object
        .get("crops")
        .and_then(Value::as_array)
        .ok_or_else(|| fail(PersistenceErrorKind::InvalidFormat("crops is not an array".into())))?;

    // Integral floats such as `1.0` count as integers.
    let version = object
        .get("version")
        .and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64))
        })
        .ok_or_else(|| fail(PersistenceErrorKind::InvalidFormat("version is not an integer".into())))?;
    if version != i64::from(FORMAT_VERSION) {
        return Err(fail(PersistenceErrorKind::IncompatibleVersion {
            found: version,
            expected: FORMAT_VERSION,
        }));
    }

    if stored != chunk {
        warn!(requested = %chunk, stored = %stored, "Chunk bundle saved under different coordinates");
    }

    let last_saved = match object.get("lastSaved") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let millis = value.as_i64().or_else(|| value.as_f64().map(|f| f as i64));
            if millis.is_none() {
                warn!(chunk = %chunk, "Ignoring non-numeric lastSaved");
            }
            millis
        }
    };

    let mut records = Vec::with_capacity(crops.len());
    let mut skipped_records = 0;
    for (index, entry) in crops.iter().enumerate() {
        match CropRecord::deserialize(entry) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped_records += 1;
                warn!(chunk = %chunk, index, error = %err, "Skipping unreadable crop record");
            }
        }
    }

    Ok(LoadedChunk {
        bundle: ChunkCropBundle {
            chunk_coords: stored,
            crops: records,
            version: FORMAT_VERSION,
            last_saved,
        },
        skipped_records,
    })
}

/// Saves and loads chunk bundles for one species.
pub struct PersistenceManager {
    species: String,
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PersistenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceManager")
            .field("species", &self.species)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl PersistenceManager {
    /// Manager writing `species` keys to `backend`, stamping saves from `clock`.
    pub fn new(species: impl Into<String>, backend: Arc<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            species: species.into(),
            backend,
            clock,
        }
    }

    /// Species this manager keys by.
    pub fn species(&self) -> &str {
        &self.species
    }

    /// Storage key for `chunk`.
    pub fn key(&self, chunk: ChunkPos) -> String {
        chunk_key(&self.species, chunk)
    }

    /// Stamp `bundle` with the save time and write it.
    ///
    /// On failure the bundle keeps its previous `last_saved`.
    pub async fn save_chunk(&self, bundle: &mut ChunkCropBundle) -> Result<(), PersistenceError> {
        let previous = bundle.last_saved.replace(self.clock.now_millis());
        let result = self.write_bundle(bundle).await;
        if result.is_err() {
            bundle.last_saved = previous;
        }
        result
    }

    async fn write_bundle(&self, bundle: &ChunkCropBundle) -> Result<(), PersistenceError> {
        let chunk = bundle.chunk_coords;
        let payload = serde_json::to_string(bundle)
            .map_err(|err| PersistenceError::new(chunk, PersistenceErrorKind::Storage(err.to_string())))?;
        self.backend
            .save(&self.key(chunk), &payload)
            .await
            .map_err(|err| PersistenceError::new(chunk, PersistenceErrorKind::Storage(format!("{err:#}"))))?;
        debug!(chunk = %chunk, crops = bundle.crops.len(), "Saved crop chunk");
        Ok(())
    }

    /// Read `chunk`. A chunk never saved loads as empty.
    pub async fn load_chunk(&self, chunk: ChunkPos) -> Result<LoadedChunk, PersistenceError> {
        let raw = self
            .backend
            .load(&self.key(chunk))
            .await
            .map_err(|err| PersistenceError::new(chunk, PersistenceErrorKind::Storage(format!("{err:#}"))))?;
        match raw {
            Some(raw) => parse_bundle(chunk, &raw),
            None => Ok(LoadedChunk::empty(chunk)),
        }
    }

    /// Remove the saved bundle for `chunk`, returning whether one existed.
    pub async fn delete_chunk(&self, chunk: ChunkPos) -> Result<bool, PersistenceError> {
        self.backend
            .delete(&self.key(chunk))
            .await
            .map_err(|err| PersistenceError::new(chunk, PersistenceErrorKind::Storage(format!("{err:#}"))))
    }

    /// Whether a bundle is stored for `chunk`.
    pub async fn chunk_exists(&self, chunk: ChunkPos) -> Result<bool, PersistenceError> {
        self.backend
            .exists(&self.key(chunk))
            .await
            .map_err(|err| PersistenceError::new(chunk, PersistenceErrorKind::Storage(format!("{err:#}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use async_trait::async_trait;
    use cropcraft_core::ManualClock;
    use proptest::prelude::*;

    fn record(x: i32, z: i32) -> CropRecord {
        CropRecord {
            id: format!("oats-{x}-{z}"),
            position: PositionRecord::from(&WorldPos::new("overworld", x, 64, z)),
            stage: 2,
            stage_progress: 10.5,
            total_age: 86_410.5,
            planted_at: 1_000,
            last_update_time: 2_000,
        }
    }

    fn manager(backend: Arc<dyn StorageBackend>) -> PersistenceManager {
        PersistenceManager::new("oats", backend, Arc::new(ManualClock::new(42_000)))
    }

    struct BrokenBackend;

    #[async_trait]
    impl StorageBackend for BrokenBackend {
        async fn save(&self, _: &str, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
        async fn load(&self, _: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("disk unreadable")
        }
        async fn delete(&self, _: &str) -> anyhow::Result<bool> {
            anyhow::bail!("read-only")
        }
        async fn exists(&self, _: &str) -> anyhow::Result<bool> {
            anyhow::bail!("unmounted")
        }
    }

    #[test]
    fn chunk_key_format() {
        assert_eq!(chunk_key("oats", ChunkPos::new(3, -4)), "chunk_oats_3_-4");
    }

    #[test]
    fn position_record_uses_camel_case() {
        let json = serde_json::to_value(PositionRecord::from(&WorldPos::new("overworld", -1, 70, 17))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "world": "overworld", "x": -1, "y": 70, "z": 17, "chunkX": -1, "chunkZ": 1
            })
        );
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let backend = Arc::new(MemoryBackend::new());
        let manager = manager(backend.clone());
        let chunk = ChunkPos::new(0, 0);
        let mut bundle = ChunkCropBundle::new(chunk, vec![record(1, 2), record(3, 4)]);

        manager.save_chunk(&mut bundle).await.unwrap();
        assert_eq!(bundle.last_saved, Some(42_000));
        assert_eq!(backend.keys(), vec!["chunk_oats_0_0".to_string()]);
        assert!(manager.chunk_exists(chunk).await.unwrap());

        let loaded = manager.load_chunk(chunk).await.unwrap();
        assert_eq!(loaded.skipped_records, 0);
        assert_eq!(loaded.bundle, bundle);
    }

    #[tokio::test]
    async fn absent_chunk_loads_empty() {
        let manager = manager(Arc::new(MemoryBackend::new()));
        let loaded = manager.load_chunk(ChunkPos::new(9, 9)).await.unwrap();
        assert!(loaded.bundle.crops.is_empty());
        assert_eq!(loaded.bundle.chunk_coords, ChunkPos::new(9, 9));
        assert!(!manager.delete_chunk(ChunkPos::new(9, 9)).await.unwrap());
    }

    #[test]
    fn unparsable_payload_is_corrupted() {
        let err = parse_bundle(ChunkPos::new(1, 1), "{not json").unwrap_err();
        assert_eq!(err.code(), "CORRUPTED_DATA");
        assert_eq!(err.chunk, ChunkPos::new(1, 1));
    }

    #[test]
    fn structural_problems_are_invalid_format() {
        let chunk = ChunkPos::new(0, 0);
        for raw in [
            "[]",
            r#"{"crops": [], "version": 1}"#,
            r#"{"chunkCoords": {"chunkX": "a", "chunkZ": 0}, "crops": [], "version": 1}"#,
            r#"{"chunkCoords": {"chunkX": 0, "chunkZ": 0}, "crops": {}, "version": 1}"#,
            r#"{"chunkCoords": {"chunkX": 0, "chunkZ": 0}, "crops": []}"#,
            r#"{"chunkCoords": {"chunkX": 0, "chunkZ": 0}, "crops": [], "version": "1"}"#,
            r#"{"chunkCoords": {"chunkX": 0, "chunkZ": 0}, "crops": [], "version": 1.5}"#,
        ] {
            let err = parse_bundle(chunk, raw).unwrap_err();
            assert_eq!(err.code(), "INVALID_FORMAT", "{raw}");
        }
    }

    #[test]
    fn other_versions_are_incompatible() {
        let raw = r#"{"chunkCoords": {"chunkX": 0, "chunkZ": 0}, "crops": [], "version": 2}"#;
        let err = parse_bundle(ChunkPos::new(0, 0), raw).unwrap_err();
        assert_eq!(
            err.kind,
            PersistenceErrorKind::IncompatibleVersion { found: 2, expected: 1 }
        );
        assert_eq!(err.code(), "INCOMPATIBLE_VERSION");
    }

    #[test]
    fn integral_float_version_is_accepted() {
        let raw = r#"{"chunkCoords": {"chunkX": 0, "chunkZ": 0}, "crops": [], "version": 1.0}"#;
        let loaded = parse_bundle(ChunkPos::new(0, 0), raw).unwrap();
        assert_eq!(loaded.bundle.version, FORMAT_VERSION);

        let raw = r#"{"chunkCoords": {"chunkX": 0, "chunkZ": 0}, "crops": [], "version": 2.0}"#;
        assert_eq!(
            parse_bundle(ChunkPos::new(0, 0), raw).unwrap_err().code(),
            "INCOMPATIBLE_VERSION"
        );
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_stamp() {
        let manager = manager(Arc::new(BrokenBackend));
        let mut bundle = ChunkCropBundle::new(ChunkPos::new(0, 0), vec![record(1, 1)]);
        bundle.last_saved = Some(7);
        assert!(manager.save_chunk(&mut bundle).await.is_err());
        assert_eq!(bundle.last_saved, Some(7));
    }

    #[test]
    fn unreadable_records_are_skipped() {
        let good = serde_json::to_value(record(1, 1)).unwrap();
        let raw = serde_json::json!({
            "chunkCoords": {"chunkX": 0, "chunkZ": 0},
            "crops": [good, {"id": "broken"}, 17],
            "version": 1,
            "lastSaved": "yesterday",
        })
        .to_string();
        let loaded = parse_bundle(ChunkPos::new(0, 0), &raw).unwrap();
        assert_eq!(loaded.bundle.crops, vec![record(1, 1)]);
        assert_eq!(loaded.skipped_records, 2);
        assert_eq!(loaded.bundle.last_saved, None);
    }

    #[tokio::test]
    async fn backend_failures_are_storage_errors() {
        let manager = manager(Arc::new(BrokenBackend));
        let chunk = ChunkPos::new(-2, 5);
        let mut bundle = ChunkCropBundle::empty(chunk);

        let err = manager.save_chunk(&mut bundle).await.unwrap_err();
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert_eq!(err.chunk, chunk);
        assert_eq!(bundle.last_saved, None);
        assert_eq!(manager.load_chunk(chunk).await.unwrap_err().code(), "STORAGE_ERROR");
        assert_eq!(manager.delete_chunk(chunk).await.unwrap_err().code(), "STORAGE_ERROR");
        assert_eq!(manager.chunk_exists(chunk).await.unwrap_err().code(), "STORAGE_ERROR");
    }

    proptest! {
        #[test]
        fn arbitrary_payloads_never_panic(raw in ".{0,200}") {
            let _ = parse_bundle(ChunkPos::new(0, 0), &raw);
        }

        #[test]
        fn arbitrary_versions_classify(version in any::<i64>()) {
            let raw = format!(
                r#"{{"chunkCoords": {{"chunkX": 0, "chunkZ": 0}}, "crops": [], "version": {version}}}"#
            );
            let result = parse_bundle(ChunkPos::new(0, 0), &raw);
            if version == 1 {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result.unwrap_err().code(), "INCOMPATIBLE_VERSION");
            }
        }
    }
}
