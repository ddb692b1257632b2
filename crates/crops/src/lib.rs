#![warn(missing_docs)]
//! Crop simulation engine.
//!
//! A [`CropSystem`] owns every live crop of one species. Each tick it asks the
//! [`BonusCalculator`] for water and rain factors and hands them to the
//! [`GrowthEngine`], which advances stages when the [`ConditionValidator`]
//! allows it. Harvests go through the [`YieldCalculator`]; chunk streaming goes
//! through the [`PersistenceManager`] onto any [`StorageBackend`].

pub mod backend;
pub mod bonus;
pub mod config;
pub mod crop;
pub mod growth;
pub mod harvest;
pub mod persist;
pub mod system;
pub mod validator;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use bonus::{BonusCalculator, Bonuses};
pub use config::{ConfigError, CropConfig, Gradient, ItemYield, Orientation, StageVisual, YieldConfig};
pub use crop::{Crop, CropId, CropRestoreError};
pub use growth::{GrowthEngine, GrowthError, GrowthOutcome, StageChange};
pub use harvest::{HarvestRecord, HarvestYield, YieldCalculator};
pub use persist::{
    chunk_key, parse_bundle, ChunkCropBundle, CropRecord, LoadedChunk, PersistenceError,
    PersistenceErrorKind, PersistenceManager, PositionRecord, FORMAT_VERSION,
};
pub use system::{ChunkLoadReport, CropSystem, PlantError, SaveSummary, TickReport};
pub use validator::{ConditionFailure, ConditionValidator, GrowthGate};
