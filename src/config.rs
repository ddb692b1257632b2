use anyhow::{Context, Result};
use cropcraft_crops::CropConfig;
use cropcraft_world::DEFAULT_SECONDS_PER_DAY;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/cropcraft.toml";

/// Headless simulation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    /// Preset name used when no `[crop]` table is given.
    pub species: String,
    /// Full species definition, overriding `species`.
    pub crop: Option<CropConfig>,
    pub world_seed: u64,
    /// World/dimension name crops are planted in.
    pub world: String,
    /// Plot extent in blocks; the plot is centred on the origin.
    pub plot_width: i32,
    pub plot_depth: i32,
    /// Run a water channel down the middle of the plot.
    pub irrigate: bool,
    /// Simulated seconds per tick.
    pub tick_seconds: f64,
    pub ticks: u64,
    pub seconds_per_day: f64,
    /// Clear and rainy spell lengths, `[min, max]` seconds.
    pub clear_spell: [f64; 2],
    pub rain_spell: [f64; 2],
    pub save_dir: PathBuf,
    /// Unload and reload every chunk each this many ticks; 0 disables.
    pub stream_every: u64,
    pub fortune_level: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            species: "oats".to_string(),
            crop: None,
            world_seed: 0xC0FFEE,
            world: "overworld".to_string(),
            plot_width: 24,
            plot_depth: 9,
            irrigate: true,
            tick_seconds: 60.0,
            ticks: 14_400,
            seconds_per_day: DEFAULT_SECONDS_PER_DAY,
            clear_spell: [6_000.0, 36_000.0],
            rain_spell: [1_200.0, 9_000.0],
            save_dir: PathBuf::from("saves"),
            stream_every: 1_440,
            fortune_level: 0,
        }
    }
}

impl SimConfig {
    /// Load from the default path, falling back to defaults on any error.
    pub fn load() -> Self {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SimConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SimConfig::default()
                }
            },
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    warn!("Simulation config not found at {}. Using defaults", path.display());
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                SimConfig::default()
            }
        }
    }

    /// Load from an explicitly requested path; errors are returned.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Write the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The species definition to simulate.
    pub fn crop_config(&self) -> Result<CropConfig> {
        match &self.crop {
            Some(crop) => Ok(crop.clone()),
            None => CropConfig::preset(&self.species).with_context(|| {
                format!(
                    "Unknown species preset `{}` (known: {})",
                    self.species,
                    CropConfig::preset_names().join(", ")
                )
            }),
        }
    }
}
