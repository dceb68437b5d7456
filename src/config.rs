//! Configuration for building map hash tables.
use crate::grid::MAX_REQUESTED_CELLS_PER_AXIS;
use serde::de::Error;

/// Cell counts above this allocate enough memory to be worth a warning.
const LARGE_CELLS_PER_AXIS: u32 = 4096;

/// Settings used when a hash table is built for a map.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashTableConfig {
    /// Requested number of cells along each axis for ordinary maps.
    #[serde(default = "HashTableConfig::default_cells_per_axis")]
    pub cells_per_axis: u32,

    /// Requested number of cells along each axis for overview maps, which
    /// cover much larger areas.
    #[serde(default = "HashTableConfig::default_overview_cells_per_axis")]
    pub overview_cells_per_axis: u32,

    /// Map level from which a map counts as an overview map.
    #[serde(default = "HashTableConfig::default_overview_map_level")]
    pub overview_map_level: u32,
}

impl HashTableConfig {
    const fn default_cells_per_axis() -> u32 {
        100
    }

    const fn default_overview_cells_per_axis() -> u32 {
        300
    }

    const fn default_overview_map_level() -> u32 {
        2
    }

    pub fn with_cells_per_axis(mut self, cells: u32) -> Self {
        assert!(cells > 0, "Cells per axis must be greater than zero");
        warn_if_large("cells per axis", cells);
        self.cells_per_axis = cells;
        self
    }

    pub fn with_overview_cells_per_axis(mut self, cells: u32) -> Self {
        assert!(cells > 0, "Overview cells per axis must be greater than zero");
        warn_if_large("overview cells per axis", cells);
        self.overview_cells_per_axis = cells;
        self
    }

    pub fn with_overview_map_level(mut self, level: u32) -> Self {
        self.overview_map_level = level;
        self
    }

    /// Requested cells per axis for a map at `map_level`.
    pub fn cells_for_level(&self, map_level: u32) -> u32 {
        if map_level >= self.overview_map_level {
            self.overview_cells_per_axis
        } else {
            self.cells_per_axis
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cells_per_axis == 0 {
            return Err("Cells per axis must be greater than zero".to_string());
        }

        if self.overview_cells_per_axis == 0 {
            return Err("Overview cells per axis must be greater than zero".to_string());
        }

        for (name, cells) in [
            ("Cells per axis", self.cells_per_axis),
            ("Overview cells per axis", self.overview_cells_per_axis),
        ] {
            if cells > MAX_REQUESTED_CELLS_PER_AXIS {
                return Err(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_REQUESTED_CELLS_PER_AXIS, cells
                ));
            }
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: HashTableConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: HashTableConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn warn_if_large(name: &str, cells: u32) {
    if cells > LARGE_CELLS_PER_AXIS {
        log::warn!(
            "{} {} allocates up to {} cells per map",
            cells,
            name,
            u64::from(cells) * u64::from(cells)
        );
    }
}

impl Default for HashTableConfig {
    fn default() -> Self {
        Self {
            cells_per_axis: Self::default_cells_per_axis(),
            overview_cells_per_axis: Self::default_overview_cells_per_axis(),
            overview_map_level: Self::default_overview_map_level(),
        }
    }
}
