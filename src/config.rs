use crate::{
    indices::quad_tree::{DEFAULT_MAX_ITEMS, DEFAULT_MIN_SIZE},
    ConfigSnafu,
    IoSnafu,
};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::{fs, path::Path};

/// Settings for building a [QuadTree](crate::QuadTree)
///
/// Every field is optional when deserialising; missing fields take the
/// values of [IndexConfig::default], which covers the whole lat/lon sphere.
///
/// ```toml
/// north = 60.0
/// west = -10.0
/// south = 35.0
/// east = 30.0
/// max_items = 32
/// min_size = 0.0001
/// ```
///
/// A `min_size` of `0.0` disables the minimum node size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub max_items: usize,
    pub min_size: Option<f64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            north: 90.0,
            west: -180.0,
            south: -90.0,
            east: 180.0,
            max_items: DEFAULT_MAX_ITEMS,
            min_size: Some(DEFAULT_MIN_SIZE),
        }
    }
}

impl IndexConfig {
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        toml::from_str(s).context(ConfigSnafu)
    }

    pub fn load<P>(path: P) -> crate::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        log::debug!("Loading index config from {}", path.display());
        let contents = fs::read_to_string(path).context(IoSnafu)?;
        IndexConfig::from_toml_str(&contents)
    }

    /// The minimum size as understood by the tree, with `0.0` meaning none
    pub fn split_min_size(&self) -> Option<f64> {
        self.min_size.filter(|min_size| *min_size != 0.0)
    }

    /// Check that a tree can be built from this config
    pub fn validate(&self) -> crate::Result<()> {
        crate::QuadTree::<()>::from_config(self).map(|_| ())
    }
}
