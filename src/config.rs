use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed parameters of the decoder and the layout pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosaicConfig {
    /// Bytes per page. Must be a power of two. Default: 4096.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Grid width in tiles. Default: 512.
    #[serde(default = "default_columns_per_row")]
    pub columns_per_row: u32,
    /// Largest gap (in pages) that still keeps two regions in one block. Default: 64.
    #[serde(default = "default_max_gap_pages")]
    pub max_gap_pages: u64,
    /// Rows between two blocks. Default: 2.
    #[serde(default = "default_separator_rows")]
    pub separator_rows: u32,
    /// Edge length of a tile on the pixel surface. Default: 4.
    #[serde(default = "default_pixels_per_tile")]
    pub pixels_per_tile: u32,
    /// Upper bound on a frame's declared payload length. Default: 1 GiB.
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: u64,
}

fn default_page_size() -> u64 {
    4096
}

fn default_columns_per_row() -> u32 {
    512
}

fn default_max_gap_pages() -> u64 {
    64
}

fn default_separator_rows() -> u32 {
    2
}

fn default_pixels_per_tile() -> u32 {
    4
}

fn default_max_frame_len() -> u64 {
    1 << 30
}

impl Default for MosaicConfig {
    fn default() -> Self {
        MosaicConfig {
            page_size: default_page_size(),
            columns_per_row: default_columns_per_row(),
            max_gap_pages: default_max_gap_pages(),
            separator_rows: default_separator_rows(),
            pixels_per_tile: default_pixels_per_tile(),
            max_frame_len: default_max_frame_len(),
        }
    }
}

impl MosaicConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MosaicConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.page_size.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "page_size must be a power of two, got {}",
                self.page_size
            )));
        }
        if self.columns_per_row == 0 {
            return Err(ConfigError::Invalid("columns_per_row must be nonzero".into()));
        }
        if self.pixels_per_tile == 0 {
            return Err(ConfigError::Invalid("pixels_per_tile must be nonzero".into()));
        }
        if self.max_frame_len < 8 {
            return Err(ConfigError::Invalid(format!(
                "max_frame_len must be at least 8, got {}",
                self.max_frame_len
            )));
        }
        Ok(())
    }

    /// Largest gap in bytes that keeps two regions in one block.
    #[inline]
    pub fn max_gap_bytes(&self) -> u64 {
        self.max_gap_pages.saturating_mul(self.page_size)
    }
}
