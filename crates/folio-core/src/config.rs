// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Open and save options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// How sources are opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOption {
    /// Require owner rights on encrypted PDFs. Sources opened with user
    /// rights only are refused.
    pub full_access: bool,
    /// Parse PDFs straight from disk instead of buffering the file first.
    pub save_memory: bool,
    /// Resolution assumed for raster images, in DPI.
    pub image_dpi: f32,
}

impl Default for OpenOption {
    fn default() -> Self {
        Self {
            full_access: true,
            save_memory: false,
            image_dpi: 96.0,
        }
    }
}

/// How outputs are written. Contains the [`OpenOption`] used for every
/// source opened during the save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOption {
    #[serde(flatten)]
    pub open: OpenOption,
    /// Share objects (fonts, images) referenced by several pages of the same
    /// source instead of copying them once per page.
    pub smart_copy: bool,
    /// Compress output streams.
    pub shrink: bool,
    /// Directory for in-progress output files. Defaults to the destination's
    /// own directory so the final move is a rename.
    pub temp_directory: Option<PathBuf>,
}

impl Default for SaveOption {
    fn default() -> Self {
        Self {
            open: OpenOption::default(),
            smart_copy: true,
            shrink: true,
            temp_directory: None,
        }
    }
}

impl SaveOption {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let options: SaveOption = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), ?options, "Loaded save options");
        Ok(options)
    }
}
