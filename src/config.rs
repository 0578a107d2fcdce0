// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Settings for the tapeworm binary.
//!
//! Read from `tapeworm.toml` in the user's config directory, then
//! overridden by environment variables and command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tapeworm_engine::{EngineConfig, Mode, Translator};
use tracing::debug;

/// Name of the settings file.
pub const CONFIG_FILE: &str = "tapeworm.toml";

/// Binary settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine used by `run`, `eval` and the shell
    pub mode: Mode,

    /// Directory for artifacts with relative names
    pub output_dir: Option<PathBuf>,

    /// Tape and source buffer sizes
    pub engine: EngineConfig,
}

impl Settings {
    /// Load settings from the default location, falling back to defaults
    /// when no file exists.
    pub fn load() -> anyhow::Result<Self> {
        let mut settings = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.load_from_env();
        Ok(settings)
    }

    /// Parse a settings file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings = Self::from_toml(&content)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn load_from_env(&mut self) {
        if let Some(mode) = std::env::var("TAPEWORM_MODE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.mode = mode;
        }
        if let Ok(dir) = std::env::var("TAPEWORM_OUT_DIR") {
            self.output_dir = Some(PathBuf::from(dir));
        }
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(
        &mut self,
        mode: Option<Mode>,
        tape_size: Option<usize>,
        buffer_size: Option<usize>,
        output_dir: Option<PathBuf>,
    ) {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if let Some(size) = tape_size {
            self.engine = self.engine.with_tape_size(size);
        }
        if let Some(size) = buffer_size {
            self.engine = self.engine.with_program_buffer_size(size);
        }
        if output_dir.is_some() {
            self.output_dir = output_dir;
        }
    }

    /// Translator matching these settings.
    pub fn translator(&self) -> anyhow::Result<Translator> {
        let mut builder = Translator::builder().with_tape_size(self.engine.tape_size);
        if let Some(dir) = &self.output_dir {
            builder = builder.output_directory(dir);
        }
        Ok(builder.build()?)
    }
}

/// `<config dir>/tapeworm/tapeworm.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tapeworm").join(CONFIG_FILE))
}
