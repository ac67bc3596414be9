// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Debugger configuration
//!
//! Runtime tunables for the control core, loadable from a TOML file.
//! Nothing here is persisted by the core itself; the front-end decides
//! where the file lives.

use crate::core::error::{DebuggerError, Result};
use serde::Deserialize;
use std::path::Path;

/// Debugger control-core configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Fixed re-evaluation period of the poll loop, in milliseconds
    pub poll_interval_ms: u64,

    /// Follow the program counter on every state change
    pub follow_pc: bool,

    /// Maximum call-stack entries pushed to render collaborators
    pub max_call_stack_depth: usize,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            follow_pc: true,
            max_call_stack_depth: 64,
        }
    }
}

impl DebuggerConfig {
    /// Parse a configuration from a TOML string
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a configuration file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DebuggerError::ConfigNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
