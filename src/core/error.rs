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

/// Debugger error types
use thiserror::Error;

/// Result type for debugger operations
pub type Result<T> = std::result::Result<T, DebuggerError>;

/// Main error type for the debugger control core
///
/// Transient target loss, unpredictable branches, malformed address input
/// and unreadable memory are *not* errors; those degrade to "no unit
/// selected" / "no navigation" paths. Errors here are the genuinely
/// exceptional conditions: configuration problems and invalid identifiers
/// handed in by a caller.
#[derive(Error, Debug)]
pub enum DebuggerError {
    #[error("Unit kind mismatch: expected {expected}, got {got}")]
    UnitKindMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
