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

//! Core debugger components
//!
//! This module contains the debugger control layer:
//! - Execution units and the pause-flag protocol
//! - Live unit registry (target enumeration and change tallies)
//! - Memory map view used for decoding
//! - Per-kind disassembly bindings
//! - Branch target prediction
//! - Breakpoint coordination
//! - Selection / stepping / poll-loop state machine

pub mod breakpoints;
pub mod config;
pub mod debugger;
pub mod disasm;
pub mod error;
pub mod memory;
pub mod predict;
pub mod unit;

// Re-export commonly used types
pub use breakpoints::BreakpointSet;
pub use config::DebuggerConfig;
pub use debugger::DebuggerCore;
pub use disasm::{BranchInfo, DecodedInst, Decoder};
pub use error::{DebuggerError, Result};
pub use memory::MemoryMap;
pub use unit::registry::{EmuState, UnitRegistry};
pub use unit::{ExecUnit, PauseFlags, UnitId, UnitKind};
