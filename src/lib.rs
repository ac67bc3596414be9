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

//! Live-attach debugger control core for a multi-core console emulator
//!
//! This library implements the control layer a debugger front-end sits on:
//! selecting one of several concurrently running execution units (CPU cores,
//! DSP cores, the GPU command processor), driving their pause/run/step state
//! through a shared atomic flag protocol, and performing step / step-over via
//! transient breakpoints and branch-target prediction.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use echo_debug::core::debugger::DebuggerCore;
//! use echo_debug::core::memory::MemoryMap;
//! use echo_debug::core::unit::registry::{EmuState, UnitRegistry};
//! use echo_debug::core::unit::UnitKind;
//!
//! let mem = Arc::new(MemoryMap::with_ram(0x20_0000));
//! let registry = Arc::new(UnitRegistry::new(mem));
//! registry.set_state(EmuState::Running);
//! registry.spawn_unit(UnitKind::Cpu, "CPU[0] main").unwrap();
//!
//! let mut dbg = DebuggerCore::new(registry);
//! dbg.update(); // one poll tick: picks up the new unit
//! ```

pub mod core;
