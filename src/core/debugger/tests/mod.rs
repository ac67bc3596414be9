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

//! Control-core test modules
//!
//! Tests are organized into the following categories:
//! - `refresh`: counter-based target-list refresh and snapshot gating
//! - `selection`: selection, invalidation, stale-reference handling
//! - `stepping`: run/pause toggling, step, step-over breakpoints
//! - `actions`: front-end command dispatch and address evaluation
//!
//! Execution units are driven manually here, playing the engine-thread
//! side of the flag protocol (publish pc, raise pause flags) without any
//! real engine thread.

#[cfg(test)]
mod actions;




use crate::core::debugger::views::RecordingView;
use crate::core::debugger::DebuggerCore;
use crate::core::memory::MemoryMap;
use crate::core::unit::registry::{EmuState, UnitRegistry};
use crate::core::unit::{ExecUnit, PauseFlags};
use std::sync::Arc;

/// Registry with a running session over 128 KiB of executable RAM
fn running_registry() -> Arc<UnitRegistry> {
    let mem = Arc::new(MemoryMap::with_ram(0x2_0000));
    let registry = Arc::new(UnitRegistry::new(mem));
    registry.set_state(EmuState::Running);
    registry
}

/// A control core with one recording view attached
fn debugger_with_view(registry: &Arc<UnitRegistry>) -> (DebuggerCore, RecordingView) {
    let mut dbg = DebuggerCore::new(Arc::clone(registry));
    let view = RecordingView::new();
    dbg.add_view(Box::new(view.clone()));
    (dbg, view)
}

/// Engine side of the protocol: park the unit as paused-by-debugger
fn park_paused(unit: &ExecUnit) {
    unit.raise(PauseFlags::DBG_PAUSE);
}
