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

//! Live unit registry
//!
//! The emulator side creates and destroys execution units here; the
//! debugger only polls. Creation and deletion are tallied with monotonic
//! counters so the poll loop can dirty-check membership without rescanning,
//! and the overall session lifecycle is exposed alongside.

use super::{CommandProcessor, ExecUnit, UnitId, UnitKind};
use crate::core::error::{DebuggerError, Result};
use crate::core::memory::MemoryMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Size of a DSP core's private local store
pub const DSP_LOCAL_STORE_SIZE: u32 = 0x40000;

/// Overall emulation session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EmuState {
    /// No session; nothing is a valid debug target
    Stopped = 0,
    /// Session running
    Running = 1,
    /// Session paused globally
    Paused = 2,
}

impl EmuState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => EmuState::Running,
            2 => EmuState::Paused,
            _ => EmuState::Stopped,
        }
    }
}

/// Registry of live execution units
///
/// Shared (`Arc`) between the emulator threads that mutate it and the
/// debugger control thread that polls it. Units are owned here; everyone
/// else holds `Weak` references.
pub struct UnitRegistry {
    /// Live CPU/DSP units, keyed by id (the key order groups kinds)
    units: RwLock<BTreeMap<UnitId, Arc<ExecUnit>>>,

    /// Command-processor singleton; created once, never replaced
    gpu: Arc<CommandProcessor>,

    /// Main memory shared by CPU units and the command processor
    main_mem: Arc<MemoryMap>,

    /// Units ever created (monotonic)
    created: AtomicU64,

    /// Units ever deleted (monotonic)
    deleted: AtomicU64,

    /// Session lifecycle state
    state: AtomicU8,

    /// Next per-kind index for id allocation (Cpu, Dsp)
    next_index: [AtomicU32; 2],
}

impl UnitRegistry {
    pub fn new(main_mem: Arc<MemoryMap>) -> Self {
        Self {
            units: RwLock::new(BTreeMap::new()),
            gpu: Arc::new(CommandProcessor::new(Arc::clone(&main_mem))),
            main_mem,
            created: AtomicU64::new(0),
            deleted: AtomicU64::new(0),
            state: AtomicU8::new(EmuState::Stopped as u8),
            next_index: [AtomicU32::new(0), AtomicU32::new(0)],
        }
    }

    /// Create a new CPU or DSP unit
    ///
    /// DSP units get a private local store; CPU units share main memory.
    /// The command processor is a singleton and cannot be spawned.
    pub fn spawn_unit(&self, kind: UnitKind, name: impl Into<String>) -> Result<Arc<ExecUnit>> {
        let slot = match kind {
            UnitKind::Cpu => 0,
            UnitKind::Dsp => 1,
            UnitKind::Gpu => {
                return Err(DebuggerError::UnitKindMismatch {
                    expected: "CPU or DSP",
                    got: UnitKind::Gpu.label(),
                })
            }
        };

        let index = self.next_index[slot].fetch_add(1, Ordering::AcqRel) & 0x00FF_FFFF;
        let id = UnitId::new(kind, index);
        let mem = match kind {
            UnitKind::Dsp => Arc::new(MemoryMap::with_local_store(DSP_LOCAL_STORE_SIZE)),
            _ => Arc::clone(&self.main_mem),
        };

        let unit = Arc::new(ExecUnit::new(id, name, mem));
        self.units.write().unwrap().insert(id, Arc::clone(&unit));
        self.created.fetch_add(1, Ordering::AcqRel);
        log::debug!("registry: spawned {} ({})", unit.name(), id);
        Ok(unit)
    }

    /// Destroy a unit; true if it was present
    pub fn remove_unit(&self, id: UnitId) -> bool {
        let removed = self.units.write().unwrap().remove(&id);
        if let Some(unit) = removed {
            self.deleted.fetch_add(1, Ordering::AcqRel);
            log::debug!("registry: removed {} ({})", unit.name(), id);
            true
        } else {
            false
        }
    }

    /// Look up a live unit by id
    pub fn get(&self, id: UnitId) -> Option<Arc<ExecUnit>> {
        self.units.read().unwrap().get(&id).cloned()
    }

    /// The command-processor singleton
    ///
    /// Always the same allocation for the registry's lifetime; callers
    /// decide validity from the session state and the control handle.
    pub fn command_processor(&self) -> Arc<CommandProcessor> {
        Arc::clone(&self.gpu)
    }

    /// All live units of `kind`, ordered by id
    pub fn enumerate(&self, kind: UnitKind) -> Vec<(UnitId, String)> {
        self.units
            .read()
            .unwrap()
            .iter()
            .filter(|(id, _)| id.kind() == Some(kind))
            .map(|(id, unit)| (*id, unit.name().to_string()))
            .collect()
    }

    /// Monotonic count of units ever created
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Acquire)
    }

    /// Monotonic count of units ever deleted
    pub fn deleted_count(&self) -> u64 {
        self.deleted.load(Ordering::Acquire)
    }

    /// Session lifecycle state
    pub fn state(&self) -> EmuState {
        EmuState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Emulator-side: change the session lifecycle state
    pub fn set_state(&self, state: EmuState) {
        self.state.store(state as u8, Ordering::Release);
        log::debug!("registry: emulation state -> {:?}", state);
    }
}
