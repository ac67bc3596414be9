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

//! Target-list maintenance and selection
//!
//! The target list is rebuilt only when the registry's creation/deletion
//! counters or the session state moved since the last look. Selection
//! survives a rebuild by referent identity, never by list position or id,
//! because ids may be recycled after deletion.

use super::views::ControlState;
use super::{Attach, DebuggerCore, LiveUnit, UnitEntry};
use crate::core::disasm::Decoder;
use crate::core::unit::registry::EmuState;
use crate::core::unit::{UnitId, UnitKind};
use std::sync::Arc;

impl DebuggerCore {
    /// Resolve the current selection to live referents
    ///
    /// CPU/DSP: upgrade the weak reference and reject exited units. GPU:
    /// valid only while a session exists, the held singleton is still the
    /// registry's, and a FIFO control block is attached.
    pub fn resolve_current_unit(&self) -> Option<LiveUnit> {
        match self.selected.as_ref()? {
            Attach::Core(weak) => {
                let unit = weak.upgrade()?;
                if unit.is_gone() {
                    return None;
                }
                Some(LiveUnit::Core(unit))
            }
            Attach::Gpu(gpu) => {
                if self.registry.state() == EmuState::Stopped {
                    return None;
                }
                if !Arc::ptr_eq(gpu, &self.registry.command_processor()) {
                    return None;
                }
                if !gpu.has_ctrl() {
                    return None;
                }
                Some(LiveUnit::Gpu(Arc::clone(gpu)))
            }
        }
    }

    /// Rebuild the target list if the registry moved since the last look
    ///
    /// Returns true if a rebuild happened. The first call after
    /// construction always rebuilds. While the session is stopped the list
    /// is empty regardless of registry contents.
    pub(super) fn refresh_targets(&mut self) -> bool {
        let created = self.registry.created_count();
        let deleted = self.registry.deleted_count();
        let state = self.registry.state();

        let dirty = !self.counters_primed
            || created != self.last_created
            || deleted != self.last_deleted
            || state != self.last_state;
        if !dirty {
            return false;
        }

        self.counters_primed = true;
        self.last_created = created;
        self.last_deleted = deleted;
        self.last_state = state;

        let previous = self.selected.clone();

        self.entries.clear();
        if state != EmuState::Stopped {
            for kind in [UnitKind::Cpu, UnitKind::Dsp] {
                for (id, label) in self.registry.enumerate(kind) {
                    if let Some(unit) = self.registry.get(id) {
                        self.entries.push(UnitEntry {
                            label,
                            id,
                            target: Attach::Core(Arc::downgrade(&unit)),
                        });
                    }
                }
            }
            let gpu = self.registry.command_processor();
            if gpu.has_ctrl() {
                self.entries.push(UnitEntry {
                    label: gpu.unit().name().to_string(),
                    id: UnitId::GPU,
                    target: Attach::Gpu(gpu),
                });
            }
        }

        log::trace!("debugger: target list rebuilt, {} entries", self.entries.len());

        // Keep the previously selected referent if it survived the rebuild
        match previous {
            Some(prev) => {
                let reselect = self
                    .entries
                    .iter()
                    .position(|entry| prev.same_referent(&entry.target));
                self.apply_selection(reselect);
            }
            None => self.current = None,
        }
        true
    }

    /// Select the entry at `index`, or deselect with `None`
    pub fn select(&mut self, index: Option<usize>) {
        self.refresh_targets();
        self.apply_selection(index);
    }

    /// Select the entry whose unit id is `id`; true if one was found
    pub fn select_id(&mut self, id: UnitId) -> bool {
        self.refresh_targets();
        let pos = self.entries.iter().position(|entry| entry.id == id);
        self.apply_selection(pos);
        pos.is_some()
    }

    pub(super) fn apply_selection(&mut self, index: Option<usize>) {
        let index = index.filter(|&i| i < self.entries.len());

        // Re-selecting the identical live referent is a no-op, wherever a
        // list rebuild may have moved it
        if let Some(i) = index {
            if self
                .selected
                .as_ref()
                .map_or(false, |sel| sel.same_referent(&self.entries[i].target))
                && self.resolve_current_unit().is_some()
            {
                self.current = index;
                return;
            }
        }

        self.current = index;

        let attach = match index {
            Some(i) => self.entries[i].target.clone(),
            None => {
                self.clear_selection();
                return;
            }
        };

        // Stale-id guard: an entry captured before a delete/respawn cycle
        // must not select a unit the registry no longer owns
        let accepted = match &attach {
            Attach::Core(weak) => match weak.upgrade() {
                Some(unit) => self
                    .registry
                    .get(unit.id())
                    .map_or(false, |live| Arc::ptr_eq(&live, &unit)),
                None => false,
            },
            Attach::Gpu(_) => true,
        };

        if !accepted {
            self.clear_selection();
            return;
        }

        self.selected = Some(attach);

        match self.resolve_current_unit() {
            Some(live) => {
                let exec = live.exec();
                let kind = exec.kind();
                let mem = Arc::clone(exec.memory());
                log::debug!("debugger: selected {}", exec.name());
                drop(live);

                self.decoder = Some(Decoder::bind(kind, mem));
                self.last_pc = None;
                self.last_flags = None;
                self.last_context.clear();
                self.do_update();
                self.push_breakpoints();
                self.push_controls();
            }
            None => {
                // Held but not currently a valid target (exited unit, GPU
                // without an attached control block)
                self.clear_selection();
            }
        }
    }

    /// Drop the selection and clear dependent render state
    pub(super) fn clear_selection(&mut self) {
        self.selected = None;
        self.decoder = None;
        self.last_pc = None;
        self.last_flags = None;
        self.last_context.clear();
        let disabled = ControlState {
            has_unit: false,
            paused: false,
        };
        for view in &mut self.views {
            view.clear();
            view.controls(disabled);
        }
    }
}
