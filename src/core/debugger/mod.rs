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

//! Debugger control core
//!
//! The single-threaded state machine behind a live-attach debugger: it
//! tracks which execution units exist, which one is selected, drives the
//! selected unit's pause/run/step flags, and pushes render updates to its
//! views. It is driven by a fixed-period poll tick ([`DebuggerCore::update`])
//! plus explicit user actions; it never blocks on an execution unit.
//!
//! Units are held through [`Attach`] references that are re-validated
//! against the registry on every use. A selection can silently die between
//! two ticks (unit deleted, session stopped); every entry point copes by
//! resolving first and doing nothing on failure.

pub mod views;

mod actions;
mod selection;
mod stepping;

#[cfg(test)]
mod tests;

pub use actions::Action;

use crate::core::breakpoints::BreakpointSet;
use crate::core::config::DebuggerConfig;
use crate::core::disasm::Decoder;
use crate::core::unit::registry::{EmuState, UnitRegistry};
use crate::core::unit::{CommandProcessor, ExecUnit, PauseFlags, UnitId};
use std::sync::{Arc, Weak};
use std::time::Duration;
use views::{ControlState, DebugView};

/// A held reference to a potential debug target
///
/// CPU/DSP units are held weakly and upgraded on every use. The command
/// processor is a registry-owned singleton that is never deallocated, so it
/// is held strongly; its validity is decided from the session state and its
/// FIFO control handle instead.
#[derive(Clone)]
pub enum Attach {
    Core(Weak<ExecUnit>),
    Gpu(Arc<CommandProcessor>),
}

impl Attach {
    fn same_referent(&self, other: &Attach) -> bool {
        match (self, other) {
            (Attach::Core(a), Attach::Core(b)) => Weak::ptr_eq(a, b),
            (Attach::Gpu(a), Attach::Gpu(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A selection resolved to live referents for the duration of one operation
pub enum LiveUnit {
    Core(Arc<ExecUnit>),
    Gpu(Arc<CommandProcessor>),
}

impl LiveUnit {
    /// The shared execution-unit state (flags, pc, context)
    pub fn exec(&self) -> &ExecUnit {
        match self {
            LiveUnit::Core(unit) => unit,
            LiveUnit::Gpu(gpu) => gpu.unit(),
        }
    }
}

/// One row of the debug-target list
pub struct UnitEntry {
    label: String,
    id: UnitId,
    target: Attach,
}

impl UnitEntry {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn target(&self) -> &Attach {
        &self.target
    }
}

/// The debugger control core
///
/// Owns the breakpoint set, the target list, the current selection and its
/// bound decoder, and the snapshot caches that gate render pushes. All
/// methods take `&mut self`; the front-end calls them from one control
/// thread.
pub struct DebuggerCore {
    registry: Arc<UnitRegistry>,
    config: DebuggerConfig,
    breakpoints: Arc<BreakpointSet>,
    views: Vec<Box<dyn DebugView>>,

    /// Target list as of the last refresh
    entries: Vec<UnitEntry>,
    /// Index of the selected entry, if any
    current: Option<usize>,
    /// Held reference backing the selection
    selected: Option<Attach>,
    /// Decoder bound to the selected unit's kind and memory
    decoder: Option<Decoder>,

    /// Registry counters as of the last refresh; the list is rebuilt only
    /// when one of these moves
    last_created: u64,
    last_deleted: u64,
    last_state: EmuState,
    counters_primed: bool,

    /// Snapshot caches gating expensive render pushes
    last_pc: Option<u32>,
    last_flags: Option<PauseFlags>,
    last_context: Vec<u8>,

    /// Transient breakpoint injected by the last step-over, not yet hit
    pending_step_over: Option<u32>,
}

impl DebuggerCore {
    pub fn new(registry: Arc<UnitRegistry>) -> Self {
        Self::with_config(registry, DebuggerConfig::default())
    }

    pub fn with_config(registry: Arc<UnitRegistry>, config: DebuggerConfig) -> Self {
        Self {
            registry,
            config,
            breakpoints: Arc::new(BreakpointSet::new()),
            views: Vec::new(),
            entries: Vec::new(),
            current: None,
            selected: None,
            decoder: None,
            last_created: 0,
            last_deleted: 0,
            last_state: EmuState::Stopped,
            counters_primed: false,
            last_pc: None,
            last_flags: None,
            last_context: Vec::new(),
            pending_step_over: None,
        }
    }

    /// Attach a render collaborator
    pub fn add_view(&mut self, view: Box<dyn DebugView>) {
        self.views.push(view);
    }

    /// Shared breakpoint set; engine dispatch loops hold a clone
    pub fn breakpoints(&self) -> &Arc<BreakpointSet> {
        &self.breakpoints
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    /// Current target list (valid until the next refresh)
    pub fn entries(&self) -> &[UnitEntry] {
        &self.entries
    }

    /// Index of the selected entry, if any
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Transient step-over breakpoint not yet retired, if any
    pub fn pending_step_over(&self) -> Option<u32> {
        self.pending_step_over
    }

    /// Period at which the front-end should call [`update`](Self::update)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// One poll tick
    ///
    /// Refreshes the target list if the registry moved, re-validates the
    /// selection, and pushes render updates only when the observable state
    /// (pc, flag word, or context block) changed since the previous tick.
    pub fn update(&mut self) {
        self.refresh_targets();

        match self.resolve_current_unit() {
            None => {
                if self.last_pc.is_some() || !self.last_context.is_empty() {
                    self.last_pc = None;
                    self.last_flags = None;
                    self.last_context.clear();
                    self.do_update();
                    self.push_controls();
                }
            }
            Some(live) => {
                self.retire_step_over(live.exec());

                let pc = live.exec().pc();
                let flags = live.exec().flags();
                let context = live.exec().snapshot_context();
                if self.last_pc != Some(pc)
                    || self.last_flags != Some(flags)
                    || self.last_context != context
                {
                    self.last_pc = Some(pc);
                    self.last_flags = Some(flags);
                    self.last_context = context;
                    drop(live);
                    self.do_update();
                    self.push_controls();
                }
            }
        }
    }

    /// Re-render everything that depends on the selected unit's state
    fn do_update(&mut self) {
        match self.resolve_current_unit() {
            Some(live) => {
                let pc = live.exec().pc();
                if self.config.follow_pc {
                    for view in &mut self.views {
                        view.show_address(pc);
                    }
                }
                self.write_panels(&live);
            }
            None => {
                for view in &mut self.views {
                    view.clear();
                }
            }
        }
    }

    fn write_panels(&mut self, live: &LiveUnit) {
        let exec = live.exec();
        let regs = exec.dump_regs();
        let misc = exec.dump_misc();
        let mut stack = exec.call_stack();
        stack.truncate(self.config.max_call_stack_depth);
        for view in &mut self.views {
            view.state_dump(&regs, &misc, &stack);
        }
    }

    fn push_controls(&mut self) {
        let state = match self.resolve_current_unit() {
            Some(live) => ControlState {
                has_unit: true,
                paused: live.exec().is_paused(),
            },
            None => ControlState {
                has_unit: false,
                paused: false,
            },
        };
        for view in &mut self.views {
            view.controls(state);
        }
    }

    fn push_breakpoints(&mut self) {
        let list = self.breakpoints.list();
        for view in &mut self.views {
            view.breakpoints_changed(&list);
        }
    }
}
