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

//! Render collaborators
//!
//! The control core pushes state to external views (instruction list,
//! breakpoint list, register/state panels, call stack) through this trait.
//! Pushes of the expensive dumps are gated by the poll loop's snapshot
//! comparison; views never pull.

use std::sync::{Arc, Mutex};

/// Enablement and labeling state for the run/step controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    /// A valid debug target is selected
    pub has_unit: bool,
    /// The selected unit is paused for the debugger (run button shows
    /// "Run", step buttons are enabled)
    pub paused: bool,
}

impl ControlState {
    pub fn step_enabled(&self) -> bool {
        self.has_unit && self.paused
    }
}

/// A render collaborator fed by the control core
///
/// All methods default to no-ops so a view only implements what it shows.
pub trait DebugView {
    /// Navigate the instruction list to `addr`
    fn show_address(&mut self, _addr: u32) {}

    /// The breakpoint set changed; full (address, enabled) snapshot
    fn breakpoints_changed(&mut self, _breakpoints: &[(u32, bool)]) {}

    /// New register/miscellaneous dumps and call stack for the panels
    fn state_dump(&mut self, _regs: &str, _misc: &str, _call_stack: &[u32]) {}

    /// Control enablement changed
    fn controls(&mut self, _state: ControlState) {}

    /// Selection lost; clear dependent panels
    fn clear(&mut self) {}
}

/// A view that ignores everything
pub struct NullView;

impl DebugView for NullView {}

/// One push observed by a [`RecordingView`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowAddress(u32),
    Breakpoints(Vec<(u32, bool)>),
    StateDump,
    Controls(ControlState),
    Clear,
}

/// Test double that records every push
///
/// Clones share the same event log, so a front-end test can keep one
/// handle while the core owns the other.
#[derive(Clone, Default)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything pushed so far
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drop the log
    pub fn reset(&self) {
        self.events.lock().unwrap().clear();
    }

    /// The most recent control-state push, if any
    pub fn last_controls(&self) -> Option<ControlState> {
        self.events()
            .iter()
            .rev()
            .find_map(|e| match e {
                ViewEvent::Controls(c) => Some(*c),
                _ => None,
            })
    }

    /// The most recent breakpoint snapshot, if any
    pub fn last_breakpoints(&self) -> Option<Vec<(u32, bool)>> {
        self.events()
            .iter()
            .rev()
            .find_map(|e| match e {
                ViewEvent::Breakpoints(b) => Some(b.clone()),
                _ => None,
            })
    }
}

impl DebugView for RecordingView {
    fn show_address(&mut self, addr: u32) {
        self.events.lock().unwrap().push(ViewEvent::ShowAddress(addr));
    }

    fn breakpoints_changed(&mut self, breakpoints: &[(u32, bool)]) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Breakpoints(breakpoints.to_vec()));
    }

    fn state_dump(&mut self, _regs: &str, _misc: &str, _call_stack: &[u32]) {
        self.events.lock().unwrap().push(ViewEvent::StateDump);
    }

    fn controls(&mut self, state: ControlState) {
        self.events.lock().unwrap().push(ViewEvent::Controls(state));
    }

    fn clear(&mut self) {
        self.events.lock().unwrap().push(ViewEvent::Clear);
    }
}
