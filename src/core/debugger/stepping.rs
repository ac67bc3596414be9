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

//! Run/pause toggling and single-stepping
//!
//! All intent travels through one atomic read-modify-write of the unit's
//! flag word; the wake decision is made from the flags as they were before
//! the mutation, so the engine is never woken for a pause request.
//!
//! Single-step sets `DBG_STEP` and resumes; the engine executes one
//! instruction and self-pauses. Step-over cannot use that, because a call
//! would be stepped *into*; instead a transient breakpoint is planted at the
//! sequentially next instruction and the unit resumed for real. The
//! transient breakpoint is retired as soon as the unit pauses on it.

use super::{Attach, DebuggerCore};
use crate::core::unit::{ExecUnit, PauseFlags, UnitKind};

impl DebuggerCore {
    /// Toggle the selected unit between running and paused
    ///
    /// No-op with nothing selected or a dead selection.
    pub fn run_or_pause(&mut self) {
        if let Some(live) = self.resolve_current_unit() {
            let exec = live.exec();
            let prior = exec.update_flags(|flags| {
                if flags.intersects(PauseFlags::ANY_PAUSE) {
                    flags.remove(PauseFlags::ANY_PAUSE);
                } else {
                    flags.insert(PauseFlags::DBG_PAUSE);
                }
            });
            // Wake only on the pause -> run transition
            if prior.intersects(PauseFlags::ANY_PAUSE) {
                log::debug!("debugger: resume {}", exec.name());
                exec.notify();
            } else {
                log::debug!("debugger: pause {}", exec.name());
            }
        }
        self.update();
    }

    /// Execute one instruction on the selected unit
    ///
    /// With `step_over` set on a CPU unit, a call instruction is run to
    /// completion instead of stepped into. Only a paused unit can step;
    /// anything else is a no-op.
    pub fn step(&mut self, step_over: bool) {
        let Some(live) = self.resolve_current_unit() else {
            return;
        };
        let exec = live.exec();
        if !exec.is_paused() {
            return;
        }

        // Only the CPU has call instructions worth running over; other
        // kinds degrade to a plain step
        let should_step_over = step_over && exec.kind() == UnitKind::Cpu;

        if should_step_over {
            let width = exec.kind().instruction_width();
            let next = exec.pc().wrapping_add(width) & exec.kind().address_mask();
            self.breakpoints.add(next);
            // A step-over issued before the previous one completed leaves
            // its transient breakpoint behind; drop it unless it is the
            // same address we just planted
            if let Some(prev) = self.pending_step_over.take() {
                if prev != next {
                    self.breakpoints.remove(prev);
                }
            }
            self.pending_step_over = Some(next);
            log::debug!("debugger: step-over breakpoint at 0x{:08X}", next);
        }

        exec.update_flags(|flags| {
            flags.remove(PauseFlags::ANY_PAUSE);
            if !should_step_over {
                flags.insert(PauseFlags::DBG_STEP);
            }
        });
        exec.notify();
        drop(live);

        if should_step_over {
            self.push_breakpoints();
        }
        self.update();
    }

    /// Retire the transient step-over breakpoint once the unit pauses on it
    pub(super) fn retire_step_over(&mut self, exec: &ExecUnit) {
        if self.pending_step_over == Some(exec.pc()) {
            if let Some(addr) = self.pending_step_over.take() {
                self.breakpoints.remove(addr);
                self.push_breakpoints();
            }
        }
    }

    /// Pause every unit in the target list, session-wide
    pub fn pause_all(&mut self) {
        self.refresh_targets();
        for entry in &self.entries {
            if let Attach::Core(weak) = entry.target() {
                if let Some(unit) = weak.upgrade() {
                    unit.raise(PauseFlags::DBG_GLOBAL_PAUSE);
                }
            }
        }
        let gpu = self.registry.command_processor();
        if gpu.has_ctrl() {
            gpu.unit().raise(PauseFlags::DBG_GLOBAL_PAUSE);
        }
        self.update();
    }

    /// Resume every unit paused by [`pause_all`](Self::pause_all)
    pub fn resume_all(&mut self) {
        self.refresh_targets();
        let resume_one = |unit: &ExecUnit| {
            let prior = unit.update_flags(|flags| {
                flags.remove(PauseFlags::DBG_GLOBAL_PAUSE);
            });
            // Wake only when dropping the global flag is what unpauses the
            // unit; one still held by DBG_PAUSE stays parked
            let remaining = prior - PauseFlags::DBG_GLOBAL_PAUSE;
            if prior.intersects(PauseFlags::ANY_PAUSE)
                && !remaining.intersects(PauseFlags::ANY_PAUSE)
            {
                unit.notify();
            }
        };

        for entry in &self.entries {
            if let Attach::Core(weak) = entry.target() {
                if let Some(unit) = weak.upgrade() {
                    resume_one(&unit);
                }
            }
        }
        let gpu = self.registry.command_processor();
        if gpu.has_ctrl() {
            resume_one(gpu.unit());
        }
        self.update();
    }
}
