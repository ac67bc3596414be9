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

//! User-facing debugger actions
//!
//! A thin command layer between front-end input (keys, buttons, the goto
//! prompt) and the control-core methods. Front-ends with their own event
//! types translate into [`Action`] and call
//! [`handle_action`](DebuggerCore::handle_action).

use super::DebuggerCore;
use crate::core::predict;

/// A front-end command for the control core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Toggle the selected unit between running and paused
    ToggleRunPause,
    /// Execute one instruction
    Step,
    /// Execute one instruction, running calls to completion
    StepOver,
    /// Navigate the instruction list to a typed address
    GotoAddress(String),
    /// Navigate back to the selected unit's program counter
    GotoPc,
    /// Navigate to the predicted successor of the current instruction
    GotoNextInstruction,
}

impl DebuggerCore {
    /// Dispatch one front-end command
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::ToggleRunPause => self.run_or_pause(),
            Action::Step => self.step(false),
            Action::StepOver => self.step(true),
            Action::GotoAddress(text) => {
                let addr = self.evaluate_address(&text);
                self.show_address(addr);
            }
            Action::GotoPc => {
                if let Some(live) = self.resolve_current_unit() {
                    let pc = live.exec().pc();
                    drop(live);
                    self.show_address(pc);
                }
            }
            Action::GotoNextInstruction => self.goto_next_instruction(),
        }
    }

    /// Evaluate a typed address expression
    ///
    /// Accepts hexadecimal with or without a `0x` prefix. Anything that
    /// fails to parse falls back to the selected unit's program counter, or
    /// zero with nothing selected.
    pub fn evaluate_address(&self, text: &str) -> u32 {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if let Ok(addr) = u32::from_str_radix(digits, 16) {
            return addr;
        }
        self.resolve_current_unit()
            .map(|live| live.exec().pc())
            .unwrap_or(0)
    }

    /// Default text the front-end pre-fills in the goto prompt
    pub fn address_prompt_default(&self) -> String {
        let pc = self
            .resolve_current_unit()
            .map(|live| live.exec().pc())
            .unwrap_or(0);
        format!("0x{:08X}", pc)
    }

    fn goto_next_instruction(&mut self) {
        let Some(live) = self.resolve_current_unit() else {
            return;
        };
        let pc = live.exec().pc();
        drop(live);

        let target = self
            .decoder
            .as_ref()
            .and_then(|decoder| predict::preferred_target(decoder, pc));
        if let Some(addr) = target {
            self.show_address(addr);
        }
    }

    fn show_address(&mut self, addr: u32) {
        for view in &mut self.views {
            view.show_address(addr);
        }
    }
}
