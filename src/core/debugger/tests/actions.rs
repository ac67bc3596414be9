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

use super::{debugger_with_view, park_paused, running_registry};
use crate::core::debugger::views::ViewEvent;
use crate::core::debugger::Action;
use crate::core::unit::{PauseFlags, UnitKind};

#[test]
fn test_evaluate_address_accepts_hex_forms() {
    let registry = running_registry();
    let (dbg, _view) = debugger_with_view(&registry);

    assert_eq!(dbg.evaluate_address("0x1F00"), 0x1F00);
    assert_eq!(dbg.evaluate_address("1f00"), 0x1F00);
    assert_eq!(dbg.evaluate_address("  0X2000  "), 0x2000);
    assert_eq!(dbg.evaluate_address("0xFFFFFFFF"), 0xFFFF_FFFF);
}

#[test]
fn test_evaluate_address_falls_back_to_pc() {
    let registry = running_registry();
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    cpu.set_pc(0x4000);

    let (mut dbg, _view) = debugger_with_view(&registry);
    dbg.select_id(cpu.id());

    assert_eq!(dbg.evaluate_address("not an address"), 0x4000);
    assert_eq!(dbg.evaluate_address(""), 0x4000);
}

#[test]
fn test_evaluate_address_without_selection_is_zero() {
    let registry = running_registry();
    let (dbg, _view) = debugger_with_view(&registry);
    assert_eq!(dbg.evaluate_address("garbage"), 0);
}

#[test]
fn test_goto_address_navigates_views() {
    let registry = running_registry();
    let (mut dbg, view) = debugger_with_view(&registry);

    dbg.handle_action(Action::GotoAddress("0x8040".to_string()));
    assert!(view.events().contains(&ViewEvent::ShowAddress(0x8040)));
}

#[test]
fn test_goto_pc_navigates_to_the_selected_unit() {
    let registry = running_registry();
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    cpu.set_pc(0x1230);

    let (mut dbg, view) = debugger_with_view(&registry);
    dbg.select_id(cpu.id());
    view.reset();

    dbg.handle_action(Action::GotoPc);
    assert!(view.events().contains(&ViewEvent::ShowAddress(0x1230)));
}

#[test]
fn test_goto_next_instruction_prefers_the_taken_target() {
    let registry = running_registry();
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    // beq r0, r0, +4 words at 0x1000
    assert!(cpu.memory().write_u32(0x1000, (0x04 << 26) | 0x0004));
    cpu.set_pc(0x1000);

    let (mut dbg, view) = debugger_with_view(&registry);
    dbg.select_id(cpu.id());
    view.reset();

    dbg.handle_action(Action::GotoNextInstruction);
    assert!(view.events().contains(&ViewEvent::ShowAddress(0x1014)));
}

#[test]
fn test_goto_next_instruction_on_indirect_goes_nowhere() {
    let registry = running_registry();
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    // jr r31 at 0x1000
    assert!(cpu.memory().write_u32(0x1000, (31 << 21) | 0x08));
    cpu.set_pc(0x1000);

    let (mut dbg, view) = debugger_with_view(&registry);
    dbg.select_id(cpu.id());
    view.reset();

    dbg.handle_action(Action::GotoNextInstruction);
    assert!(!view
        .events()
        .iter()
        .any(|e| matches!(e, ViewEvent::ShowAddress(_))));
}

#[test]
fn test_step_actions_dispatch() {
    let registry = running_registry();
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    park_paused(&cpu);
    cpu.set_pc(0x1000);

    let (mut dbg, _view) = debugger_with_view(&registry);
    dbg.select_id(cpu.id());

    dbg.handle_action(Action::StepOver);
    assert!(dbg.breakpoints().contains(0x1004));

    park_paused(&cpu);
    dbg.update();
    dbg.handle_action(Action::Step);
    assert!(cpu.flags().contains(PauseFlags::DBG_STEP));
}

#[test]
fn test_toggle_action_dispatches() {
    let registry = running_registry();
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();

    let (mut dbg, _view) = debugger_with_view(&registry);
    dbg.select_id(cpu.id());

    dbg.handle_action(Action::ToggleRunPause);
    assert!(cpu.flags().contains(PauseFlags::DBG_PAUSE));
}

#[test]
fn test_address_prompt_default_shows_pc() {
    let registry = running_registry();
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    cpu.set_pc(0xBEEC);

    let (mut dbg, _view) = debugger_with_view(&registry);
    dbg.select_id(cpu.id());
    assert_eq!(dbg.address_prompt_default(), "0x0000BEEC");
}
