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

use crate::core::memory::MemoryMap;
use crate::core::unit::registry::{EmuState, UnitRegistry};
use crate::core::unit::{UnitId, UnitKind};
use std::sync::Arc;

fn registry() -> UnitRegistry {
    UnitRegistry::new(Arc::new(MemoryMap::with_ram(0x2_0000)))
}

#[test]
fn test_spawn_assigns_kind_tagged_ids() {
    let reg = registry();

    let cpu = reg.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    let dsp = reg.spawn_unit(UnitKind::Dsp, "DSP[0]").unwrap();

    assert_eq!(cpu.id().kind(), Some(UnitKind::Cpu));
    assert_eq!(dsp.id().kind(), Some(UnitKind::Dsp));
    assert_ne!(cpu.id(), dsp.id());
    assert_eq!(reg.created_count(), 2);
}

#[test]
fn test_spawn_gpu_is_rejected() {
    let reg = registry();
    assert!(reg.spawn_unit(UnitKind::Gpu, "GPU").is_err());
    assert_eq!(reg.created_count(), 0);
}

#[test]
fn test_remove_tallies_only_present_units() {
    let reg = registry();
    let cpu = reg.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();

    assert!(reg.remove_unit(cpu.id()));
    assert_eq!(reg.deleted_count(), 1);

    assert!(!reg.remove_unit(cpu.id()));
    assert_eq!(reg.deleted_count(), 1);
}

#[test]
fn test_get_returns_the_registry_owned_instance() {
    let reg = registry();
    let cpu = reg.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();

    let looked_up = reg.get(cpu.id()).unwrap();
    assert!(Arc::ptr_eq(&looked_up, &cpu));

    reg.remove_unit(cpu.id());
    assert!(reg.get(cpu.id()).is_none());
}

#[test]
fn test_enumerate_filters_by_kind_in_id_order() {
    let reg = registry();
    reg.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    reg.spawn_unit(UnitKind::Dsp, "DSP[0]").unwrap();
    reg.spawn_unit(UnitKind::Cpu, "CPU[1]").unwrap();

    let cpus = reg.enumerate(UnitKind::Cpu);
    assert_eq!(cpus.len(), 2);
    assert_eq!(cpus[0].1, "CPU[0]");
    assert_eq!(cpus[1].1, "CPU[1]");
    assert!(cpus[0].0 < cpus[1].0);

    assert_eq!(reg.enumerate(UnitKind::Dsp).len(), 1);
}

#[test]
fn test_ids_are_not_recycled_across_respawn() {
    let reg = registry();
    let first = reg.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    let first_id = first.id();
    reg.remove_unit(first_id);

    let second = reg.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    assert_ne!(second.id(), first_id);
}

#[test]
fn test_dsp_units_get_private_local_store() {
    let reg = registry();
    let cpu = reg.spawn_unit(UnitKind::Cpu, "CPU[0]").unwrap();
    let dsp = reg.spawn_unit(UnitKind::Dsp, "DSP[0]").unwrap();

    assert!(!Arc::ptr_eq(cpu.memory(), dsp.memory()));
    // local store covers exactly 256 KiB
    assert!(dsp.memory().read_u32(0x3_FFFC).is_some());
    assert!(dsp.memory().read_u32(0x4_0000).is_none());
}

#[test]
fn test_command_processor_is_a_stable_singleton() {
    let reg = registry();
    let a = reg.command_processor();
    let b = reg.command_processor();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.unit().id(), UnitId::GPU);

    assert!(!a.has_ctrl());
    a.attach_ctrl(0x1234);
    assert!(a.has_ctrl());
    a.detach_ctrl();
    assert!(!a.has_ctrl());
}

#[test]
fn test_ctrl_attach_at_address_zero_still_counts() {
    let reg = registry();
    let gpu = reg.command_processor();
    gpu.attach_ctrl(0);
    assert!(gpu.has_ctrl());
}

#[test]
fn test_session_state_transitions() {
    let reg = registry();
    assert_eq!(reg.state(), EmuState::Stopped);

    reg.set_state(EmuState::Running);
    assert_eq!(reg.state(), EmuState::Running);

    reg.set_state(EmuState::Paused);
    assert_eq!(reg.state(), EmuState::Paused);
}
