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

//! Console demonstration of the debugger control core
//!
//! Runs a synthetic session: one CPU unit executing a tiny program on a
//! stand-in engine loop, with the control core driving pause, step and
//! step-over against it. The engine stand-in honors the same flag protocol
//! and breakpoint set a real execution engine would.

use clap::Parser;
use echo_debug::core::breakpoints::BreakpointSet;
use echo_debug::core::config::DebuggerConfig;
use echo_debug::core::debugger::views::{ControlState, DebugView};
use echo_debug::core::debugger::{Action, DebuggerCore};
use echo_debug::core::error::Result;
use echo_debug::core::memory::MemoryMap;
use echo_debug::core::unit::registry::{EmuState, UnitRegistry};
use echo_debug::core::unit::{ExecUnit, PauseFlags, UnitKind};
use log::info;
use std::sync::Arc;

/// Debugger control-core demo session
#[derive(Parser)]
#[command(name = "echo-debug")]
#[command(about = "Debugger control core demo", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Number of step-over iterations to run
    #[arg(short = 'n', long, default_value = "4")]
    iterations: usize,
}

/// View that prints every push to the console
struct ConsoleView;

impl DebugView for ConsoleView {
    fn show_address(&mut self, addr: u32) {
        println!("  -> 0x{:08X}", addr);
    }

    fn breakpoints_changed(&mut self, breakpoints: &[(u32, bool)]) {
        let rendered: Vec<String> = breakpoints
            .iter()
            .map(|&(a, e)| format!("0x{:08X}{}", a, if e { "" } else { " (off)" }))
            .collect();
        println!("  breakpoints: [{}]", rendered.join(", "));
    }

    fn state_dump(&mut self, _regs: &str, misc: &str, call_stack: &[u32]) {
        println!("  {} stack_depth={}", misc, call_stack.len());
    }

    fn controls(&mut self, state: ControlState) {
        println!(
            "  controls: unit={} paused={}",
            state.has_unit, state.paused
        );
    }

    fn clear(&mut self) {
        println!("  (selection cleared)");
    }
}

/// Stand-in for one engine dispatch iteration
///
/// Executes at most one instruction: honors the pause flags, self-pauses on
/// a listed breakpoint, and understands just enough of the encoding (jal,
/// jr) to make step-over interesting.
fn engine_tick(unit: &ExecUnit, breakpoints: &BreakpointSet, link: &mut Vec<u32>) {
    let flags = unit.flags();
    if flags.intersects(PauseFlags::ANY_PAUSE) {
        return;
    }

    let pc = unit.pc();
    if breakpoints.contains(pc) {
        unit.raise(PauseFlags::DBG_PAUSE);
        return;
    }

    let word = unit.memory().read_u32(pc).unwrap_or(0);
    let next = match word >> 26 {
        0x02 => (pc & 0xF000_0000) | ((word & 0x03FF_FFFF) << 2),
        0x03 => {
            // jal: remember the continuation point
            link.push(pc.wrapping_add(4));
            (pc & 0xF000_0000) | ((word & 0x03FF_FFFF) << 2)
        }
        0x00 if word != 0 && word & 0x3F == 0x08 => link.pop().unwrap_or(pc.wrapping_add(4)),
        _ => pc.wrapping_add(4),
    };
    unit.set_pc(next);
    unit.set_call_stack(link.clone());

    if flags.contains(PauseFlags::DBG_STEP) {
        unit.update_flags(|f| {
            f.remove(PauseFlags::DBG_STEP);
            f.insert(PauseFlags::DBG_PAUSE);
        });
    }
}

/// Write the demo program: a loop that calls a short subroutine
fn load_program(mem: &MemoryMap) {
    // 0x1000: jal 0x2000     call the subroutine
    // 0x1004: nop
    // 0x1008: j 0x1000       loop forever
    mem.write_u32(0x1000, (0x03 << 26) | (0x2000 >> 2));
    mem.write_u32(0x1004, 0);
    mem.write_u32(0x1008, (0x02 << 26) | (0x1000 >> 2));

    // 0x2000: addiu r2, r0, 1
    // 0x2004: jr r31
    mem.write_u32(0x2000, (0x09 << 26) | (2 << 16) | 1);
    mem.write_u32(0x2004, (31 << 21) | 0x08);
}

/// Run the stand-in engine until the unit pauses itself
fn run_engine(unit: &ExecUnit, breakpoints: &BreakpointSet, link: &mut Vec<u32>) {
    for _ in 0..64 {
        if unit.is_paused() {
            return;
        }
        engine_tick(unit, breakpoints, link);
    }
}

fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("echo-debug v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DebuggerConfig::load(path)?,
        None => DebuggerConfig::default(),
    };

    let mem = Arc::new(MemoryMap::with_ram(0x1_0000));
    load_program(&mem);

    let registry = Arc::new(UnitRegistry::new(mem));
    registry.set_state(EmuState::Running);
    let cpu = registry.spawn_unit(UnitKind::Cpu, "CPU[0] main")?;
    cpu.set_pc(0x1000);
    cpu.raise(PauseFlags::DBG_PAUSE);

    let mut dbg = DebuggerCore::with_config(Arc::clone(&registry), config);
    dbg.add_view(Box::new(ConsoleView));
    dbg.update();
    dbg.select_id(cpu.id());

    let breakpoints = Arc::clone(dbg.breakpoints());
    let mut link = Vec::new();

    println!("step over the subroutine call at pc 0x{:08X}", cpu.pc());
    dbg.handle_action(Action::StepOver);
    run_engine(&cpu, &breakpoints, &mut link);
    dbg.update();

    for i in 0..args.iterations {
        println!("single step #{} at pc 0x{:08X}", i + 1, cpu.pc());
        dbg.handle_action(Action::Step);
        run_engine(&cpu, &breakpoints, &mut link);
        dbg.update();
    }

    println!("resume and run to a breakpoint at the subroutine");
    breakpoints.add(0x2000);
    dbg.handle_action(Action::ToggleRunPause);
    run_engine(&cpu, &breakpoints, &mut link);
    dbg.update();

    info!("session finished at pc 0x{:08X}", cpu.pc());
    Ok(())
}
