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

//! Execution units and the cooperative pause-flag protocol
//!
//! An execution unit is one independently scheduled worker of the emulator:
//! a CPU core, a DSP core, or the GPU command processor. The debugger never
//! owns a unit; it holds weak references and re-validates them against the
//! live registry before every use.
//!
//! Pause/run/step intent travels through a single atomic flag word per unit.
//! The unit polls the word at its own dispatch points; the debugger mutates
//! it with one read-modify-write and issues an advisory wake when the word
//! leaves the paused state.

pub mod registry;

#[cfg(test)]
mod tests;

use crate::core::memory::MemoryMap;
use bitflags::bitflags;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

bitflags! {
    /// Cooperative scheduling flags polled by a running unit
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PauseFlags: u32 {
        /// Paused by the debugger for this unit
        const DBG_PAUSE = 1 << 0;
        /// Paused by a debugger-wide pause of the whole session
        const DBG_GLOBAL_PAUSE = 1 << 1;
        /// Execute exactly one instruction, then self-pause
        const DBG_STEP = 1 << 2;
        /// Unit acknowledged it is idle/exiting
        const WAIT = 1 << 3;
        /// Unit is shutting down
        const EXIT = 1 << 4;

        /// Any flag that means "paused for the debugger"
        const ANY_PAUSE = Self::DBG_PAUSE.bits() | Self::DBG_GLOBAL_PAUSE.bits();
    }
}

/// Execution unit kind
///
/// A closed set; every dispatch point in the debugger matches it
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Main CPU core (full address space, 4-byte instructions)
    Cpu,
    /// DSP core (256 KiB local store, 4-byte instructions)
    Dsp,
    /// GPU command processor (registry-owned singleton)
    Gpu,
}

impl UnitKind {
    /// Instruction width in bytes (uniform across kinds)
    pub const fn instruction_width(self) -> u32 {
        4
    }

    /// Mask that normalizes an address to this kind's instruction alignment
    /// and reachable range
    pub const fn address_mask(self) -> u32 {
        match self {
            UnitKind::Dsp => registry::DSP_LOCAL_STORE_SIZE - 4,
            UnitKind::Cpu | UnitKind::Gpu => !3,
        }
    }

    /// Byte-for-byte size of the register/context block snapshotted for
    /// change detection
    pub const fn context_size(self) -> usize {
        match self {
            UnitKind::Cpu => 136, // 32 GPRs + hi/lo
            UnitKind::Dsp => 520, // 128 vector halves + status
            UnitKind::Gpu => 64,  // FIFO get/put and method state
        }
    }

    /// Short display label
    pub const fn label(self) -> &'static str {
        match self {
            UnitKind::Cpu => "CPU",
            UnitKind::Dsp => "DSP",
            UnitKind::Gpu => "GPU",
        }
    }

    const fn id_byte(self) -> u32 {
        match self {
            UnitKind::Cpu => 0x01,
            UnitKind::Dsp => 0x02,
            UnitKind::Gpu => 0x55,
        }
    }
}

/// Stable numeric unit identity
///
/// The high byte encodes the kind, the low bits an index. An id uniquely
/// names a live unit for its lifetime but may be recycled after deletion,
/// which is why holders must re-validate by referent identity, never by id
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(u32);

impl UnitId {
    /// Fixed id of the command-processor singleton
    pub const GPU: UnitId = UnitId(0x5555_5555);

    /// Build an id from a kind tag and an index
    pub const fn new(kind: UnitKind, index: u32) -> Self {
        UnitId((kind.id_byte() << 24) | (index & 0x00FF_FFFF))
    }

    /// Raw 32-bit value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Kind encoded in the high byte, if the byte is a known tag
    pub const fn kind(self) -> Option<UnitKind> {
        match self.0 >> 24 {
            0x01 => Some(UnitKind::Cpu),
            0x02 => Some(UnitKind::Dsp),
            0x55 => Some(UnitKind::Gpu),
            _ => None,
        }
    }

    /// Index in the low bits
    pub const fn index(self) -> u32 {
        self.0 & 0x00FF_FFFF
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// One live execution unit
///
/// Owned by the registry (and possibly by its engine thread); the debugger
/// holds only `Weak` references to it. The flag word and pc are plain
/// atomics shared with the engine thread; the context block and call stack
/// are engine-written and snapshotted by the debugger for change detection.
pub struct ExecUnit {
    /// Stable identity
    id: UnitId,

    /// Kind tag (redundant with the id's high byte, kept for cheap matching)
    kind: UnitKind,

    /// Human-readable label shown in the target list
    name: String,

    /// Memory this unit executes from
    mem: Arc<MemoryMap>,

    /// Pause/step flag word, single-RMW protocol
    flags: AtomicU32,

    /// Current program counter, engine-published
    pc: AtomicU32,

    /// Advisory wake counter; incremented by `notify`, observed by the
    /// engine thread at its own polling points
    wakes: AtomicU64,

    /// Raw register/context block, engine-written
    context: Mutex<Vec<u8>>,

    /// Current call stack (return addresses, innermost first)
    call_stack: Mutex<Vec<u32>>,
}

impl ExecUnit {
    pub(crate) fn new(id: UnitId, name: impl Into<String>, mem: Arc<MemoryMap>) -> Self {
        let kind = id.kind().unwrap_or(UnitKind::Cpu);
        Self {
            id,
            kind,
            name: name.into(),
            mem,
            flags: AtomicU32::new(0),
            pc: AtomicU32::new(0),
            wakes: AtomicU64::new(0),
            context: Mutex::new(vec![0u8; kind.context_size()]),
            call_stack: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Memory map this unit executes from (main map for CPU/GPU, the
    /// private local store for a DSP)
    pub fn memory(&self) -> &Arc<MemoryMap> {
        &self.mem
    }

    /// Current flag word
    pub fn flags(&self) -> PauseFlags {
        PauseFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Apply `f` to the flag word in a single atomic read-modify-write
    ///
    /// Returns the flags as they were *before* the mutation; wake decisions
    /// are made purely from that prior value. `f` may run more than once on
    /// contention.
    pub fn update_flags(&self, f: impl Fn(&mut PauseFlags)) -> PauseFlags {
        let prior = self
            .flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let mut fl = PauseFlags::from_bits_truncate(bits);
                f(&mut fl);
                Some(fl.bits())
            })
            .unwrap_or_else(|bits| bits);
        PauseFlags::from_bits_truncate(prior)
    }

    /// Engine-side helper: set flags
    pub fn raise(&self, fl: PauseFlags) -> PauseFlags {
        self.update_flags(|f| f.insert(fl))
    }

    /// Engine-side helper: clear flags
    pub fn lower(&self, fl: PauseFlags) -> PauseFlags {
        self.update_flags(|f| f.remove(fl))
    }

    /// True while any debugger pause flag is set
    pub fn is_paused(&self) -> bool {
        self.flags().intersects(PauseFlags::ANY_PAUSE)
    }

    /// True once the unit acknowledged exit (`WAIT` and `EXIT` both set);
    /// such a unit is no longer a valid debug target
    pub fn is_gone(&self) -> bool {
        self.flags().contains(PauseFlags::WAIT | PauseFlags::EXIT)
    }

    /// Best-effort wake; the unit observes flag state at its own next
    /// polling point
    pub fn notify(&self) {
        self.wakes.fetch_add(1, Ordering::Release);
        log::trace!("{}: notify", self.name);
    }

    /// Number of wakes issued so far
    pub fn wake_count(&self) -> u64 {
        self.wakes.load(Ordering::Acquire)
    }

    pub fn pc(&self) -> u32 {
        self.pc.load(Ordering::Acquire)
    }

    /// Engine-side: publish a new program counter
    pub fn set_pc(&self, pc: u32) {
        self.pc.store(pc & self.kind.address_mask(), Ordering::Release);
    }

    /// Engine-side: publish the register/context block
    ///
    /// The stored block keeps its fixed per-kind size; shorter input is
    /// zero-padded, longer input truncated.
    pub fn write_context(&self, bytes: &[u8]) {
        let mut ctx = self.context.lock().unwrap();
        let len = ctx.len();
        ctx.fill(0);
        let n = bytes.len().min(len);
        ctx[..n].copy_from_slice(&bytes[..n]);
    }

    /// Byte-for-byte snapshot of the context block, used by the poll loop
    /// for change detection
    pub fn snapshot_context(&self) -> Vec<u8> {
        self.context.lock().unwrap().clone()
    }

    /// Engine-side: publish the current call stack
    pub fn set_call_stack(&self, frames: Vec<u32>) {
        *self.call_stack.lock().unwrap() = frames;
    }

    pub fn call_stack(&self) -> Vec<u32> {
        self.call_stack.lock().unwrap().clone()
    }

    /// Render the context block as 32-bit registers for the register panel
    pub fn dump_regs(&self) -> String {
        let ctx = self.context.lock().unwrap();
        let mut out = String::new();
        for (i, chunk) in ctx.chunks_exact(4).enumerate() {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            out.push_str(&format!("r{:02}: 0x{:08X}\n", i, word));
        }
        out
    }

    /// Render miscellaneous unit state for the state panel
    pub fn dump_misc(&self) -> String {
        format!(
            "{} id={} kind={} pc=0x{:08X} flags={:?}",
            self.name,
            self.id,
            self.kind.label(),
            self.pc(),
            self.flags()
        )
    }
}

/// The GPU command processor
///
/// Unlike CPU/DSP units this is a registry-owned singleton: it is created
/// once, never reallocated, and only logically cleared when emulation
/// stops. Validity as a debug target therefore requires identity with the
/// registry's current instance *and* an attached command-FIFO control
/// block.
pub struct CommandProcessor {
    unit: ExecUnit,
    ctrl: AtomicU32,
}

impl CommandProcessor {
    pub(crate) fn new(mem: Arc<MemoryMap>) -> Self {
        Self {
            unit: ExecUnit::new(UnitId::GPU, format!("GPU[{}]", UnitId::GPU), mem),
            ctrl: AtomicU32::new(0),
        }
    }

    /// The embedded execution unit (flags, pc, context)
    pub fn unit(&self) -> &ExecUnit {
        &self.unit
    }

    /// True while the command-FIFO control block is attached
    pub fn has_ctrl(&self) -> bool {
        self.ctrl.load(Ordering::Acquire) != 0
    }

    /// Engine-side: attach the FIFO control block at `addr`
    pub fn attach_ctrl(&self, addr: u32) {
        self.ctrl.store(addr.max(1), Ordering::Release);
    }

    /// Engine-side: logically clear the processor on session stop
    pub fn detach_ctrl(&self) {
        self.ctrl.store(0, Ordering::Release);
    }
}
