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

//! Disassembly service bindings
//!
//! Each unit kind has its own instruction encoding. The debugger binds one
//! decoder per selection, parameterized by the selected unit's memory base,
//! and rebuilds it whenever the selection changes. Decoding never faults:
//! unreadable memory produces an "unknown" instruction.

mod cpu;
mod dsp;
mod gpu;

pub use cpu::CpuDecoder;
pub use dsp::DspDecoder;
pub use gpu::GpuDecoder;

use crate::core::memory::MemoryMap;
use crate::core::unit::UnitKind;
use std::sync::Arc;

/// Statically known control flow of one decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchInfo {
    /// Ordinary instruction; execution falls through
    None,
    /// Unconditional direct branch to a fixed target
    Direct(u32),
    /// Conditional direct branch: taken target or fall-through
    Conditional { taken: u32, fall_through: u32 },
    /// Register-computed branch or subroutine return; target unknowable
    Indirect,
}

/// One decoded instruction
#[derive(Debug, Clone)]
pub struct DecodedInst {
    /// Address the word was fetched from
    pub addr: u32,
    /// Raw encoding; `None` when the address was unreadable
    pub word: Option<u32>,
    /// Human-readable rendering
    pub text: String,
    /// Statically known successors
    pub branch: BranchInfo,
}

impl DecodedInst {
    /// The "could not read memory here" instruction
    pub fn unknown(addr: u32) -> Self {
        Self {
            addr,
            word: None,
            text: "<unreadable>".to_string(),
            branch: BranchInfo::None,
        }
    }
}

/// Decoder variant bound to one selected unit
///
/// A closed set matched exhaustively; selection builds the arm matching the
/// unit's kind and drops it when the selection changes.
pub enum Decoder {
    Cpu(CpuDecoder),
    Dsp(DspDecoder),
    Gpu(GpuDecoder),
}

impl Decoder {
    /// Build the decoder for `kind` over the unit's memory base
    pub fn bind(kind: UnitKind, mem: Arc<MemoryMap>) -> Self {
        match kind {
            UnitKind::Cpu => Decoder::Cpu(CpuDecoder::new(mem)),
            UnitKind::Dsp => Decoder::Dsp(DspDecoder::new(mem)),
            UnitKind::Gpu => Decoder::Gpu(GpuDecoder::new(mem)),
        }
    }

    /// Kind this decoder was bound for
    pub fn kind(&self) -> UnitKind {
        match self {
            Decoder::Cpu(_) => UnitKind::Cpu,
            Decoder::Dsp(_) => UnitKind::Dsp,
            Decoder::Gpu(_) => UnitKind::Gpu,
        }
    }

    /// Decode the instruction at `addr`
    pub fn decode_one(&self, addr: u32) -> DecodedInst {
        match self {
            Decoder::Cpu(d) => d.decode_one(addr),
            Decoder::Dsp(d) => d.decode_one(addr),
            Decoder::Gpu(d) => d.decode_one(addr),
        }
    }
}
