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

//! DSP core instruction decoder
//!
//! The DSP executes out of a private 256 KiB local store with an 18-bit
//! program counter; all computed addresses wrap within the store. Encoding
//! is 32-bit words with the opcode in the top 8 bits:
//!
//! ```text
//! | op (8) | rt (7) | unused (1) | immediate (16) |
//! ```
//!
//! Branches: `br` (relative unconditional), `brz`/`brnz` (relative
//! conditional), `bra` (absolute), `bi`/`ret` (register-indirect).

use super::{BranchInfo, DecodedInst};
use crate::core::memory::MemoryMap;
use crate::core::unit::UnitKind;
use std::sync::Arc;

#[inline(always)]
fn fields(word: u32) -> (u8, u8, u16) {
    let op = (word >> 24) as u8;
    let rt = ((word >> 17) & 0x7F) as u8;
    let imm = (word & 0xFFFF) as u16;
    (op, rt, imm)
}

/// Wrap an address into the local store, instruction-aligned
#[inline(always)]
fn wrap(addr: u32) -> u32 {
    addr & UnitKind::Dsp.address_mask()
}

#[inline(always)]
fn rel_target(addr: u32, imm: u16) -> u32 {
    wrap(addr.wrapping_add(((imm as i16 as i32) << 2) as u32))
}

#[inline(always)]
fn abs_target(imm: u16) -> u32 {
    wrap((imm as u32) << 2)
}

/// DSP decoder bound to one local store
pub struct DspDecoder {
    mem: Arc<MemoryMap>,
}

impl DspDecoder {
    pub fn new(mem: Arc<MemoryMap>) -> Self {
        Self { mem }
    }

    pub fn decode_one(&self, addr: u32) -> DecodedInst {
        let addr = wrap(addr);
        match self.mem.read_exec_u32(addr) {
            Some(word) => decode(addr, word),
            None => DecodedInst::unknown(addr),
        }
    }
}

fn decode(addr: u32, word: u32) -> DecodedInst {
    let (op, rt, imm) = fields(word);
    let fall_through = wrap(addr.wrapping_add(4));

    let (text, branch) = match op {
        0x00 if word == 0 => ("nop".to_string(), BranchInfo::None),
        0x20 => {
            let t = rel_target(addr, imm);
            (format!("br 0x{:05X}", t), BranchInfo::Direct(t))
        }
        0x21 => {
            let t = rel_target(addr, imm);
            (
                format!("brz v{}, 0x{:05X}", rt, t),
                BranchInfo::Conditional {
                    taken: t,
                    fall_through,
                },
            )
        }
        0x22 => {
            let t = rel_target(addr, imm);
            (
                format!("brnz v{}, 0x{:05X}", rt, t),
                BranchInfo::Conditional {
                    taken: t,
                    fall_through,
                },
            )
        }
        0x30 => {
            let t = abs_target(imm);
            (format!("bra 0x{:05X}", t), BranchInfo::Direct(t))
        }
        0x35 => (format!("bi v{}", rt), BranchInfo::Indirect),
        0x36 => ("ret".to_string(), BranchInfo::Indirect),
        0x40 => (format!("il v{}, 0x{:04X}", rt, imm), BranchInfo::None),
        0x41 => (format!("a v{}, 0x{:04X}", rt, imm), BranchInfo::None),
        0x50 => (format!("lqd v{}, 0x{:04X}", rt, imm), BranchInfo::None),
        0x51 => (format!("stqd v{}, 0x{:04X}", rt, imm), BranchInfo::None),
        _ => (format!(".word 0x{:08X}", word), BranchInfo::None),
    };

    DecodedInst {
        addr,
        word: Some(word),
        text,
        branch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder_with(words: &[(u32, u32)]) -> DspDecoder {
        let mem = MemoryMap::with_local_store(0x40000);
        for &(addr, word) in words {
            assert!(mem.write_u32(addr, word));
        }
        DspDecoder::new(Arc::new(mem))
    }

    #[test]
    fn test_conditional_branch() {
        // brz v3, +8 words
        let word = (0x21 << 24) | (3 << 17) | 0x0008;
        let d = decoder_with(&[(0x100, word)]);

        assert_eq!(
            d.decode_one(0x100).branch,
            BranchInfo::Conditional {
                taken: 0x120,
                fall_through: 0x104
            }
        );
    }

    #[test]
    fn test_absolute_branch() {
        let word = (0x30 << 24) | 0x0400; // bra word-address 0x400
        let d = decoder_with(&[(0x100, word)]);

        assert_eq!(d.decode_one(0x100).branch, BranchInfo::Direct(0x1000));
    }

    #[test]
    fn test_return_is_indirect() {
        let word = 0x36 << 24;
        let d = decoder_with(&[(0x100, word)]);

        let inst = d.decode_one(0x100);
        assert_eq!(inst.branch, BranchInfo::Indirect);
        assert_eq!(inst.text, "ret");
    }

    #[test]
    fn test_address_wraps_in_local_store() {
        // br -4 words from address 0x4, wrapping below zero
        let word = (0x20 << 24) | 0xFFFC;
        let d = decoder_with(&[(0x4, word)]);

        match d.decode_one(0x4).branch {
            BranchInfo::Direct(t) => assert_eq!(t, 0x3FFF4),
            other => panic!("expected direct, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_outside_store_is_unknown() {
        let d = decoder_with(&[]);
        // wrap() keeps every address inside the store, so decode succeeds
        // even for large inputs
        assert!(d.decode_one(0x7FFF8).word.is_some());
        assert_eq!(d.decode_one(0x7FFF8).addr, 0x3FFF8);
    }
}
