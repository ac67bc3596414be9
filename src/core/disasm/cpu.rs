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

//! CPU core instruction decoder
//!
//! MIPS-style 32-bit encoding. The debugger needs two things from a
//! decoder: a readable rendering for the instruction list and branch
//! classification for step-over and next-instruction prediction, so this
//! stays far smaller than an interpreter's decoder. Branch targets are
//! rendered as absolute addresses.

use super::{BranchInfo, DecodedInst};
use crate::core::memory::MemoryMap;
use std::sync::Arc;

/// Decode R-type fields: | op (6) | rs (5) | rt (5) | rd (5) | shamt (5) | funct (6) |
#[inline(always)]
fn decode_r_type(instr: u32) -> (u8, u8, u8, u8, u8) {
    let rs = ((instr >> 21) & 0x1F) as u8;
    let rt = ((instr >> 16) & 0x1F) as u8;
    let rd = ((instr >> 11) & 0x1F) as u8;
    let shamt = ((instr >> 6) & 0x1F) as u8;
    let funct = (instr & 0x3F) as u8;
    (rs, rt, rd, shamt, funct)
}

/// Decode I-type fields: | op (6) | rs (5) | rt (5) | immediate (16) |
#[inline(always)]
fn decode_i_type(instr: u32) -> (u8, u8, u16) {
    let rs = ((instr >> 21) & 0x1F) as u8;
    let rt = ((instr >> 16) & 0x1F) as u8;
    let imm = (instr & 0xFFFF) as u16;
    (rs, rt, imm)
}

/// Decode J-type fields: | op (6) | target (26) |
#[inline(always)]
fn decode_j_type(instr: u32) -> u32 {
    instr & 0x03FF_FFFF
}

/// Absolute target of a PC-relative conditional branch
#[inline(always)]
fn rel_target(addr: u32, imm: u16) -> u32 {
    addr.wrapping_add(4)
        .wrapping_add(((imm as i16 as i32) << 2) as u32)
}

/// Absolute target of a J-type jump (within the current 256 MiB segment)
#[inline(always)]
fn jump_target(addr: u32, target: u32) -> u32 {
    (addr & 0xF000_0000) | (target << 2)
}

/// CPU-core decoder bound to one memory map
pub struct CpuDecoder {
    mem: Arc<MemoryMap>,
}

impl CpuDecoder {
    pub fn new(mem: Arc<MemoryMap>) -> Self {
        Self { mem }
    }

    pub fn decode_one(&self, addr: u32) -> DecodedInst {
        let addr = addr & !3;
        match self.mem.read_exec_u32(addr) {
            Some(word) => decode(addr, word),
            None => DecodedInst::unknown(addr),
        }
    }
}

fn decode(addr: u32, word: u32) -> DecodedInst {
    let opcode = word >> 26;
    let fall_through = addr.wrapping_add(4);

    let (text, branch) = match opcode {
        0x00 => decode_special(word),
        0x01 => decode_regimm(addr, word),
        0x02 => {
            let t = jump_target(addr, decode_j_type(word));
            (format!("j 0x{:08X}", t), BranchInfo::Direct(t))
        }
        0x03 => {
            let t = jump_target(addr, decode_j_type(word));
            (format!("jal 0x{:08X}", t), BranchInfo::Direct(t))
        }
        0x04 => {
            let (rs, rt, imm) = decode_i_type(word);
            let t = rel_target(addr, imm);
            (
                format!("beq r{}, r{}, 0x{:08X}", rs, rt, t),
                BranchInfo::Conditional {
                    taken: t,
                    fall_through,
                },
            )
        }
        0x05 => {
            let (rs, rt, imm) = decode_i_type(word);
            let t = rel_target(addr, imm);
            (
                format!("bne r{}, r{}, 0x{:08X}", rs, rt, t),
                BranchInfo::Conditional {
                    taken: t,
                    fall_through,
                },
            )
        }
        0x06 => {
            let (rs, _, imm) = decode_i_type(word);
            let t = rel_target(addr, imm);
            (
                format!("blez r{}, 0x{:08X}", rs, t),
                BranchInfo::Conditional {
                    taken: t,
                    fall_through,
                },
            )
        }
        0x07 => {
            let (rs, _, imm) = decode_i_type(word);
            let t = rel_target(addr, imm);
            (
                format!("bgtz r{}, 0x{:08X}", rs, t),
                BranchInfo::Conditional {
                    taken: t,
                    fall_through,
                },
            )
        }
        0x08 | 0x09 => {
            let (rs, rt, imm) = decode_i_type(word);
            let mn = if opcode == 0x08 { "addi" } else { "addiu" };
            (
                format!("{} r{}, r{}, {}", mn, rt, rs, imm as i16),
                BranchInfo::None,
            )
        }
        0x0C => {
            let (rs, rt, imm) = decode_i_type(word);
            (
                format!("andi r{}, r{}, 0x{:04X}", rt, rs, imm),
                BranchInfo::None,
            )
        }
        0x0D => {
            let (rs, rt, imm) = decode_i_type(word);
            (
                format!("ori r{}, r{}, 0x{:04X}", rt, rs, imm),
                BranchInfo::None,
            )
        }
        0x0F => {
            let (_, rt, imm) = decode_i_type(word);
            (format!("lui r{}, 0x{:04X}", rt, imm), BranchInfo::None)
        }
        0x23 => {
            let (rs, rt, imm) = decode_i_type(word);
            (
                format!("lw r{}, {}(r{})", rt, imm as i16, rs),
                BranchInfo::None,
            )
        }
        0x2B => {
            let (rs, rt, imm) = decode_i_type(word);
            (
                format!("sw r{}, {}(r{})", rt, imm as i16, rs),
                BranchInfo::None,
            )
        }
        _ => (format!(".word 0x{:08X}", word), BranchInfo::None),
    };

    DecodedInst {
        addr,
        word: Some(word),
        text,
        branch,
    }
}

fn decode_special(word: u32) -> (String, BranchInfo) {
    let (rs, rt, rd, shamt, funct) = decode_r_type(word);
    match funct {
        0x00 if word == 0 => ("nop".to_string(), BranchInfo::None),
        0x00 => (
            format!("sll r{}, r{}, {}", rd, rt, shamt),
            BranchInfo::None,
        ),
        0x08 => (format!("jr r{}", rs), BranchInfo::Indirect),
        0x09 => (format!("jalr r{}, r{}", rd, rs), BranchInfo::Indirect),
        0x0C => ("syscall".to_string(), BranchInfo::None),
        0x21 => (
            format!("addu r{}, r{}, r{}", rd, rs, rt),
            BranchInfo::None,
        ),
        0x25 => (format!("or r{}, r{}, r{}", rd, rs, rt), BranchInfo::None),
        _ => (format!(".word 0x{:08X}", word), BranchInfo::None),
    }
}

fn decode_regimm(addr: u32, word: u32) -> (String, BranchInfo) {
    let (rs, rt, imm) = decode_i_type(word);
    let t = rel_target(addr, imm);
    let cond = BranchInfo::Conditional {
        taken: t,
        fall_through: addr.wrapping_add(4),
    };
    match rt {
        0x00 => (format!("bltz r{}, 0x{:08X}", rs, t), cond),
        0x01 => (format!("bgez r{}, 0x{:08X}", rs, t), cond),
        0x10 => (format!("bltzal r{}, 0x{:08X}", rs, t), cond),
        0x11 => (format!("bgezal r{}, 0x{:08X}", rs, t), cond),
        _ => (format!(".word 0x{:08X}", word), BranchInfo::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unit::UnitKind;

    fn decoder_with(words: &[(u32, u32)]) -> CpuDecoder {
        let mem = MemoryMap::with_ram(0x1_0000);
        for &(addr, word) in words {
            assert!(mem.write_u32(addr, word));
        }
        CpuDecoder::new(Arc::new(mem))
    }

    #[test]
    fn test_conditional_branch_targets() {
        // beq r1, r2, +4 words at 0x1000
        let word = (0x04 << 26) | (1 << 21) | (2 << 16) | 0x0004;
        let d = decoder_with(&[(0x1000, word)]);

        let inst = d.decode_one(0x1000);
        assert_eq!(
            inst.branch,
            BranchInfo::Conditional {
                taken: 0x1014,
                fall_through: 0x1004
            }
        );
        assert!(inst.text.starts_with("beq r1, r2"));
    }

    #[test]
    fn test_backward_branch() {
        // bne with negative displacement
        let word = (0x05 << 26) | 0xFFFF; // -1 word
        let d = decoder_with(&[(0x1000, word)]);

        match d.decode_one(0x1000).branch {
            BranchInfo::Conditional { taken, .. } => assert_eq!(taken, 0x1000),
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_direct_jump() {
        let word = (0x02 << 26) | (0x2000 >> 2);
        let d = decoder_with(&[(0x1000, word)]);

        assert_eq!(d.decode_one(0x1000).branch, BranchInfo::Direct(0x2000));
    }

    #[test]
    fn test_indirect_jump_and_return() {
        let jr_ra = (31 << 21) | 0x08;
        let d = decoder_with(&[(0x1000, jr_ra)]);

        let inst = d.decode_one(0x1000);
        assert_eq!(inst.branch, BranchInfo::Indirect);
        assert_eq!(inst.text, "jr r31");
    }

    #[test]
    fn test_plain_instruction_is_fall_through() {
        let d = decoder_with(&[(0x1000, 0)]);
        let inst = d.decode_one(0x1000);
        assert_eq!(inst.branch, BranchInfo::None);
        assert_eq!(inst.text, "nop");
    }

    #[test]
    fn test_unreadable_memory() {
        let d = decoder_with(&[]);
        let inst = d.decode_one(0x0800_0000);
        assert_eq!(inst.word, None);
        assert_eq!(inst.branch, BranchInfo::None);
    }

    #[test]
    fn test_address_normalized_to_alignment() {
        let d = decoder_with(&[(0x1000, 0)]);
        let inst = d.decode_one(0x1002);
        assert_eq!(inst.addr, 0x1000 & UnitKind::Cpu.address_mask());
        assert!(inst.word.is_some());
    }
}
