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

//! Branch target prediction
//!
//! Static, best-effort computation of the instruction address(es) reachable
//! after the one at a given address, without executing it. At most two
//! candidates exist: the fall-through address and a direct branch target.
//! Indirect control flow and unreadable memory yield no candidates.

use crate::core::disasm::{BranchInfo, Decoder};

/// Statically determinable successor addresses of the instruction at `addr`
///
/// Returns zero, one, or two addresses. For a conditional branch the order
/// is `[fall_through, taken]`; callers preferring the taken target use
/// [`preferred_target`].
pub fn predict_targets(decoder: &Decoder, addr: u32) -> Vec<u32> {
    let mask = decoder.kind().address_mask();
    let addr = addr & mask;
    let inst = decoder.decode_one(addr);

    if inst.word.is_none() {
        return Vec::new();
    }

    match inst.branch {
        BranchInfo::None => vec![addr.wrapping_add(4) & mask],
        BranchInfo::Direct(t) => vec![t & mask],
        BranchInfo::Conditional {
            taken,
            fall_through,
        } => {
            let taken = taken & mask;
            let fall_through = fall_through & mask;
            if taken == fall_through {
                vec![taken]
            } else {
                vec![fall_through, taken]
            }
        }
        BranchInfo::Indirect => Vec::new(),
    }
}

/// The single address "show next instruction" should navigate to
///
/// Known branch targets are selected over the fall-through for conditional
/// branches; `None` when the successor is not predictable.
pub fn preferred_target(decoder: &Decoder, addr: u32) -> Option<u32> {
    predict_targets(decoder, addr).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryMap;
    use crate::core::unit::UnitKind;
    use std::sync::Arc;

    fn cpu_decoder(words: &[(u32, u32)]) -> Decoder {
        let mem = MemoryMap::with_ram(0x1_0000);
        for &(addr, word) in words {
            assert!(mem.write_u32(addr, word));
        }
        Decoder::bind(UnitKind::Cpu, Arc::new(mem))
    }

    #[test]
    fn test_conditional_gives_two_distinct_targets() {
        // beq r0, r0, +4 words at 0x1000
        let d = cpu_decoder(&[(0x1000, (0x04 << 26) | 0x0004)]);

        let targets = predict_targets(&d, 0x1000);
        assert_eq!(targets, vec![0x1004, 0x1014]);
        assert_ne!(targets[0], targets[1]);
    }

    #[test]
    fn test_taken_target_preferred() {
        let d = cpu_decoder(&[(0x1000, (0x04 << 26) | 0x0004)]);
        assert_eq!(preferred_target(&d, 0x1000), Some(0x1014));
    }

    #[test]
    fn test_indirect_gives_nothing() {
        // jr r31
        let d = cpu_decoder(&[(0x1000, (31 << 21) | 0x08)]);
        assert!(predict_targets(&d, 0x1000).is_empty());
        assert_eq!(preferred_target(&d, 0x1000), None);
    }

    #[test]
    fn test_plain_instruction_gives_fall_through() {
        let d = cpu_decoder(&[(0x1000, 0)]);
        assert_eq!(predict_targets(&d, 0x1000), vec![0x1004]);
    }

    #[test]
    fn test_direct_jump_gives_single_target() {
        let d = cpu_decoder(&[(0x1000, (0x02 << 26) | (0x2000 >> 2))]);
        assert_eq!(predict_targets(&d, 0x1000), vec![0x2000]);
    }

    #[test]
    fn test_unreadable_memory_gives_nothing() {
        let d = cpu_decoder(&[]);
        assert!(predict_targets(&d, 0x0900_0000).is_empty());
    }

    #[test]
    fn test_command_stream_never_predicts() {
        let mem = Arc::new(MemoryMap::with_ram(0x1000));
        mem.write_u32(0x100, (4 << 18) | 0x1A00);
        let d = Decoder::bind(UnitKind::Gpu, mem);

        assert!(predict_targets(&d, 0x100).is_empty());
    }
}
