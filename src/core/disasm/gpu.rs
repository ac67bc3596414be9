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

//! GPU command-stream decoder
//!
//! The command processor does not execute instructions; it consumes a FIFO
//! of method headers and arguments from main memory:
//!
//! ```text
//! | flags (2) | count (11) | method (18) | , then `count` argument words
//! ```
//!
//! Control transfers in the stream (get-pointer jumps) are driven by FIFO
//! state, not statically decodable, so nothing here reports a predictable
//! successor.

use super::{BranchInfo, DecodedInst};
use crate::core::memory::MemoryMap;
use std::sync::Arc;

const FLAG_JUMP: u32 = 0x2000_0000;
const FLAG_RETURN: u32 = 0x0002_0000;

/// Command-processor decoder over the FIFO's backing memory
pub struct GpuDecoder {
    mem: Arc<MemoryMap>,
}

impl GpuDecoder {
    pub fn new(mem: Arc<MemoryMap>) -> Self {
        Self { mem }
    }

    pub fn decode_one(&self, addr: u32) -> DecodedInst {
        let addr = addr & !3;
        let word = match self.mem.read_u32(addr) {
            Some(w) => w,
            None => return DecodedInst::unknown(addr),
        };

        let text = if word & FLAG_JUMP != 0 {
            format!("jump 0x{:08X}", word & !FLAG_JUMP & !3)
        } else if word & FLAG_RETURN != 0 {
            "return".to_string()
        } else if word == 0 {
            "nop".to_string()
        } else {
            let count = (word >> 18) & 0x7FF;
            let method = word & 0x3FFFF;
            format!("method 0x{:05X} count {}", method, count)
        };

        DecodedInst {
            addr,
            word: Some(word),
            text,
            // FIFO flow is driven by get/put state, never static
            branch: BranchInfo::Indirect,
        }
    }
}
