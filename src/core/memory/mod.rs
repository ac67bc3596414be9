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

//! Virtual-memory view used by the debugger
//!
//! A minimal region map over the emulator's address space. The debugger
//! only ever reads instruction words from it; reads outside mapped or
//! executable ranges return `None` instead of faulting, so decoding and
//! branch prediction degrade to "unknown" rather than erroring.

use std::sync::RwLock;

/// One mapped address range
struct Region {
    start: u32,
    executable: bool,
    data: RwLock<Vec<u8>>,
}

/// Region map over an address space
///
/// Shared between the emulator (writer) and the debugger (reader); all
/// access goes through short interior lock sections.
pub struct MemoryMap {
    regions: Vec<Region>,
}

impl MemoryMap {
    /// An empty map; nothing is readable
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// A map with one executable RAM region starting at 0
    pub fn with_ram(size: u32) -> Self {
        Self::new().map_region(0, size, true)
    }

    /// A DSP local store: one executable region covering the whole store
    pub fn with_local_store(size: u32) -> Self {
        Self::new().map_region(0, size, true)
    }

    /// Add a region (builder style)
    pub fn map_region(mut self, start: u32, size: u32, executable: bool) -> Self {
        self.regions.push(Region {
            start,
            executable,
            data: RwLock::new(vec![0u8; size as usize]),
        });
        self
    }

    fn locate(&self, addr: u32, len: u32) -> Option<(&Region, usize)> {
        self.regions.iter().find_map(|r| {
            let size = r.data.read().unwrap().len() as u32;
            let end = r.start.checked_add(size)?;
            if addr >= r.start && addr.checked_add(len)? <= end {
                Some((r, (addr - r.start) as usize))
            } else {
                None
            }
        })
    }

    /// Read a 32-bit word; `None` outside mapped ranges or unaligned
    pub fn read_u32(&self, addr: u32) -> Option<u32> {
        if addr & 3 != 0 {
            return None;
        }
        let (region, off) = self.locate(addr, 4)?;
        let data = region.data.read().unwrap();
        Some(u32::from_le_bytes([
            data[off],
            data[off + 1],
            data[off + 2],
            data[off + 3],
        ]))
    }

    /// Read a 32-bit word from executable memory only
    ///
    /// This is the instruction-fetch path used by decoding and prediction.
    pub fn read_exec_u32(&self, addr: u32) -> Option<u32> {
        if addr & 3 != 0 {
            return None;
        }
        let (region, _) = self.locate(addr, 4)?;
        if !region.executable {
            return None;
        }
        self.read_u32(addr)
    }

    /// Write a 32-bit word; false outside mapped ranges or unaligned
    pub fn write_u32(&self, addr: u32, value: u32) -> bool {
        if addr & 3 != 0 {
            return false;
        }
        match self.locate(addr, 4) {
            Some((region, off)) => {
                let mut data = region.data.write().unwrap();
                data[off..off + 4].copy_from_slice(&value.to_le_bytes());
                true
            }
            None => false,
        }
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_round_trip() {
        let mem = MemoryMap::with_ram(0x1000);

        assert!(mem.write_u32(0x10, 0xDEAD_BEEF));
        assert_eq!(mem.read_u32(0x10), Some(0xDEAD_BEEF));
    }

    #[test]
    fn test_unmapped_reads_are_none() {
        let mem = MemoryMap::with_ram(0x1000);

        assert_eq!(mem.read_u32(0x2000), None);
        assert_eq!(mem.read_u32(0x0FFE), None); // straddles the end
    }

    #[test]
    fn test_unaligned_reads_are_none() {
        let mem = MemoryMap::with_ram(0x1000);
        assert_eq!(mem.read_u32(0x11), None);
        assert!(!mem.write_u32(0x12, 1));
    }

    #[test]
    fn test_non_executable_region_blocks_fetch() {
        let mem = MemoryMap::new()
            .map_region(0, 0x1000, true)
            .map_region(0x8000, 0x1000, false);

        assert!(mem.write_u32(0x8000, 0x1234_5678));
        assert_eq!(mem.read_u32(0x8000), Some(0x1234_5678));
        assert_eq!(mem.read_exec_u32(0x8000), None);
        assert_eq!(mem.read_exec_u32(0x0), Some(0));
    }
}
