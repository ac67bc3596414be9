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

//! Breakpoint coordination
//!
//! The single owner of the active breakpoint set. The control thread
//! mutates it; execution-engine dispatch loops read it to decide whether to
//! pause a unit whose pc reaches a listed address. Engine reads are short
//! read-lock sections taken at dispatch, so the control thread never waits
//! on a paused unit; an engine that races a concurrent add/remove may
//! observe the old set for at most one iteration.
//!
//! Every address is masked to 4-byte instruction alignment on entry; all
//! unit kinds share that alignment, so the contract holds regardless of
//! which caller supplied the address.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Set of active breakpoint addresses with per-address enablement
pub struct BreakpointSet {
    inner: RwLock<BTreeMap<u32, bool>>,
    version: AtomicU64,
}

impl BreakpointSet {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
            version: AtomicU64::new(0),
        }
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Add an enabled breakpoint; adding a present address is a no-op.
    /// Returns true if the set changed.
    pub fn add(&self, addr: u32) -> bool {
        let addr = addr & !3;
        let mut inner = self.inner.write().unwrap();
        if inner.contains_key(&addr) {
            return false;
        }
        inner.insert(addr, true);
        drop(inner);
        self.bump();
        log::debug!("breakpoint added at 0x{:08X}", addr);
        true
    }

    /// Remove a breakpoint; removing an absent address is a no-op.
    /// Returns true if the set changed.
    pub fn remove(&self, addr: u32) -> bool {
        let addr = addr & !3;
        let removed = self.inner.write().unwrap().remove(&addr).is_some();
        if removed {
            self.bump();
            log::debug!("breakpoint removed at 0x{:08X}", addr);
        }
        removed
    }

    /// Drop every breakpoint
    pub fn clear_all(&self) {
        let mut inner = self.inner.write().unwrap();
        if !inner.is_empty() {
            inner.clear();
            drop(inner);
            self.bump();
        }
    }

    /// True when an *enabled* breakpoint exists at `addr`; this is the
    /// engine dispatch-loop query
    pub fn contains(&self, addr: u32) -> bool {
        self.inner.read().unwrap().get(&(addr & !3)).copied() == Some(true)
    }

    /// Enable or disable a present address; absent addresses are ignored
    pub fn set_enabled(&self, addr: u32, enabled: bool) {
        let addr = addr & !3;
        let mut inner = self.inner.write().unwrap();
        if let Some(slot) = inner.get_mut(&addr) {
            if *slot != enabled {
                *slot = enabled;
                drop(inner);
                self.bump();
            }
        }
    }

    /// Snapshot of (address, enabled), address-ordered
    pub fn list(&self) -> Vec<(u32, bool)> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .map(|(&a, &e)| (a, e))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    /// Mutation counter; views compare it to skip redundant pushes
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

impl Default for BreakpointSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_idempotent() {
        let set = BreakpointSet::new();

        assert!(set.add(0x1004));
        assert!(!set.add(0x1004));
        assert_eq!(set.len(), 1);

        assert!(set.remove(0x1004));
        assert!(!set.remove(0x1004));
        assert!(set.is_empty());
    }

    #[test]
    fn test_contains_respects_enablement() {
        let set = BreakpointSet::new();
        set.add(0x2000);
        assert!(set.contains(0x2000));

        set.set_enabled(0x2000, false);
        assert!(!set.contains(0x2000));
        assert_eq!(set.list(), vec![(0x2000, false)]);

        set.set_enabled(0x2000, true);
        assert!(set.contains(0x2000));
    }

    #[test]
    fn test_version_advances_only_on_change() {
        let set = BreakpointSet::new();
        let v0 = set.version();

        set.add(0x100);
        let v1 = set.version();
        assert!(v1 > v0);

        set.add(0x100); // no-op
        assert_eq!(set.version(), v1);

        set.clear_all();
        assert!(set.version() > v1);

        set.clear_all(); // already empty
        let v2 = set.version();
        set.remove(0x100); // absent
        assert_eq!(set.version(), v2);
    }

    #[test]
    fn test_addresses_normalize_to_instruction_alignment() {
        let set = BreakpointSet::new();

        assert!(set.add(0x1006));
        assert!(set.contains(0x1004));
        assert!(!set.add(0x1004));
        assert_eq!(set.list(), vec![(0x1004, true)]);

        set.set_enabled(0x1007, false);
        assert!(!set.contains(0x1006));

        assert!(set.remove(0x1005));
        assert!(set.is_empty());
    }

    #[test]
    fn test_list_is_address_ordered() {
        let set = BreakpointSet::new();
        set.add(0x3000);
        set.add(0x1000);
        set.add(0x2000);

        let addrs: Vec<u32> = set.list().iter().map(|&(a, _)| a).collect();
        assert_eq!(addrs, vec![0x1000, 0x2000, 0x3000]);
    }
}
