//! The associative memories ("word associative memories") which
//! cache segment descriptor words (SDWAM) and page table words
//! (PTWAM).
//!
//! Each is fully associative.  Every entry has a full/empty bit and a
//! usage count; the usage counts of the entries are always a
//! permutation of `0..N`.  On a hit, every count greater than the hit
//! entry's is decremented and the hit entry's count becomes `N-1`.
//! A new entry replaces the one whose count is zero, which is
//! therefore the least recently used.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use tracing::{Level, event};

use base::prelude::*;

use crate::descriptor::{Ptw, Sdw};

/// Processor model, which determines the size of the associative
/// memories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum WamModel {
    /// Level 68: 16 entries.
    L68,
    /// DPS-8/M: 64 entries.
    #[default]
    Dps8m,
}

impl WamModel {
    pub const fn entries(&self) -> usize {
        match self {
            WamModel::L68 => 16,
            WamModel::Dps8m => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WamEntry<K, T> {
    pub full: bool,
    pub usage: usize,
    pub key: K,
    pub value: T,
}

#[derive(Debug, Clone)]
pub struct AssociativeMemory<K, T> {
    entries: Vec<WamEntry<K, T>>,
    enabled: bool,
    /// Index of the entry which satisfied the most recent lookup.
    last_match: Option<usize>,
}

impl<K, T> AssociativeMemory<K, T>
where
    K: Copy + Default + PartialEq,
    T: Copy + Default,
{
    pub fn new(size: usize) -> AssociativeMemory<K, T> {
        AssociativeMemory {
            entries: (0..size)
                .map(|usage| WamEntry {
                    full: false,
                    usage,
                    key: K::default(),
                    value: T::default(),
                })
                .collect(),
            enabled: true,
            last_match: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| !e.full)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Mark every entry empty and reset the usage counts.
    pub fn clear(&mut self) {
        for (usage, entry) in self.entries.iter_mut().enumerate() {
            entry.full = false;
            entry.usage = usage;
        }
        self.last_match = None;
    }

    pub fn last_match(&self) -> Option<usize> {
        self.last_match
    }

    pub fn entries(&self) -> &[WamEntry<K, T>] {
        &self.entries
    }

    fn promote(&mut self, pos: usize) {
        let hit_usage = self.entries[pos].usage;
        for entry in self.entries.iter_mut() {
            if entry.usage > hit_usage {
                entry.usage -= 1;
            }
        }
        self.entries[pos].usage = self.entries.len() - 1;
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.entries.iter().position(|e| e.full && e.key == *key)
    }

    /// Look up `key`, updating the usage counts on a hit.
    pub fn lookup(&mut self, key: &K) -> Option<T> {
        if !self.enabled {
            return None;
        }
        match self.position(key) {
            Some(pos) => {
                self.promote(pos);
                self.last_match = Some(pos);
                Some(self.entries[pos].value)
            }
            None => {
                self.last_match = None;
                None
            }
        }
    }

    /// Place a new entry in the least recently used slot.
    pub fn load(&mut self, key: K, value: T) {
        if !self.enabled {
            return;
        }
        // A memory with no entries holds nothing.
        let Some(victim) = self.entries.iter().position(|e| e.usage == 0) else {
            return;
        };
        let entry = &mut self.entries[victim];
        entry.full = true;
        entry.key = key;
        entry.value = value;
        self.promote(victim);
        self.last_match = Some(victim);
    }

    /// Change the cached value for `key`, if there is one, without
    /// affecting the usage counts.
    pub fn update<F: FnOnce(&mut T)>(&mut self, key: &K, f: F) -> bool {
        match self.position(key) {
            Some(pos) => {
                f(&mut self.entries[pos].value);
                true
            }
            None => false,
        }
    }
}

/// PTWAM entries are identified by segment number and page number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PtwamKey {
    pub pointer: Unsigned15Bit,
    pub pageno: Unsigned12Bit,
}

impl PtwamKey {
    pub fn new(pointer: Unsigned15Bit, ca: Unsigned18Bit) -> PtwamKey {
        PtwamKey {
            pointer,
            pageno: Unsigned12Bit::truncating_from_u64(u64::from((ca >> 6) & 0o7760_u32)),
        }
    }
}

/// Access to the associative memories, as used by the appending
/// unit.  When `nomatch` is set, the appending unit does not consult
/// the associative memory and nothing is loaded into it.
pub trait DescriptorCache {
    fn fetch_sdw_from_sdwam(&mut self, segno: Unsigned15Bit) -> Option<Sdw>;

    fn load_sdwam(&mut self, segno: Unsigned15Bit, sdw: &Sdw, nomatch: bool);

    fn fetch_ptw_from_ptwam(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit) -> Option<Ptw>;

    fn load_ptwam(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit, ptw: &Ptw, nomatch: bool);

    /// The page at `pointer`, `ca` has just been marked modified in
    /// main memory.
    fn note_ptw_modified(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit);

    fn clear_associative_memory(&mut self);
}

/// The SDWAM and PTWAM of one processor.
#[derive(Debug, Clone)]
pub struct Wam {
    pub sdwam: AssociativeMemory<Unsigned15Bit, Sdw>,
    pub ptwam: AssociativeMemory<PtwamKey, Ptw>,
}

impl Wam {
    pub fn new(model: WamModel) -> Wam {
        Wam {
            sdwam: AssociativeMemory::new(model.entries()),
            ptwam: AssociativeMemory::new(model.entries()),
        }
    }

    /// The full SDWAM entries, for diagnostic display.
    pub fn dump_sdwam(&self) -> Vec<SdwamDumpEntry> {
        self.sdwam
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.full)
            .map(|(n, e)| SdwamDumpEntry {
                n,
                usage: e.usage,
                sdw: e.value,
            })
            .collect()
    }
}

impl Default for Wam {
    fn default() -> Wam {
        Wam::new(WamModel::default())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SdwamDumpEntry {
    pub n: usize,
    pub usage: usize,
    pub sdw: Sdw,
}

impl Display for SdwamDumpEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SDWAM n:{} {} USE={}", self.n, self.sdw, self.usage)
    }
}

impl DescriptorCache for Wam {
    fn fetch_sdw_from_sdwam(&mut self, segno: Unsigned15Bit) -> Option<Sdw> {
        let result = self.sdwam.lookup(&segno);
        match (&result, self.sdwam.last_match()) {
            (Some(sdw), Some(n)) => {
                event!(Level::TRACE, "SDWAM[{n}] hit for segment {segno:05o}: {sdw}");
            }
            _ => {
                event!(Level::TRACE, "SDW for segment {segno:05o} not in SDWAM");
            }
        }
        result
    }

    fn load_sdwam(&mut self, segno: Unsigned15Bit, sdw: &Sdw, nomatch: bool) {
        if nomatch {
            return;
        }
        self.sdwam.load(segno, *sdw);
        event!(Level::TRACE, "loaded SDWAM for segment {segno:05o}: {sdw}");
    }

    fn fetch_ptw_from_ptwam(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit) -> Option<Ptw> {
        let key = PtwamKey::new(pointer, ca);
        let result = self.ptwam.lookup(&key);
        if let Some(ptw) = &result {
            event!(
                Level::TRACE,
                "PTWAM hit for segment {pointer:05o} page {:04o}: {ptw}",
                key.pageno
            );
        }
        result
    }

    fn load_ptwam(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit, ptw: &Ptw, nomatch: bool) {
        if nomatch {
            return;
        }
        self.ptwam.load(PtwamKey::new(pointer, ca), *ptw);
    }

    fn note_ptw_modified(&mut self, pointer: Unsigned15Bit, ca: Unsigned18Bit) {
        self.ptwam.update(&PtwamKey::new(pointer, ca), |ptw| ptw.m = true);
    }

    fn clear_associative_memory(&mut self) {
        event!(Level::DEBUG, "clearing SDWAM and PTWAM");
        if self.sdwam.is_enabled() {
            self.sdwam.clear();
        }
        if self.ptwam.is_enabled() {
            self.ptwam.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usages<K, T>(am: &AssociativeMemory<K, T>) -> Vec<usize>
    where
        K: Copy + Default + PartialEq,
        T: Copy + Default,
    {
        am.entries().iter().map(|e| e.usage).collect()
    }

    #[test]
    fn test_lru_replacement() {
        let mut am: AssociativeMemory<u32, u32> = AssociativeMemory::new(4);
        for k in 1..=4 {
            am.load(k, k * 10);
        }
        assert_eq!(am.lookup(&1), Some(10));
        // 2 is now the least recently used entry, so it is replaced.
        am.load(5, 50);
        assert_eq!(am.lookup(&2), None);
        assert_eq!(am.lookup(&1), Some(10));
        assert_eq!(am.lookup(&3), Some(30));
        assert_eq!(am.lookup(&5), Some(50));
    }

    #[test]
    fn test_usage_counts_stay_a_permutation() {
        let mut am: AssociativeMemory<u32, u32> = AssociativeMemory::new(16);
        for k in 0..40 {
            am.load(k % 23, k);
            am.lookup(&(k % 7));
            let mut u = usages(&am);
            u.sort_unstable();
            assert_eq!(u, (0..16).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_hit_becomes_most_recent() {
        let mut am: AssociativeMemory<u32, u32> = AssociativeMemory::new(4);
        am.load(7, 70);
        am.load(8, 80);
        am.lookup(&7);
        assert_eq!(am.last_match(), Some(0));
        assert_eq!(am.entries()[0].usage, 3);
        assert_eq!(am.entries()[1].usage, 2);
    }

    #[test]
    fn test_zero_sized_memory() {
        let mut am: AssociativeMemory<u32, u32> = AssociativeMemory::new(0);
        am.load(1, 10);
        assert!(am.is_empty());
        assert_eq!(am.lookup(&1), None);
        assert_eq!(am.last_match(), None);
    }

    #[test]
    fn test_clear() {
        let mut am: AssociativeMemory<u32, u32> = AssociativeMemory::new(4);
        am.load(1, 1);
        assert!(!am.is_empty());
        am.clear();
        assert!(am.is_empty());
        assert_eq!(am.lookup(&1), None);
        assert_eq!(usages(&am), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_disabled_memory_never_matches() {
        let mut am: AssociativeMemory<u32, u32> = AssociativeMemory::new(4);
        am.load(1, 1);
        am.set_enabled(false);
        assert_eq!(am.lookup(&1), None);
        am.load(2, 2);
        am.set_enabled(true);
        assert_eq!(am.lookup(&2), None);
        assert_eq!(am.lookup(&1), Some(1));
    }

    #[test]
    fn test_ptwam_key_page_number() {
        // Offsets within the same 1024-word page share a key.
        assert_eq!(
            PtwamKey::new(u15!(3), u18!(0o2000)),
            PtwamKey::new(u15!(3), u18!(0o3777))
        );
        assert_ne!(
            PtwamKey::new(u15!(3), u18!(0o1777)),
            PtwamKey::new(u15!(3), u18!(0o2000))
        );
        assert_eq!(PtwamKey::new(u15!(3), u18!(0o2000)).pageno, u12!(0o20));
    }

    #[test]
    fn test_nomatch_does_not_load() {
        let mut wam = Wam::new(WamModel::L68);
        let sdw = Sdw::default();
        wam.load_sdwam(u15!(1), &sdw, true);
        assert!(wam.fetch_sdw_from_sdwam(u15!(1)).is_none());
        wam.load_sdwam(u15!(1), &sdw, false);
        assert!(wam.fetch_sdw_from_sdwam(u15!(1)).is_some());
        assert_eq!(wam.dump_sdwam().len(), 1);
    }

    #[test]
    fn test_note_ptw_modified_updates_cached_copy() {
        let mut wam = Wam::new(WamModel::L68);
        let ptw = Ptw {
            df: true,
            ..Ptw::default()
        };
        wam.load_ptwam(u15!(2), u18!(0o100), &ptw, false);
        wam.note_ptw_modified(u15!(2), u18!(0o200));
        let cached = wam.fetch_ptw_from_ptwam(u15!(2), u18!(0o1777));
        assert_eq!(cached.map(|p| p.m), Some(true));
    }
}
