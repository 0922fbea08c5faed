//! Kernel page flags.
//!
//! Bits 0-22 are the `KPF_*` flags from `/proc/kpageflags`, stable user-space
//! API documented in the kernel's pagemap documentation. The producer relocates
//! the interesting `/proc/<pid>/pagemap` bits into the unused top of the word:
//! 55 -> 28, 61 -> 29, 62 -> 30, 63 -> 31.

use tracing::warn;

bitflags::bitflags! {
    /// Combined per-page flag word as sent on the wire.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u32 {
        const LOCKED        = 1 << 0;
        const ERROR         = 1 << 1;
        const REFERENCED    = 1 << 2;
        const UPTODATE      = 1 << 3;
        const DIRTY         = 1 << 4;
        const LRU           = 1 << 5;
        const ACTIVE        = 1 << 6;
        const SLAB          = 1 << 7;
        const WRITEBACK     = 1 << 8;
        const RECLAIM       = 1 << 9;
        const BUDDY         = 1 << 10;
        const MMAP          = 1 << 11;
        const ANON          = 1 << 12;
        const SWAPCACHE     = 1 << 13;
        const SWAPBACKED    = 1 << 14;
        const COMPOUND_HEAD = 1 << 15;
        const COMPOUND_TAIL = 1 << 16;
        const HUGE          = 1 << 17;
        const UNEVICTABLE   = 1 << 18;
        const HWPOISON      = 1 << 19;
        const NOPAGE        = 1 << 20;
        const KSM           = 1 << 21;
        const THP           = 1 << 22;
        // pagemap bits, relocated
        const SOFT_DIRTY    = 1 << 28;
        const FILE_PAGE     = 1 << 29;
        const SWAPPED       = 1 << 30;
        const PRESENT       = 1 << 31;
    }
}

pub const PAGE_FLAG_COUNT: usize = 32;

/// Bit position -> display name. `None` marks an unused bit.
pub const PAGE_FLAG_NAMES: [Option<&str>; PAGE_FLAG_COUNT] = [
    Some("LOCKED"),
    Some("ERROR"),
    Some("REFERENCED"),
    Some("UPTODATE"),
    Some("DIRTY"),
    Some("LRU"),
    Some("ACTIVE"),
    Some("SLAB"),
    Some("WRITEBACK"),
    Some("RECLAIM"),
    Some("BUDDY"),
    Some("MMAP"),
    Some("ANON"),
    Some("SWAPCACHE"),
    Some("SWAPBACKED"),
    Some("COMPOUND_HEAD"),
    Some("COMPOUND_TAIL"),
    Some("HUGE"),
    Some("UNEVICTABLE"),
    Some("HWPOISON"),
    Some("NOPAGE"),
    Some("KSM"),
    Some("THP"),
    None,
    None,
    None,
    None,
    None,
    Some("SOFT_DIRTY"),
    Some("FILE_PAGE / SHARE_ANON"),
    Some("SWAPPED"),
    Some("PRESENT"),
];

/// Name of a single bit, or `"unused"`.
pub fn flag_name(bit: usize) -> &'static str {
    PAGE_FLAG_NAMES
        .get(bit)
        .copied()
        .flatten()
        .unwrap_or("unused")
}

/// Render a flag word as a comma-joined list of its set, named flags.
///
/// Set bits without a name are data inconsistencies: they are left out of
/// the string and reported through `tracing`.
pub fn printable_page_flags(flags: u32) -> String {
    let mut names: Vec<&str> = Vec::new();
    for bit in 0..PAGE_FLAG_COUNT {
        if flags & (1 << bit) == 0 {
            continue;
        }
        match PAGE_FLAG_NAMES[bit] {
            Some(name) => names.push(name),
            None => warn!(bit, "unnamed page flag set in {:#010x}", flags),
        }
    }
    names.join(", ")
}

impl PageFlags {
    /// Build from a raw wire word, keeping bits that have no named constant.
    #[inline]
    pub const fn from_wire(word: u32) -> Self {
        Self::from_bits_retain(word)
    }

    #[inline]
    pub fn is_present(self) -> bool {
        self.contains(PageFlags::PRESENT)
    }

    /// File-backed mapping: MMAP set and ANON clear.
    #[inline]
    pub fn is_file_mapped(self) -> bool {
        self.contains(PageFlags::MMAP) && !self.contains(PageFlags::ANON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_bitflags() {
        for (name, flag) in PageFlags::all().iter_names() {
            let bit = flag.bits().trailing_zeros() as usize;
            let table = PAGE_FLAG_NAMES[bit].unwrap();
            // The shared-anon bit is named after both of its meanings.
            if name == "FILE_PAGE" {
                assert_eq!(table, "FILE_PAGE / SHARE_ANON");
            } else {
                assert_eq!(table, name);
            }
        }
    }

    #[test]
    fn test_printable_page_flags() {
        let flags = (PageFlags::PRESENT | PageFlags::ANON | PageFlags::LRU).bits();
        assert_eq!(printable_page_flags(flags), "LRU, ANON, PRESENT");
        assert_eq!(printable_page_flags(0), "");
    }

    #[test]
    fn test_printable_skips_unnamed_bits() {
        let flags = (1 << 23) | (1 << 27) | PageFlags::THP.bits();
        assert_eq!(printable_page_flags(flags), "THP");
    }

    #[test]
    fn test_flag_name() {
        assert_eq!(flag_name(0), "LOCKED");
        assert_eq!(flag_name(25), "unused");
        assert_eq!(flag_name(31), "PRESENT");
        assert_eq!(flag_name(40), "unused");
    }

    #[test]
    fn test_file_mapped() {
        assert!(PageFlags::MMAP.is_file_mapped());
        assert!(!(PageFlags::MMAP | PageFlags::ANON).is_file_mapped());
        assert!(!PageFlags::ANON.is_file_mapped());
        assert!(PageFlags::from_wire(1 << 31).is_present());
    }
}
