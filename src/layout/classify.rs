//! Per-page tile classification.

use crate::flags::PageFlags;
use crate::types::TileColor;

/// Pick the color for one page. The first matching rule wins:
///
/// 1. not present -> [`TileColor::NotPresent`]
/// 2. file-backed mmap -> [`TileColor::HighReuse`] if used more than once, else [`TileColor::FileBacked`]
/// 3. THP -> [`TileColor::HugePage`] (the kernel reports use count 0 here, so it is not consulted)
/// 4. use count 1 -> [`TileColor::Private`]
/// 5. use count > 1 -> [`TileColor::Shared`]
/// 6. NOPAGE -> [`TileColor::Anomalous`]
/// 7. otherwise [`TileColor::Unclassified`]
pub fn classify_page(flags: u32, use_count: u32) -> TileColor {
    let flags = PageFlags::from_wire(flags);

    if !flags.is_present() {
        TileColor::NotPresent
    } else if flags.is_file_mapped() {
        if use_count > 1 {
            TileColor::HighReuse
        } else {
            TileColor::FileBacked
        }
    } else if flags.contains(PageFlags::THP) {
        TileColor::HugePage
    } else if use_count == 1 {
        TileColor::Private
    } else if use_count > 1 {
        TileColor::Shared
    } else if flags.contains(PageFlags::NOPAGE) {
        TileColor::Anomalous
    } else {
        TileColor::Unclassified
    }
}
