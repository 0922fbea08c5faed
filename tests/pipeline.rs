//! End-to-end: bytes on the wire through decoding, layout and lookup.

use memmosaic::flags::PageFlags;
use memmosaic::layout::RowEntry;
use memmosaic::protocol::encode_frame;
use memmosaic::{
    GridPos, MappedRegion, Mosaic, MosaicConfig, QueryError, StreamDecoder, TileBuffer, TileColor,
    compute_layout, printable_page_flags,
};

const PAGE: u64 = 0x1000;
const PRESENT: u32 = PageFlags::PRESENT.bits();

fn config(columns: u32) -> MosaicConfig {
    MosaicConfig {
        page_size: PAGE,
        columns_per_row: columns,
        max_gap_pages: 64,
        separator_rows: 2,
        ..Default::default()
    }
}

fn region(start: u64, use_counts: &[u32], flags: &[u32], name: &str) -> MappedRegion {
    assert_eq!(use_counts.len(), flags.len());
    MappedRegion {
        start,
        end: start + use_counts.len() as u64 * PAGE,
        backing_file: name.to_string(),
        use_counts: use_counts.to_vec(),
        combined_flags: flags.to_vec(),
    }
}

#[test]
fn private_and_shared_pages() {
    let regions = vec![region(0x1000, &[1, 2], &[PRESENT, PRESENT], "")];
    let mut mosaic = Mosaic::new(config(512)).unwrap();
    assert!(mosaic.feed(&encode_frame(&regions)).unwrap());

    let colors: Vec<_> = mosaic.layout().tiles().iter().map(|t| t.color).collect();
    assert_eq!(colors, vec![TileColor::Private, TileColor::Shared]);
}

#[test]
fn distant_regions_get_a_separator() {
    let regions = vec![
        region(0x0, &[1], &[PRESENT], ""),
        region(0x1000 + 100 * PAGE, &[1], &[PRESENT], ""),
    ];
    let layout = compute_layout(&regions, &config(512)).unwrap();

    assert_eq!(layout.large_regions().len(), 2);
    assert_eq!(layout.rows(), 1 + 2 + 1);
    assert_eq!(layout.count(TileColor::Separator), 2 * 512);
    assert_eq!(
        layout.row_index().entries(),
        &[
            RowEntry { first_row: 0, base: 0x0, end: 0x1000 },
            RowEntry { first_row: 3, base: 0x1000 + 100 * PAGE, end: 0x1000 + 101 * PAGE },
        ]
    );
}

#[test]
fn partial_frames_never_parse_early() {
    let bytes = encode_frame(&[region(0x4000, &[1, 1, 1], &[PRESENT; 3], "/tmp/x")]);
    let mut decoder = StreamDecoder::new(PAGE, 1 << 20);

    for chunk in bytes[..bytes.len() - 1].chunks(7) {
        assert!(!decoder.add_chunk(chunk).unwrap());
        assert!(decoder.regions().is_empty());
    }
    assert!(decoder.add_chunk(&bytes[bytes.len() - 1..]).unwrap());
    assert_eq!(decoder.regions()[0].backing_file, "/tmp/x");
}

#[test]
fn classification_covers_every_rule() {
    let flags = [
        0,                                                 // not present
        PRESENT | PageFlags::MMAP.bits(),                  // file, shared
        PRESENT | PageFlags::MMAP.bits(),                  // file
        PRESENT | PageFlags::THP.bits(),                   // huge page
        PRESENT,                                           // private
        PRESENT,                                           // shared
        PRESENT | PageFlags::NOPAGE.bits(),                // anomalous
        PRESENT,                                           // unclassified
    ];
    let use_counts = [1, 2, 1, 0, 1, 3, 0, 0];
    let regions = vec![region(0x10000, &use_counts, &flags, "")];
    let layout = compute_layout(&regions, &config(8)).unwrap();

    let colors: Vec<_> = layout.tiles().iter().map(|t| t.color).collect();
    assert_eq!(
        colors,
        vec![
            TileColor::NotPresent,
            TileColor::HighReuse,
            TileColor::FileBacked,
            TileColor::HugePage,
            TileColor::Private,
            TileColor::Shared,
            TileColor::Anomalous,
            TileColor::Unclassified,
        ]
    );
}

#[test]
fn gap_tiles_resolve_to_unmapped_addresses() {
    let regions = vec![
        region(0x20000, &[1, 1], &[PRESENT; 2], "a"),
        region(0x24000, &[2], &[PRESENT], "b"),
    ];
    let mut mosaic = Mosaic::new(config(4)).unwrap();
    mosaic.update_regions(regions).unwrap();

    let buffer = TileBuffer::from_layout(mosaic.layout());
    assert_eq!(buffer.get(0, 2), Some(TileColor::Gap));
    assert_eq!(buffer.get(0, 3), Some(TileColor::Gap));
    assert_eq!(buffer.get(1, 0), Some(TileColor::Shared));
    assert_eq!(buffer.get(1, 1), None);

    assert_eq!(mosaic.address_from_position(0, 2), Ok(0x22000));
    assert_eq!(mosaic.page_at_position(0, 2), Err(QueryError::NotMapped(0x22000)));
    assert_eq!(mosaic.page_at_position(1, 0).unwrap().backing_file, "b");
    assert_eq!(mosaic.page_at_position(1, 1), Err(QueryError::OutOfRange));
    assert_eq!(mosaic.position_from_address(0x22800), Ok(GridPos::new(0, 2)));
}

#[test]
fn frames_replace_each_other() {
    let first = encode_frame(&[region(0x1000, &[1], &[PRESENT], "first")]);
    let second = encode_frame(&[
        region(0x8000, &[2, 2], &[PRESENT; 2], "second"),
        region(0xa000, &[1], &[PRESENT], "third"),
    ]);

    let mut mosaic = Mosaic::new(config(16)).unwrap();
    assert!(mosaic.feed(&first).unwrap());
    assert_eq!(mosaic.layout().tiles().len(), 1);
    assert!(mosaic.feed(&second).unwrap());
    assert_eq!(mosaic.regions().len(), 2);
    assert_eq!(mosaic.layout().tiles().len(), 3);
    assert_eq!(mosaic.flags_at_address(0x1000), Err(QueryError::NotMapped(0x1000)));
}

#[test]
fn page_info_flags_render() {
    let flags = PRESENT | (PageFlags::ANON | PageFlags::DIRTY).bits();
    let regions = vec![region(0x7000, &[1], &[flags], "[heap]")];
    let mut mosaic = Mosaic::new(config(512)).unwrap();
    mosaic.update_regions(regions).unwrap();

    let info = mosaic.page_at_position(0, 0).unwrap();
    assert_eq!(printable_page_flags(info.flags), "DIRTY, ANON, PRESENT");
    assert_eq!(info.backing_file, "[heap]");
}
