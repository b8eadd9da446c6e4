//! Property-based test generators using proptest.
//!
//! Provides strategies for generating segment positions and page batches
//! shaped like real WAL writes.

use crate::fixtures::{body_pages, first_pages, TEST_PAGE_SIZE};
use proptest::prelude::*;
use walcrypt_core::SegmentPosition;

/// Strategy for timelines; timeline 0 is never used by a real log.
pub fn timeline_strategy() -> impl Strategy<Value = u32> {
    1u32..=u32::MAX
}

/// Strategy for segment positions.
pub fn position_strategy() -> impl Strategy<Value = SegmentPosition> {
    (timeline_strategy(), any::<u64>()).prop_map(|(tli, segno)| SegmentPosition::new(tli, segno))
}

/// A batch of pages to write at a page-aligned offset.
#[derive(Debug, Clone)]
pub struct PageBatch {
    /// Offset of the first page in the segment.
    pub offset: u64,
    /// Page bytes; starts with a long header when `offset` is zero.
    pub data: Vec<u8>,
}

/// Strategy for page batches of up to `max_pages` pages within the first
/// `segment_pages` pages of a segment.
///
/// Batches at offset zero carry a long header with a random body; later
/// batches are random bytes throughout.
pub fn page_batch_strategy(
    max_pages: usize,
    segment_pages: usize,
) -> impl Strategy<Value = PageBatch> {
    (0..segment_pages, 1..=max_pages, any::<u64>(), 1u32..1000).prop_map(
        move |(start, count, seed, timeline)| {
            let count = count.min(segment_pages - start).max(1);
            let data = if start == 0 {
                let mut pages = first_pages(TEST_PAGE_SIZE, count, timeline);
                let body = body_pages(TEST_PAGE_SIZE, count, seed);
                pages[64..].copy_from_slice(&body[64..]);
                pages
            } else {
                body_pages(TEST_PAGE_SIZE, count, seed)
            };

            PageBatch {
                offset: (start * TEST_PAGE_SIZE) as u64,
                data,
            }
        },
    )
}
