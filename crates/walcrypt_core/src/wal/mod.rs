//! WAL page and segment layout.
//!
//! Only the parts of the log format the encryption layer has to touch live
//! here: the page header and its `info` flags, and how segments are named.
//!
//! ## Page Header Format
//!
//! ```text
//! short: | magic (2) | info (2) | timeline (4) | page_addr (8) | rem_len (4) | pad (4) |
//! long:  | short header (24) | system_id (8) | seg_size (4) | page_size (4) |
//! ```
//!
//! All fields are little-endian. The first page of every segment carries the
//! long header; the encryption layer never encrypts those 40 bytes.

mod page;
mod segment;

pub use page::{
    clear_encrypted, is_encrypted, set_encrypted, LongPageHeader, PageHeader, PageInfo,
    LONG_HEADER_SIZE, PAGE_MAGIC, SHORT_HEADER_SIZE,
};
pub use segment::{SegNo, SegmentPosition, TimeLineId, SEGMENT_NAME_LEN};
