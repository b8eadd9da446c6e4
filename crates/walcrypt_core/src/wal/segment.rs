//! Segment addressing and file names.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Timeline identifier.
pub type TimeLineId = u32;

/// Segment number within the log.
pub type SegNo = u64;

/// Length of a segment file name: 24 hex digits.
pub const SEGMENT_NAME_LEN: usize = 24;

/// Identifies the segment a read or write belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentPosition {
    /// Timeline of the segment.
    pub timeline: TimeLineId,
    /// Segment number.
    pub segno: SegNo,
}

impl SegmentPosition {
    /// Creates a new position.
    #[must_use]
    pub const fn new(timeline: TimeLineId, segno: SegNo) -> Self {
        Self { timeline, segno }
    }

    /// Formats the segment file name, `TTTTTTTTXXXXXXXXYYYYYYYY`.
    ///
    /// `segment_size` must be a power of two no larger than 4 GiB.
    ///
    /// # Errors
    ///
    /// Returns an error if the log id `segno / (4 GiB / segment_size)` does
    /// not fit in eight hex digits.
    pub fn file_name(&self, segment_size: u64) -> CoreResult<String> {
        let per_id = segments_per_id(segment_size);
        let log_id = u32::try_from(self.segno / per_id).map_err(|_| {
            CoreError::invalid_format(format!(
                "segment {:#X} has no file name for {segment_size}-byte segments",
                self.segno
            ))
        })?;
        Ok(format!(
            "{:08X}{:08X}{:08X}",
            self.timeline,
            log_id,
            self.segno % per_id
        ))
    }

    /// Parses a segment file name produced by [`file_name`](Self::file_name).
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not 24 hex digits or the low part is
    /// out of range for `segment_size`.
    pub fn parse_file_name(name: &str, segment_size: u64) -> CoreResult<Self> {
        if name.len() != SEGMENT_NAME_LEN || !name.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::invalid_format(format!(
                "not a WAL segment name: {name:?}"
            )));
        }

        let field = |range: std::ops::Range<usize>| {
            u32::from_str_radix(&name[range], 16)
                .map_err(|e| CoreError::invalid_format(format!("bad segment name {name:?}: {e}")))
        };
        let timeline = field(0..8)?;
        let log_id = u64::from(field(8..16)?);
        let seg_id = u64::from(field(16..24)?);

        let per_id = segments_per_id(segment_size);
        if seg_id >= per_id {
            return Err(CoreError::invalid_format(format!(
                "segment {seg_id:#X} out of range in {name:?}"
            )));
        }

        Ok(Self {
            timeline,
            segno: log_id * per_id + seg_id,
        })
    }
}

impl fmt::Display for SegmentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tli {} seg {:X}", self.timeline, self.segno)
    }
}

fn segments_per_id(segment_size: u64) -> u64 {
    (0x1_0000_0000 / segment_size.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEG: u64 = 16 * 1024 * 1024;

    #[test]
    fn file_name_format() {
        assert_eq!(
            SegmentPosition::new(1, 0).file_name(SEG).unwrap(),
            "000000010000000000000000"
        );
        assert_eq!(
            SegmentPosition::new(1, 0x101).file_name(SEG).unwrap(),
            "000000010000000100000001"
        );
        assert_eq!(
            SegmentPosition::new(0xA, 0xFF).file_name(SEG).unwrap(),
            "0000000A00000000000000FF"
        );
    }

    #[test]
    fn parse_roundtrip() {
        // 256 segments per log id: the largest nameable segment is
        // 0xFFFF_FFFF * 256 + 255.
        let last = (u64::from(u32::MAX) << 8) | 0xFF;
        for &(tli, segno) in &[(1u32, 0u64), (2, 255), (7, 256), (9, 1 << 36), (u32::MAX, last)] {
            let pos = SegmentPosition::new(tli, segno);
            let name = pos.file_name(SEG).unwrap();
            assert_eq!(name.len(), SEGMENT_NAME_LEN);
            let parsed = SegmentPosition::parse_file_name(&name, SEG).unwrap();
            assert_eq!(parsed, pos);
        }
    }

    #[test]
    fn file_name_rejects_unnameable_segno() {
        let last = (u64::from(u32::MAX) << 8) | 0xFF;
        assert!(matches!(
            SegmentPosition::new(1, last + 1).file_name(SEG),
            Err(CoreError::InvalidFormat { .. })
        ));
        assert!(SegmentPosition::new(1, u64::MAX).file_name(SEG).is_err());
        // Larger segments leave fewer segments per log id.
        assert!(SegmentPosition::new(1, 1 << 40).file_name(1 << 30).is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(SegmentPosition::parse_file_name("00000001", SEG).is_err());
        assert!(SegmentPosition::parse_file_name("00000001000000000000000G", SEG).is_err());
        assert!(SegmentPosition::parse_file_name("000000010000000000000000.partial", SEG).is_err());
    }

    #[test]
    fn parse_rejects_out_of_range_low_part() {
        // 16 MiB segments allow 256 segments per log id.
        assert!(SegmentPosition::parse_file_name("000000010000000000000100", SEG).is_err());
    }
}
