//! Page header layout and the in-place `info` flag helpers.

use crate::error::{CoreError, CoreResult};

/// Magic number stored in every page header.
pub const PAGE_MAGIC: u16 = 0xD116;
/// Size of the short page header.
pub const SHORT_HEADER_SIZE: usize = 24;
/// Size of the long page header that starts each segment.
pub const LONG_HEADER_SIZE: usize = 40;

const INFO_OFFSET: usize = 2;

/// Bits of the page header `info` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo(pub u16);

impl PageInfo {
    /// The first record on the page continues from the previous page.
    pub const FIRST_IS_CONTRECORD: u16 = 0x0001;
    /// The page carries a long header.
    pub const LONG_HEADER: u16 = 0x0002;
    /// Backup blocks on this page may be removed.
    pub const BKP_REMOVABLE: u16 = 0x0004;
    /// The first record overwrites an aborted continuation record.
    pub const FIRST_IS_OVERWRITE_CONTRECORD: u16 = 0x0008;
    /// The page body is ciphertext.
    pub const ENCRYPTED: u16 = 0x0010;

    /// Returns true if every bit of `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }
}

fn info_bytes(page: &[u8]) -> Option<u16> {
    page.get(INFO_OFFSET..INFO_OFFSET + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn store_info(page: &mut [u8], info: u16) {
    if let Some(b) = page.get_mut(INFO_OFFSET..INFO_OFFSET + 2) {
        b.copy_from_slice(&info.to_le_bytes());
    }
}

/// Returns true if the header at the start of `page` has the encrypted flag.
///
/// A slice too short to hold the `info` field is reported as unencrypted.
#[must_use]
pub fn is_encrypted(page: &[u8]) -> bool {
    info_bytes(page).is_some_and(|info| PageInfo(info).contains(PageInfo::ENCRYPTED))
}

/// Sets the encrypted flag in the header at the start of `page`, in place.
pub fn set_encrypted(page: &mut [u8]) {
    if let Some(info) = info_bytes(page) {
        store_info(page, info | PageInfo::ENCRYPTED);
    }
}

/// Clears the encrypted flag in the header at the start of `page`, in place.
pub fn clear_encrypted(page: &mut [u8]) {
    if let Some(info) = info_bytes(page) {
        store_info(page, info & !PageInfo::ENCRYPTED);
    }
}

/// The header present on every WAL page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Must equal [`PAGE_MAGIC`].
    pub magic: u16,
    /// Flag bits, see [`PageInfo`].
    pub info: PageInfo,
    /// Timeline the page was written on.
    pub timeline: u32,
    /// Log address of the page start.
    pub page_addr: u64,
    /// Bytes of a continued record remaining on this page.
    pub rem_len: u32,
}

impl PageHeader {
    /// Decodes a short header from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is too short or the magic does not match.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() < SHORT_HEADER_SIZE {
            return Err(CoreError::invalid_format(format!(
                "page header needs {SHORT_HEADER_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        if magic != PAGE_MAGIC {
            return Err(CoreError::invalid_format(format!(
                "bad page magic {magic:#06x}"
            )));
        }

        Ok(Self {
            magic,
            info: PageInfo(u16::from_le_bytes([bytes[2], bytes[3]])),
            timeline: read_u32(bytes, 4),
            page_addr: read_u64(bytes, 8),
            rem_len: read_u32(bytes, 16),
        })
    }

    /// Encodes the header into the first [`SHORT_HEADER_SIZE`] bytes of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`SHORT_HEADER_SIZE`].
    pub fn encode_into(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.magic.to_le_bytes());
        out[2..4].copy_from_slice(&self.info.0.to_le_bytes());
        out[4..8].copy_from_slice(&self.timeline.to_le_bytes());
        out[8..16].copy_from_slice(&self.page_addr.to_le_bytes());
        out[16..20].copy_from_slice(&self.rem_len.to_le_bytes());
        out[20..24].fill(0);
    }
}

/// The header on the first page of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongPageHeader {
    /// The standard page header.
    pub std: PageHeader,
    /// Identifier of the database cluster.
    pub system_id: u64,
    /// Segment size in bytes, for cross-checking.
    pub seg_size: u32,
    /// Page size in bytes, for cross-checking.
    pub page_size: u32,
}

impl LongPageHeader {
    /// Builds the header for the start of a segment.
    #[must_use]
    pub fn new(timeline: u32, page_addr: u64, system_id: u64, seg_size: u32, page_size: u32) -> Self {
        Self {
            std: PageHeader {
                magic: PAGE_MAGIC,
                info: PageInfo(PageInfo::LONG_HEADER),
                timeline,
                page_addr,
                rem_len: 0,
            },
            system_id,
            seg_size,
            page_size,
        }
    }

    /// Returns true if the segment body is encrypted.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.std.info.contains(PageInfo::ENCRYPTED)
    }

    /// Decodes a long header from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is too short, the magic does not match,
    /// or the long-header flag is missing.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() < LONG_HEADER_SIZE {
            return Err(CoreError::invalid_format(format!(
                "long page header needs {LONG_HEADER_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let std = PageHeader::decode(bytes)?;
        if !std.info.contains(PageInfo::LONG_HEADER) {
            return Err(CoreError::invalid_format("page lacks the long header flag"));
        }

        Ok(Self {
            std,
            system_id: read_u64(bytes, 24),
            seg_size: read_u32(bytes, 32),
            page_size: read_u32(bytes, 36),
        })
    }

    /// Encodes the header into the first [`LONG_HEADER_SIZE`] bytes of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`LONG_HEADER_SIZE`].
    pub fn encode_into(&self, out: &mut [u8]) {
        self.std.encode_into(out);
        out[24..32].copy_from_slice(&self.system_id.to_le_bytes());
        out[32..36].copy_from_slice(&self.seg_size.to_le_bytes());
        out[36..40].copy_from_slice(&self.page_size.to_le_bytes());
    }

    /// Encodes the header into a new array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; LONG_HEADER_SIZE] {
        let mut out = [0u8; LONG_HEADER_SIZE];
        self.encode_into(&mut out);
        out
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(b)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(b)
}
