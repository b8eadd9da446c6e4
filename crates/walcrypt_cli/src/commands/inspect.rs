//! Inspect command implementation.

use super::{read_header, CliError, CliResult};
use serde::Serialize;
use std::path::Path;
use walcrypt_core::wal::{PageInfo, SegmentPosition};
use walcrypt_storage::{FileSegment, SegmentFile};

/// Segment inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Segment path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Timeline encoded in the file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_timeline: Option<u32>,
    /// Segment number encoded in the file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_segno: Option<u64>,
    /// Page magic.
    pub magic: u16,
    /// Raw info flags.
    pub info: u16,
    /// Timeline in the header.
    pub timeline: u32,
    /// Log address of the first page.
    pub page_addr: u64,
    /// Database system identifier.
    pub system_id: u64,
    /// Segment size recorded in the header.
    pub segment_size: u32,
    /// Page size recorded in the header.
    pub page_size: u32,
    /// Whether page bodies are encrypted.
    pub encrypted: bool,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> CliResult<()> {
    let result = inspect_segment(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => {
            print_text_output(&result);
        }
        other => {
            return Err(CliError::Usage(format!("unknown format '{other}'")));
        }
    }

    Ok(())
}

/// Reads the header of the segment at `path`.
pub fn inspect_segment(path: &Path) -> CliResult<InspectResult> {
    let segment = FileSegment::open_read_only(path)?;
    let header = read_header(&segment)?;

    let from_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| SegmentPosition::parse_file_name(name, u64::from(header.seg_size)).ok());

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size: segment.size()?,
        name_timeline: from_name.map(|p| p.timeline),
        name_segno: from_name.map(|p| p.segno),
        magic: header.std.magic,
        info: header.std.info.0,
        timeline: header.std.timeline,
        page_addr: header.std.page_addr,
        system_id: header.system_id,
        segment_size: header.seg_size,
        page_size: header.page_size,
        encrypted: header.is_encrypted(),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("WAL Segment Inspection");
    println!("======================");
    println!();
    println!("Path: {}", result.path);
    println!("Size: {}", format_size(result.file_size));
    if let (Some(timeline), Some(segno)) = (result.name_timeline, result.name_segno) {
        println!("Name: timeline {timeline}, segment {segno:X}");
    }
    println!();
    println!("Long header:");
    println!("  Magic:        {:#06X}", result.magic);
    println!("  Info:         {:#06X}{}", result.info, describe_flags(result.info));
    println!("  Timeline:     {}", result.timeline);
    println!("  Page address: {:X}", result.page_addr);
    println!("  System id:    {}", result.system_id);
    println!("  Segment size: {}", format_size(u64::from(result.segment_size)));
    println!("  Page size:    {}", result.page_size);
    println!();
    println!(
        "Encryption: {}",
        if result.encrypted { "enabled" } else { "none" }
    );
}

fn describe_flags(info: u16) -> String {
    let names = [
        (PageInfo::FIRST_IS_CONTRECORD, "contrecord"),
        (PageInfo::LONG_HEADER, "long"),
        (PageInfo::BKP_REMOVABLE, "bkp-removable"),
        (PageInfo::FIRST_IS_OVERWRITE_CONTRECORD, "overwrite-contrecord"),
        (PageInfo::ENCRYPTED, "encrypted"),
    ];
    let set: Vec<&str> = names
        .iter()
        .filter(|(flag, _)| PageInfo(info).contains(*flag))
        .map(|(_, name)| *name)
        .collect();

    if set.is_empty() {
        String::new()
    } else {
        format!(" ({})", set.join(", "))
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
