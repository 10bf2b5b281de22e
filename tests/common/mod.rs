// Shared helpers for integration tests
#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflate,
}

/// Build a ZIP archive in memory from `(name, contents, method)` entries
pub fn build_zip(entries: &[(&str, &[u8], Method)]) -> Vec<u8> {
    build_archive(entries, false)
}

/// Same as [`build_zip`], but every size and offset goes through ZIP64
/// records: saturated 32-bit fields, `0x0001` extra fields, a ZIP64 end of
/// central directory record and its locator.
pub fn build_zip64(entries: &[(&str, &[u8], Method)]) -> Vec<u8> {
    build_archive(entries, true)
}

const SATURATED_32: u32 = 0xFFFFFFFF;
const SATURATED_16: u16 = 0xFFFF;

fn build_archive(entries: &[(&str, &[u8], Method)], zip64: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, data, method) in entries {
        let mut crc = flate2::Crc::new();
        crc.update(data);
        let crc = crc.sum();

        let (method_id, payload) = match method {
            Method::Stored => (0u16, data.to_vec()),
            Method::Deflate => {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data).unwrap();
                (8u16, enc.finish().unwrap())
            }
        };
        let lfh_offset = out.len() as u64;
        let (version, compressed, uncompressed, offset32) = if zip64 {
            (45u16, SATURATED_32, SATURATED_32, SATURATED_32)
        } else {
            (20u16, payload.len() as u32, data.len() as u32, lfh_offset as u32)
        };

        // Local header carries only the two sizes in its ZIP64 field
        let mut local_extra = Vec::new();
        // Central header carries sizes and the local header offset
        let mut central_extra = Vec::new();
        if zip64 {
            local_extra.write_u16::<LittleEndian>(0x0001).unwrap();
            local_extra.write_u16::<LittleEndian>(16).unwrap();
            local_extra.write_u64::<LittleEndian>(data.len() as u64).unwrap();
            local_extra.write_u64::<LittleEndian>(payload.len() as u64).unwrap();

            // An unrelated field first, which the parser must step over
            central_extra.write_u16::<LittleEndian>(0x5455).unwrap();
            central_extra.write_u16::<LittleEndian>(5).unwrap();
            central_extra.write_all(&[1, 0, 0, 0, 0]).unwrap();
            central_extra.write_u16::<LittleEndian>(0x0001).unwrap();
            central_extra.write_u16::<LittleEndian>(24).unwrap();
            central_extra.write_u64::<LittleEndian>(data.len() as u64).unwrap();
            central_extra.write_u64::<LittleEndian>(payload.len() as u64).unwrap();
            central_extra.write_u64::<LittleEndian>(lfh_offset).unwrap();
        }

        out.write_all(b"PK\x03\x04").unwrap();
        out.write_u16::<LittleEndian>(version).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(method_id).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0x21).unwrap();
        out.write_u32::<LittleEndian>(crc).unwrap();
        out.write_u32::<LittleEndian>(compressed).unwrap();
        out.write_u32::<LittleEndian>(uncompressed).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(local_extra.len() as u16).unwrap();
        out.write_all(name.as_bytes()).unwrap();
        out.write_all(&local_extra).unwrap();
        out.write_all(&payload).unwrap();

        central.write_all(b"PK\x01\x02").unwrap();
        central.write_u16::<LittleEndian>(version).unwrap();
        central.write_u16::<LittleEndian>(version).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(method_id).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0x21).unwrap();
        central.write_u32::<LittleEndian>(crc).unwrap();
        central.write_u32::<LittleEndian>(compressed).unwrap();
        central.write_u32::<LittleEndian>(uncompressed).unwrap();
        central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(central_extra.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(offset32).unwrap();
        central.write_all(name.as_bytes()).unwrap();
        central.write_all(&central_extra).unwrap();
    }

    let cd_offset = out.len() as u64;
    out.write_all(&central).unwrap();

    let (entry_count, cd_size, cd_offset32) = if zip64 {
        let eocd64_offset = out.len() as u64;
        out.write_all(b"PK\x06\x06").unwrap();
        out.write_u64::<LittleEndian>(44).unwrap();
        out.write_u16::<LittleEndian>(45).unwrap();
        out.write_u16::<LittleEndian>(45).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u64::<LittleEndian>(entries.len() as u64).unwrap();
        out.write_u64::<LittleEndian>(entries.len() as u64).unwrap();
        out.write_u64::<LittleEndian>(central.len() as u64).unwrap();
        out.write_u64::<LittleEndian>(cd_offset).unwrap();

        out.write_all(b"PK\x06\x07").unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u64::<LittleEndian>(eocd64_offset).unwrap();
        out.write_u32::<LittleEndian>(1).unwrap();

        (SATURATED_16, SATURATED_32, SATURATED_32)
    } else {
        (entries.len() as u16, central.len() as u32, cd_offset as u32)
    };

    out.write_all(b"PK\x05\x06").unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(entry_count).unwrap();
    out.write_u16::<LittleEndian>(entry_count).unwrap();
    out.write_u32::<LittleEndian>(cd_size).unwrap();
    out.write_u32::<LittleEndian>(cd_offset32).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out
}

/// Write bytes to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Synthetic log cycling through three dates in runs of seven records;
/// every `malformed_every`-th record has no date (0 disables that)
pub fn synthetic_log(count: usize, malformed_every: usize) -> Vec<u8> {
    let days = ["2024-11-30", "2024-12-01", "2024-12-02"];
    let mut out = Vec::new();
    for i in 0..count {
        if malformed_every > 0 && i % malformed_every == malformed_every - 1 {
            out.extend_from_slice(format!("garbage line {i} without date\n").as_bytes());
            continue;
        }
        let day = days[(i / 7) % days.len()];
        let padding = "x".repeat(i % 23);
        out.extend_from_slice(
            format!("{day} {:02}:{:02}:00 INFO request {i} {padding}\n", i % 24, i % 60).as_bytes(),
        );
    }
    out
}

/// Records of `data` starting with `date`, newline-terminated
pub fn expected_for(data: &[u8], date: &str) -> Vec<u8> {
    data.split_inclusive(|&b| b == b'\n')
        .filter(|r| r.starts_with(date.as_bytes()))
        .flat_map(|r| r.iter().copied())
        .collect()
}
