//! Page-orientation oracle used to route landscape/portrait scans.
//!
//! PDFs are assumed landscape-safe; TIFFs are inspected via their IFD header
//! to recover the pixel width/height without decoding image data.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const TAG_WIDTH: u16 = 256;
const TAG_HEIGHT: u16 = 257;

/// Returns `true` if the page at `path` is landscape (width > height), or
/// if orientation cannot be determined. A square page is rejected like a
/// portrait one. PDFs always return `true`.
pub fn ok(path: &Path) -> bool {
    let is_tif = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false);
    if !is_tif {
        return true;
    }

    match read_tiff_dims(path) {
        Some((w, h)) => w > h,
        None => true,
    }
}

fn read_tiff_dims(path: &Path) -> Option<(u32, u32)> {
    let mut f = File::open(path).ok()?;
    let mut header = [0u8; 8];
    f.read_exact(&mut header).ok()?;

    let little_endian = match &header[0..2] {
        b"II" => true,
        b"MM" => false,
        _ => return None,
    };
    let magic = read_u16(&header[2..4], little_endian);
    if magic != 42 {
        return None;
    }
    let ifd_offset = read_u32(&header[4..8], little_endian);

    f.seek(SeekFrom::Start(ifd_offset as u64)).ok()?;
    let mut count_buf = [0u8; 2];
    f.read_exact(&mut count_buf).ok()?;
    let entry_count = read_u16(&count_buf, little_endian);

    let mut width = None;
    let mut height = None;

    for _ in 0..entry_count {
        let mut entry = [0u8; 12];
        f.read_exact(&mut entry).ok()?;
        let tag = read_u16(&entry[0..2], little_endian);
        let field_type = read_u16(&entry[2..4], little_endian);
        let value = read_ifd_value(&entry[8..12], field_type, little_endian);

        match tag {
            TAG_WIDTH => width = value,
            TAG_HEIGHT => height = value,
            _ => {}
        }
        if width.is_some() && height.is_some() {
            break;
        }
    }

    Some((width?, height?))
}

fn read_ifd_value(bytes: &[u8], field_type: u16, little_endian: bool) -> Option<u32> {
    match field_type {
        // SHORT
        3 => Some(read_u16(&bytes[0..2], little_endian) as u32),
        // LONG
        4 => Some(read_u32(bytes, little_endian)),
        _ => None,
    }
}

fn read_u16(bytes: &[u8], little_endian: bool) -> u16 {
    if little_endian {
        u16::from_le_bytes([bytes[0], bytes[1]])
    } else {
        u16::from_be_bytes([bytes[0], bytes[1]])
    }
}

fn read_u32(bytes: &[u8], little_endian: bool) -> u32 {
    let arr = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if little_endian {
        u32::from_le_bytes(arr)
    } else {
        u32::from_be_bytes(arr)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn write_tiff(path: &Path, little_endian: bool, width: u16, height: u16) {
        let mut bytes: Vec<u8> = Vec::new();
        if little_endian {
            bytes.extend_from_slice(b"II");
            bytes.extend_from_slice(&42u16.to_le_bytes());
            bytes.extend_from_slice(&8u32.to_le_bytes());
        } else {
            bytes.extend_from_slice(b"MM");
            bytes.extend_from_slice(&42u16.to_be_bytes());
            bytes.extend_from_slice(&8u32.to_be_bytes());
        }

        let put16 = |buf: &mut Vec<u8>, v: u16| {
            if little_endian {
                buf.extend_from_slice(&v.to_le_bytes());
            } else {
                buf.extend_from_slice(&v.to_be_bytes());
            }
        };
        let put32 = |buf: &mut Vec<u8>, v: u32| {
            if little_endian {
                buf.extend_from_slice(&v.to_le_bytes());
            } else {
                buf.extend_from_slice(&v.to_be_bytes());
            }
        };

        put16(&mut bytes, 2); // entry count

        // width entry: tag=256, type=SHORT(3), count=1, value in first 2 bytes
        put16(&mut bytes, TAG_WIDTH);
        put16(&mut bytes, 3);
        put32(&mut bytes, 1);
        put16(&mut bytes, width);
        put16(&mut bytes, 0);

        // height entry
        put16(&mut bytes, TAG_HEIGHT);
        put16(&mut bytes, 3);
        put32(&mut bytes, 1);
        put16(&mut bytes, height);
        put16(&mut bytes, 0);

        let mut f = File::create(path).unwrap();
        f.write_all(&bytes).unwrap();
    }

    #[test]
    fn test_pdf_is_always_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whatever.pdf");
        File::create(&path).unwrap();
        assert!(ok(&path));
    }

    #[test]
    fn test_landscape_little_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        write_tiff(&path, true, 1000, 500);
        assert!(ok(&path));
    }

    #[test]
    fn test_portrait_big_endian() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        write_tiff(&path, false, 500, 1000);
        assert!(!ok(&path));
    }

    #[test]
    fn test_square_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        write_tiff(&path, true, 800, 800);
        assert!(!ok(&path));
    }

    #[test]
    fn test_unreadable_file_defaults_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.tif");
        std::fs::write(&path, b"not a tiff").unwrap();
        assert!(ok(&path));
    }
}
