//! Filesystem effects: the only module in this crate permitted to touch
//! disk on behalf of the reconciler's decisions. Every public function here
//! maps an [`crate::reconcile::Intent`] to one concrete syscall sequence.

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::Result;

const DEFAULT_COPY_BUF_MIB: u64 = 8;

fn copy_buf_bytes() -> usize {
    let mib = std::env::var("SWARKY_COPY_BUF_MIB")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&v| v >= 1)
        .unwrap_or(DEFAULT_COPY_BUF_MIB);
    (mib * 1024 * 1024) as usize
}

/// Moves `src` to `dest`, creating `dest`'s parent directory if needed.
/// Overwrites any existing file at `dest`.
pub fn move_to(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::effector(parent, e))?;
    }
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => copy_then_remove(src, dest),
    }
}

fn copy_then_remove(src: &Path, dest: &Path) -> Result<()> {
    buffered_copy(src, dest)?;
    fs::remove_file(src).map_err(|e| Error::effector(src, e))?;
    Ok(())
}

/// Moves `src` into the historical tree at `dest`, refusing to overwrite an
/// existing file there. Returns `(moved, rc)`: refused (already present)
/// is `(false, 0)`, success is `(true, 1)`, any other failure is
/// `(false, 8)` rather than propagating, mirroring the original writer's
/// return-code convention.
pub fn move_to_historical(src: &Path, dest: &Path) -> Result<(bool, i32)> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::effector(parent, e))?;
    }
    if dest.exists() {
        return Ok((false, 0));
    }
    match fs::rename(src, dest) {
        Ok(()) => Ok((true, 1)),
        Err(_) => match copy_then_remove(src, dest) {
            Ok(()) => Ok((true, 1)),
            Err(_) => Ok((false, 8)),
        },
    }
}

/// Replicates `src` to `dest` without removing the source, trying a
/// hardlink first, then a rename-free same-filesystem copy, falling back to
/// a buffered copy across filesystems.
pub fn copy_or_link(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::effector(parent, e))?;
    }
    if dest.exists() {
        fs::remove_file(dest).map_err(|e| Error::effector(dest, e))?;
    }
    match fs::hard_link(src, dest) {
        Ok(()) => Ok(()),
        Err(_) => buffered_copy(src, dest),
    }
}

fn buffered_copy(src: &Path, dest: &Path) -> Result<()> {
    let buf_len = copy_buf_bytes();
    let src_file = fs::File::open(src).map_err(|e| Error::effector(src, e))?;
    let modified = src_file.metadata().map_err(|e| Error::effector(src, e))?.modified();
    let dest_file = fs::File::create(dest).map_err(|e| Error::effector(dest, e))?;
    let mut reader = BufReader::with_capacity(buf_len, src_file);
    let mut writer = BufWriter::with_capacity(buf_len, dest_file);

    let mut buf = vec![0u8; buf_len];
    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::effector(src, e))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .map_err(|e| Error::effector(dest, e))?;
    }
    writer.flush().map_err(|e| Error::effector(dest, e))?;

    // mtime preservation is best-effort: the copy itself already succeeded,
    // so a filesystem that rejects utime (e.g. read-only mtimes) shouldn't
    // turn a good copy into a reported failure.
    if let Ok(modified) = modified {
        match fs::File::options().write(true).open(dest) {
            Ok(dest_file) => {
                if let Err(e) = dest_file.set_modified(modified) {
                    log::debug!("preserving mtime on {}: {e}", dest.display());
                }
            }
            Err(e) => log::debug!("reopening {} to preserve mtime: {e}", dest.display()),
        }
    }
    Ok(())
}

/// Appends `lines` to the file at `path`, each followed by a newline,
/// creating the file and its parent directory if needed.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::effector(parent, e))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::effector(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}").map_err(|e| Error::effector(path, e))?;
    }
    writer.flush().map_err(|e| Error::effector(path, e))?;
    Ok(())
}

/// Writes `lines` to `path` only if it does not already exist. Returns
/// `true` if the file was written, `false` if it already existed.
pub fn write_once(path: &Path, lines: &[String]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_lines(path, lines)?;
    Ok(true)
}

/// Moves `src` into the reject tree at `dest_dir`, preserving its
/// filename, never overwriting an existing entry (appends `.N` on
/// collision).
pub fn move_to_reject(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir).map_err(|e| Error::effector(dest_dir, e))?;
    let file_name = src
        .file_name()
        .ok_or_else(|| Error::InvalidFormat("source path has no file name".to_owned()))?;
    let mut dest = dest_dir.join(file_name);
    let mut n = 1;
    while dest.exists() {
        dest = dest_dir.join(format!("{}.{}", file_name.to_string_lossy(), n));
        n += 1;
    }
    move_to(src, &dest)?;
    Ok(dest)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::File;
    use std::io::Write as _;

    #[test]
    fn test_move_to_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.tif");
        File::create(&src).unwrap().write_all(b"data").unwrap();
        let dest = dir.path().join("sub/dir/a.tif");

        move_to(&src, &dest).unwrap();
        assert!(dest.exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_move_to_historical_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.tif");
        File::create(&src).unwrap();
        let dest = dir.path().join("hist/a.tif");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        File::create(&dest).unwrap();

        let (moved, rc) = move_to_historical(&src, &dest).unwrap();
        assert!(!moved);
        assert_eq!(rc, 0);
        assert!(src.exists());
    }

    #[test]
    fn test_move_to_historical_succeeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.tif");
        File::create(&src).unwrap();
        let dest = dir.path().join("hist/a.tif");

        let (moved, rc) = move_to_historical(&src, &dest).unwrap();
        assert!(moved);
        assert_eq!(rc, 1);
        assert!(dest.exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_buffered_copy_preserves_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.tif");
        File::create(&src).unwrap().write_all(b"data").unwrap();
        let old_mtime = fs::metadata(&src).unwrap().modified().unwrap();
        let dest_dir = dir.path().join("dest");
        fs::create_dir_all(&dest_dir).unwrap();
        let dest = dest_dir.join("a.tif");

        buffered_copy(&src, &dest).unwrap();
        let new_mtime = fs::metadata(&dest).unwrap().modified().unwrap();
        assert_eq!(new_mtime, old_mtime);
    }

    #[test]
    fn test_copy_or_link_preserves_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.pdf");
        File::create(&src).unwrap().write_all(b"hello").unwrap();
        let dest = dir.path().join("plm/a.pdf");

        copy_or_link(&src, &dest).unwrap();
        assert!(src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn test_write_once_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sidecar.DESEDI");

        assert!(write_once(&path, &["first".to_owned()]).unwrap());
        assert!(!write_once(&path, &["second".to_owned()]).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");
    }

    #[test]
    fn test_write_lines_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        write_lines(&path, &["one".to_owned()]).unwrap();
        write_lines(&path, &["two".to_owned()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_move_to_reject_avoids_collision() {
        let dir = tempfile::tempdir().unwrap();
        let reject_dir = dir.path().join("reject");

        let src1 = dir.path().join("a.tif");
        File::create(&src1).unwrap();
        let dest1 = move_to_reject(&src1, &reject_dir).unwrap();
        assert_eq!(dest1, reject_dir.join("a.tif"));

        let src2 = dir.path().join("a.tif");
        File::create(&src2).unwrap();
        let dest2 = move_to_reject(&src2, &reject_dir).unwrap();
        assert_eq!(dest2, reject_dir.join("a.tif.1"));
    }
}
