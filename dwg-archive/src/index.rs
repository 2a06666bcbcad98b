//! Enumeration of archive entries sharing a document-number prefix.

use std::path::Path;

use crate::naming::{parse_standard, DrawingName};
use crate::Result;

/// A STANDARD-parseable archive entry, restricted to the fields the
/// reconciler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SameDocEntry {
    pub revision: u8,
    pub name: String,
    pub metric: char,
    pub sheet: u8,
}

/// Scans `dir` (non-recursively) for names beginning with `doc_no`, case
/// insensitively on the `.tif`/`.pdf` suffix, and partitions them into
/// STANDARD-parseable entries and "legacy non-standard" names that merely
/// share the prefix.
///
/// Returns `(same_doc, legacy_non_standard)`. Ordering is unspecified.
pub fn list_same_doc(dir: &Path, doc_no: &str) -> Result<(Vec<SameDocEntry>, Vec<String>)> {
    let mut same_doc = Vec::new();
    let mut legacy = Vec::new();

    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((same_doc, legacy)),
        Err(e) => return Err(e.into()),
    };

    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(doc_no) {
            continue;
        }
        let lower = name.to_ascii_lowercase();
        if !(lower.ends_with(".tif") || lower.ends_with(".pdf")) {
            continue;
        }

        match parse_standard(&name) {
            Some(dn) => same_doc.push(SameDocEntry {
                revision: dn.revision,
                name,
                metric: dn.metric.to_ascii_uppercase(),
                sheet: dn.sheet,
            }),
            None => legacy.push(name),
        }
    }

    Ok((same_doc, legacy))
}

/// Filters `entries` down to those sharing `sheet` with `new`.
pub fn same_sheet<'a>(entries: &'a [SameDocEntry], new: &DrawingName) -> Vec<&'a SameDocEntry> {
    entries.iter().filter(|e| e.sheet == new.sheet).collect()
}
