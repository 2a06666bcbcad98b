//! Deterministic mapping from a drawing's location/format attributes to its
//! archive sub-tree and the defaults the sidecar builder uses.

use std::path::{Path, PathBuf};

use crate::naming::DrawingName;

/// The kind of document a location resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocType {
    Detail,
    CustomerDrawings,
    VendorSuppliedData,
}

impl DocType {
    /// The value this doctype collapses to in the `[DrawingInfo]` sidecar
    /// section.
    pub fn drawing_info_label(&self) -> &'static str {
        match self {
            DocType::Detail => "Detail",
            DocType::CustomerDrawings | DocType::VendorSuppliedData => "Customer Drawings",
        }
    }

    /// The value this doctype takes in the `[DatabaseFields]` sidecar
    /// section.
    pub fn database_fields_label(&self) -> &'static str {
        match self {
            DocType::Detail => "DETAIL",
            DocType::CustomerDrawings => "Customer Drawings",
            DocType::VendorSuppliedData => "Vendor Supplied Data",
        }
    }
}

/// The sidecar drawing language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Italian,
    English,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Italian => "Italian",
            Lang::English => "English",
        }
    }
}

struct LocationRow {
    folder: &'static str,
    log_name: &'static str,
    subloc: &'static str,
    doctype: DocType,
    lang: Lang,
}

const UNKNOWN_ROW: LocationRow = LocationRow {
    folder: "unknown",
    log_name: "Unknown",
    subloc: "m",
    doctype: DocType::CustomerDrawings,
    lang: Lang::English,
};

/// Resolution of a drawing's location + first doc digit into its archive
/// sub-tree and sidecar defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    pub folder: String,
    pub log_name: String,
    pub subloc: String,
    pub doctype: DocType,
    pub lang: Lang,
    pub arch_subdir: String,
    pub target_dir: PathBuf,
}

// Resolution order fixed by the spec: (loc,digit) -> (loc,*) -> (*,digit) ->
// default. The source table has no exact (loc,digit) entry, so step 1 never
// fires for any row below; ROWS_BY_LOC and ROWS_BY_DIGIT implement steps 2
// and 3 respectively.
fn row_for(location: char, first_digit: char) -> &'static LocationRow {
    static ROWS_BY_LOC: &[(char, LocationRow)] = &[
        (
            'M',
            LocationRow {
                folder: "costruttivi",
                log_name: "Costruttivi",
                subloc: "m",
                doctype: DocType::Detail,
                lang: Lang::Italian,
            },
        ),
        (
            'K',
            LocationRow {
                folder: "bozzetti",
                log_name: "Bozzetti",
                subloc: "k",
                doctype: DocType::CustomerDrawings,
                lang: Lang::English,
            },
        ),
        (
            'F',
            LocationRow {
                folder: "fornitori",
                log_name: "Fornitori",
                subloc: "f",
                doctype: DocType::VendorSuppliedData,
                lang: Lang::English,
            },
        ),
        (
            'T',
            LocationRow {
                folder: "tenute_meccaniche",
                log_name: "T_meccaniche",
                subloc: "t",
                doctype: DocType::CustomerDrawings,
                lang: Lang::English,
            },
        ),
        (
            'E',
            LocationRow {
                folder: "sezioni",
                log_name: "Sezioni",
                subloc: "s",
                doctype: DocType::CustomerDrawings,
                lang: Lang::English,
            },
        ),
        (
            'S',
            LocationRow {
                folder: "sezioni",
                log_name: "Sezioni",
                subloc: "s",
                doctype: DocType::CustomerDrawings,
                lang: Lang::English,
            },
        ),
        (
            'N',
            LocationRow {
                folder: "marcianise",
                log_name: "Marcianise",
                subloc: "n",
                doctype: DocType::Detail,
                lang: Lang::Italian,
            },
        ),
        (
            'P',
            LocationRow {
                folder: "preventivi",
                log_name: "Preventivi",
                subloc: "p",
                doctype: DocType::CustomerDrawings,
                lang: Lang::English,
            },
        ),
    ];
    static ROWS_BY_DIGIT: &[(char, LocationRow)] = &[
        (
            '4',
            LocationRow {
                folder: "pID_ELETTRICI",
                log_name: "Pid_Elettrici",
                subloc: "m",
                doctype: DocType::CustomerDrawings,
                lang: Lang::Italian,
            },
        ),
        (
            '5',
            LocationRow {
                folder: "piping",
                log_name: "Piping",
                subloc: "m",
                doctype: DocType::CustomerDrawings,
                lang: Lang::Italian,
            },
        ),
    ];

    if let Some((_, row)) = ROWS_BY_LOC.iter().find(|(l, _)| *l == location) {
        return row;
    }
    if let Some((_, row)) = ROWS_BY_DIGIT.iter().find(|(d, _)| *d == first_digit) {
        return row;
    }
    &UNKNOWN_ROW
}

/// Maps a parsed [`DrawingName`] to its [`LocationInfo`] under `archive_root`.
pub fn map_location(name: &DrawingName, archive_root: &Path) -> LocationInfo {
    let location = name.location.to_ascii_uppercase();
    let first_digit = name
        .doc_digits
        .chars()
        .next()
        .expect("doc_digits is exactly six digits");

    let row = row_for(location, first_digit);
    let arch_subdir = format!("{}{}", name.format.to_ascii_uppercase(), row.subloc);
    let target_dir = archive_root.join(row.folder).join(&arch_subdir);

    LocationInfo {
        folder: row.folder.to_owned(),
        log_name: row.log_name.to_owned(),
        subloc: row.subloc.to_owned(),
        doctype: row.doctype,
        lang: row.lang,
        arch_subdir,
        target_dir,
    }
}

/// Maps a format letter to its drawing size, e.g. `A -> A4`.
pub fn size_from_letter(ch: char) -> &'static str {
    match ch.to_ascii_uppercase() {
        'A' => "A4",
        'B' => "A3",
        'C' => "A2",
        'D' => "A1",
        'E' => "A0",
        _ => "A4",
    }
}

/// Maps a metric letter to its unit-of-measure label.
pub fn uom_from_letter(ch: char) -> &'static str {
    match ch.to_ascii_uppercase() {
        'N' => "(Not applicable)",
        'M' => "Metric",
        'I' => "Inch",
        'D' => "Dual",
        _ => "Metric",
    }
}

/// The historical-tree destination directory for a drawing with the given
/// format letter: `historical_root/D<FORMAT>`.
pub fn historical_dir_for(historical_root: &Path, format: char) -> PathBuf {
    historical_root.join(format!("D{}", format.to_ascii_uppercase()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::naming::parse_standard;
    use std::path::Path;

    fn loc_for(name: &str) -> LocationInfo {
        let dn = parse_standard(name).unwrap();
        map_location(&dn, Path::new("/archive"))
    }

    #[test]
    fn test_exact_location_row() {
        let loc = loc_for("DAM123456R02S01M.tif");
        assert_eq!(loc.folder, "costruttivi");
        assert_eq!(loc.log_name, "Costruttivi");
        assert_eq!(loc.doctype, DocType::Detail);
        assert_eq!(loc.lang, Lang::Italian);
        assert_eq!(loc.arch_subdir, "Am");
        assert_eq!(loc.target_dir, Path::new("/archive/costruttivi/Am"));
    }

    #[test]
    fn test_vendor_location_row() {
        let loc = loc_for("DAF123456R02S01M.tif");
        assert_eq!(loc.folder, "fornitori");
        assert_eq!(loc.doctype, DocType::VendorSuppliedData);
    }

    #[test]
    fn test_digit_fallback_row() {
        // location letter Z is not in the table; first digit 4 maps via the
        // (*, digit) fallback to pID_ELETTRICI.
        let loc = loc_for("DAZ423456R02S01M.tif");
        assert_eq!(loc.folder, "pID_ELETTRICI");
        assert_eq!(loc.lang, Lang::Italian);
    }

    #[test]
    fn test_default_row() {
        let loc = loc_for("DAZ123456R02S01M.tif");
        assert_eq!(loc.folder, "unknown");
        assert_eq!(loc.log_name, "Unknown");
    }

    #[test]
    fn test_size_and_uom_letters() {
        assert_eq!(size_from_letter('a'), "A4");
        assert_eq!(size_from_letter('E'), "A0");
        assert_eq!(uom_from_letter('n'), "(Not applicable)");
        assert_eq!(uom_from_letter('D'), "Dual");
    }
}
