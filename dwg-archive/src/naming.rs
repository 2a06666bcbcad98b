//! Filename grammars for the three drawing name flavors the pipeline recognizes.
//!
//! Parsing is pure: no filesystem access, no normalization beyond what the
//! grammars themselves capture. Callers that need case-normalized attributes
//! (e.g. the location mapper) uppercase the relevant field themselves.

use regex::Regex;
use std::sync::OnceLock;

/// The extension a drawing file carries, as recognized by the STANDARD grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ext {
    Tif,
    Pdf,
}

/// The measurement-system partition a metric letter falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricGroup {
    /// Metric or Inch.
    Mi,
    /// Dual or Not-applicable.
    Dn,
}

/// A filename matching the STANDARD grammar:
/// `D<format><location><digits{6}>R<rev{2}>S<sheet{2}><metric>.<ext>`.
///
/// All letter fields retain the exact case they were captured in, so that
/// [`DrawingName::filename`] reconstructs the original name bit-for-bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingName {
    pub format: char,
    pub location: char,
    pub doc_digits: String,
    pub revision: u8,
    pub sheet: u8,
    pub metric: char,
    pub ext: Ext,
    ext_raw: String,
}

impl DrawingName {
    /// The doc-no prefix: `D` + format + location + the six digits, with
    /// letters preserved exactly as captured from the filename.
    pub fn doc_no(&self) -> String {
        format!("D{}{}{}", self.format, self.location, self.doc_digits)
    }

    /// The metric group (`{M,I}` vs `{D,N}`) this drawing's metric letter
    /// belongs to, irrespective of letter case.
    pub fn metric_group(&self) -> MetricGroup {
        match self.metric.to_ascii_uppercase() {
            'M' | 'I' => MetricGroup::Mi,
            _ => MetricGroup::Dn,
        }
    }

    /// Reconstructs the original filename from the parsed attributes.
    pub fn filename(&self) -> String {
        format!(
            "D{}{}{}R{:02}S{:02}{}.{}",
            self.format, self.location, self.doc_digits, self.revision, self.sheet, self.metric, self.ext_raw
        )
    }
}

/// A filename matching the ISS_CLASSIC grammar:
/// `G<4 digits><4 alphanum><6 alphanum>ISSR<rev{2}>S<sheet{2}>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssClassic {
    pub g4: String,
    pub s4: String,
    pub s6: String,
    pub rev: u8,
    pub sheet: u8,
}

impl IssClassic {
    /// The document number the ISS sidecar schema uses: `G` + the three
    /// captured groups, concatenated verbatim.
    pub fn doc_no(&self) -> String {
        format!("G{}{}{}", self.g4, self.s4, self.s6)
    }
}

/// A filename matching the ISS_MARKED grammar: `<stem>R<rev{2}>S<sheet{2}>.pdf`,
/// where the stem is a free-form ISS document number, optionally followed by
/// an order-number prefix delimited with `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssMarked {
    pub doc_no: String,
    pub rev: u8,
    pub sheet: u8,
}

impl IssMarked {
    /// The order number: the substring of the stem before its first `-`, or
    /// empty if the stem has no `-`.
    pub fn order_number(&self) -> &str {
        match self.doc_no.split_once('-') {
            Some((order, _)) => order,
            None => "",
        }
    }
}

/// The outcome of parsing a filename against the ISS_CLASSIC / ISS_MARKED
/// grammars only (no STANDARD fallback); see [`parse_iss`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssName {
    Classic(IssClassic),
    Marked(IssMarked),
}

fn standard_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^D([A-Z])([A-Z])(\d{6})R(\d{2})S(\d{2})([A-Z])\.(tif|pdf)$").unwrap()
    })
}

fn iss_classic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^G(\d{4})([A-Z0-9]{4})([A-Z0-9]{6})ISSR(\d{2})S(\d{2})\.pdf$").unwrap()
    })
}

fn iss_marked_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.+?)R(\d{2})S(\d{2})\.pdf$").unwrap())
}

/// Parses `name` against the STANDARD grammar.
///
/// Returns `None` if the name does not match; no filesystem access occurs.
pub fn parse_standard(name: &str) -> Option<DrawingName> {
    let caps = standard_re().captures(name)?;
    let ext_raw = caps.get(7).unwrap().as_str().to_owned();
    let ext = if ext_raw.eq_ignore_ascii_case("pdf") {
        Ext::Pdf
    } else {
        Ext::Tif
    };

    Some(DrawingName {
        format: first_char(&caps[1]),
        location: first_char(&caps[2]),
        doc_digits: caps[3].to_owned(),
        revision: caps[4].parse().ok()?,
        sheet: caps[5].parse().ok()?,
        metric: first_char(&caps[6]),
        ext,
        ext_raw,
    })
}

/// Parses `name` against the ISS grammars, trying ISS_CLASSIC before
/// ISS_MARKED.
pub fn parse_iss(name: &str) -> Option<IssName> {
    if let Some(caps) = iss_classic_re().captures(name) {
        return Some(IssName::Classic(IssClassic {
            g4: caps[1].to_owned(),
            s4: caps[2].to_owned(),
            s6: caps[3].to_owned(),
            rev: caps[4].parse().ok()?,
            sheet: caps[5].parse().ok()?,
        }));
    }

    let caps = iss_marked_re().captures(name)?;
    Some(IssName::Marked(IssMarked {
        doc_no: caps[1].to_owned(),
        rev: caps[2].parse().ok()?,
        sheet: caps[3].parse().ok()?,
    }))
}

/// The outcome of parsing a filename in ISS-intake context, where the
/// grammars are tried in priority order ISS_CLASSIC, ISS_MARKED, STANDARD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssIntakeName {
    Classic(IssClassic),
    Marked(IssMarked),
    Standard(DrawingName),
}

/// Parses `name` for the ISS intake path, trying ISS_CLASSIC, then
/// ISS_MARKED, then STANDARD.
pub fn parse_for_iss_intake(name: &str) -> Option<IssIntakeName> {
    if let Some(caps) = iss_classic_re().captures(name) {
        return Some(IssIntakeName::Classic(IssClassic {
            g4: caps[1].to_owned(),
            s4: caps[2].to_owned(),
            s6: caps[3].to_owned(),
            rev: caps[4].parse().ok()?,
            sheet: caps[5].parse().ok()?,
        }));
    }
    if let Some(caps) = iss_marked_re().captures(name) {
        return Some(IssIntakeName::Marked(IssMarked {
            doc_no: caps[1].to_owned(),
            rev: caps[2].parse().ok()?,
            sheet: caps[3].parse().ok()?,
        }));
    }
    parse_standard(name).map(IssIntakeName::Standard)
}

fn first_char(s: &str) -> char {
    s.chars().next().expect("regex group is non-empty")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_standard_basic() {
        let dn = parse_standard("DAM123456R02S01M.tif").unwrap();
        assert_eq!(dn.format, 'A');
        assert_eq!(dn.location, 'M');
        assert_eq!(dn.doc_digits, "123456");
        assert_eq!(dn.revision, 2);
        assert_eq!(dn.sheet, 1);
        assert_eq!(dn.metric, 'M');
        assert_eq!(dn.ext, Ext::Tif);
        assert_eq!(dn.doc_no(), "DAM123456");
        assert_eq!(dn.metric_group(), MetricGroup::Mi);
    }

    #[test]
    fn test_parse_standard_rejects_bad_names() {
        assert!(parse_standard("not_a_drawing.tif").is_none());
        assert!(parse_standard("DAM123456R02S01M.doc").is_none());
        assert!(parse_standard("DAM12345R02S01M.tif").is_none());
    }

    #[test]
    fn test_round_trip_preserves_case() {
        for name in [
            "DAM123456R02S01M.tif",
            "dam123456r02s01m.TIF",
            "DbK000099R99S99D.pdf",
        ] {
            let dn = parse_standard(name).unwrap();
            assert_eq!(dn.filename(), name);
        }
    }

    #[test]
    fn test_parse_iss_classic() {
        let iss = parse_iss("G1234ABCDEF0123ISSR00S01.pdf").unwrap();
        match iss {
            IssName::Classic(c) => {
                assert_eq!(c.doc_no(), "G1234ABCDEF0123");
                assert_eq!(c.rev, 0);
                assert_eq!(c.sheet, 1);
            }
            IssName::Marked(_) => panic!("expected classic match"),
        }
    }

    #[test]
    fn test_parse_iss_marked_order_number() {
        let iss = parse_iss("PO-98765R01S02.pdf").unwrap();
        match iss {
            IssName::Marked(m) => {
                assert_eq!(m.doc_no, "PO-98765");
                assert_eq!(m.order_number(), "PO");
            }
            IssName::Classic(_) => panic!("expected marked match"),
        }
    }

    #[test]
    fn test_parse_iss_marked_without_order_number() {
        let iss = parse_iss("ABC123R01S02.pdf").unwrap();
        match iss {
            IssName::Marked(m) => assert_eq!(m.order_number(), ""),
            IssName::Classic(_) => panic!("expected marked match"),
        }
    }

    #[test]
    fn test_intake_priority_order() {
        assert!(matches!(
            parse_for_iss_intake("G1234ABCDEF0123ISSR00S01.pdf"),
            Some(IssIntakeName::Classic(_))
        ));
        assert!(matches!(
            parse_for_iss_intake("PO-98765R01S02.pdf"),
            Some(IssIntakeName::Marked(_))
        ));
        assert!(matches!(
            parse_for_iss_intake("DAM123456R02S01M.pdf"),
            Some(IssIntakeName::Standard(_))
        ));
    }
}
