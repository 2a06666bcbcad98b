//! Construction of the EDI sidecar document: an ordered `key=value` line
//! sequence with a fixed section layout, written once per drawing.

use chrono::Local;

use crate::location::{size_from_letter, uom_from_letter, LocationInfo};
use crate::naming::{DrawingName, Ext, IssClassic, IssMarked};

const SERVER_NAME: &str = "ORMDB33";
const PROJECT_NAME: &str = "FPD Engineering";
const PUMP_MODEL: &str = "(UNKNOWN)";
const OEM: &str = "Flowserve";
const DESIGN_CENTER: &str = "Desio, Italy";
const OEM_SITE: &str = "Desio, Italy";
const DRAWING_CLASS: &str = "COMMERCIAL";
const CURRENT_REVISION: &str = "Y";
const ENTERED_BY: &str = "10150286";

/// The shape a sidecar was built with, used only to label it for logging;
/// the line content itself is schema-specific and produced ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarSchema {
    Standard,
    Iss,
}

struct Fields {
    document_no: String,
    rev: String,
    sheet: String,
    description: String,
    actual_size: &'static str,
    uom: &'static str,
    doctype_db: String,
    doctype_info: String,
    lang: &'static str,
    file_name: String,
    file_type: &'static str,
    order_number: String,
}

fn render(f: Fields, now: &str) -> Vec<String> {
    vec![
        "[Database]".to_owned(),
        format!("ServerName={}", SERVER_NAME),
        format!("ProjectName={}", PROJECT_NAME),
        "[DatabaseFields]".to_owned(),
        format!("DocumentNo={}", f.document_no),
        format!("DocumentRev={}", f.rev),
        format!("SheetNumber={}", f.sheet),
        format!("Description={}", f.description),
        format!("ActualSize={}", f.actual_size),
        format!("PumpModel={}", PUMP_MODEL),
        format!("OEM={}", OEM),
        "PumpSize=".to_owned(),
        format!("OrderNumber={}", f.order_number),
        "SerialNumber=".to_owned(),
        format!("Document_Type={}", f.doctype_db),
        format!("DrawingClass={}", DRAWING_CLASS),
        format!("DesignCenter={}", DESIGN_CENTER),
        format!("OEMSite={}", OEM_SITE),
        "OEMDrawingNumber=".to_owned(),
        format!("UOM={}", f.uom),
        format!("DWGLanguage={}", f.lang),
        format!("CurrentRevision={}", CURRENT_REVISION),
        format!("EnteredBy={}", ENTERED_BY),
        "Notes=".to_owned(),
        "NonEnglishDesc=".to_owned(),
        "SupersededBy=".to_owned(),
        "NumberOfStages=".to_owned(),
        "[DrawingInfo]".to_owned(),
        format!("DocumentNo={}", f.document_no),
        format!("SheetNumber={}", f.sheet),
        format!("Document_Type={}", f.doctype_info),
        format!("DocumentRev={}", f.rev),
        format!("FileName={}", f.file_name),
        format!("FileType={}", f.file_type),
        format!("Currentdate={}", now),
    ]
}

fn file_type_for(ext: Ext) -> &'static str {
    match ext {
        Ext::Pdf => "Pdf",
        Ext::Tif => "Tiff",
    }
}

/// Builds the STANDARD-schema sidecar lines for a drawing archived under
/// `loc`. `now` is the local timestamp to stamp `Currentdate` with,
/// formatted `YYYY-MM-DD HH:MM:SS`.
pub fn build_standard(name: &DrawingName, loc: &LocationInfo, now_text: &str) -> Vec<String> {
    render(
        Fields {
            document_no: name.doc_no(),
            rev: format!("{:02}", name.revision),
            sheet: format!("{:02}", name.sheet),
            description: String::new(),
            actual_size: size_from_letter(name.format),
            uom: uom_from_letter(name.metric),
            doctype_db: loc.doctype.database_fields_label().to_owned(),
            doctype_info: loc.doctype.drawing_info_label().to_owned(),
            lang: loc.lang.as_str(),
            file_name: name.filename(),
            file_type: file_type_for(name.ext),
            order_number: String::new(),
        },
        now_text,
    )
}

/// Builds the ISS-schema sidecar lines for an ISS_CLASSIC drawing.
pub fn build_iss_classic(iss: &IssClassic, file_name: &str, now_text: &str) -> Vec<String> {
    render(
        Fields {
            document_no: iss.doc_no(),
            rev: format!("{:02}", iss.rev),
            sheet: format!("{:02}", iss.sheet),
            description: " Impeller Specification Sheet".to_owned(),
            actual_size: "A4",
            uom: "Metric",
            doctype_db: "Customer Drawings".to_owned(),
            doctype_info: "Customer Drawings".to_owned(),
            lang: "English",
            file_name: file_name.to_owned(),
            file_type: "Pdf",
            order_number: String::new(),
        },
        now_text,
    )
}

/// Builds the ISS-schema sidecar lines for an ISS_MARKED drawing.
pub fn build_iss_marked(iss: &IssMarked, file_name: &str, now_text: &str) -> Vec<String> {
    render(
        Fields {
            document_no: iss.doc_no.clone(),
            rev: format!("{:02}", iss.rev),
            sheet: format!("{:02}", iss.sheet),
            description: " Impeller Specification Sheet".to_owned(),
            actual_size: "A4",
            uom: "Metric",
            doctype_db: "Customer Drawings".to_owned(),
            doctype_info: "Customer Drawings".to_owned(),
            lang: "English",
            file_name: file_name.to_owned(),
            file_type: "Pdf",
            order_number: iss.order_number().to_owned(),
        },
        now_text,
    )
}

/// The current local timestamp formatted the way `Currentdate` expects.
pub fn now_text() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// The sidecar filename for a drawing file: `stem(drawing).DESEDI`.
pub fn sidecar_name(drawing_file_name: &str) -> String {
    let stem = match drawing_file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => drawing_file_name,
    };
    format!("{stem}.DESEDI")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::naming::parse_standard;
    use std::path::Path;

    #[test]
    fn test_standard_schema_fields() {
        let dn = parse_standard("DAM123456R02S01M.tif").unwrap();
        let loc = crate::location::map_location(&dn, Path::new("/archive"));
        let lines = build_standard(&dn, &loc, "2026-07-28 10:00:00");

        assert!(lines.contains(&"DocumentNo=DAM123456".to_owned()));
        assert!(lines.contains(&"DocumentRev=02".to_owned()));
        assert!(lines.contains(&"SheetNumber=01".to_owned()));
        assert!(lines.contains(&"ActualSize=A4".to_owned()));
        assert!(lines.contains(&"UOM=Metric".to_owned()));
        assert!(lines.contains(&"Document_Type=DETAIL".to_owned()));
        assert!(lines.contains(&"DWGLanguage=Italian".to_owned()));
        assert!(lines.contains(&"FileType=Tiff".to_owned()));
        assert!(lines.contains(&"Currentdate=2026-07-28 10:00:00".to_owned()));
    }

    #[test]
    fn test_drawing_info_collapses_doctype() {
        let dn = parse_standard("DAK123456R02S01M.tif").unwrap();
        let loc = crate::location::map_location(&dn, Path::new("/archive"));
        let lines = build_standard(&dn, &loc, "now");
        assert!(lines.contains(&"Document_Type=Customer Drawings".to_owned()));
    }

    #[test]
    fn test_sidecar_name() {
        assert_eq!(sidecar_name("DAM123456R02S01M.tif"), "DAM123456R02S01M.DESEDI");
    }

    #[test]
    fn test_iss_marked_schema_order_number() {
        let iss = IssMarked {
            doc_no: "PO-98765".to_owned(),
            rev: 1,
            sheet: 2,
        };
        let lines = build_iss_marked(&iss, "PO-98765R01S02.pdf", "now");
        assert!(lines.contains(&"DocumentNo=PO-98765".to_owned()));
        assert!(lines.contains(&"OrderNumber=PO".to_owned()));
        assert!(lines.contains(&"FileType=Pdf".to_owned()));
    }
}
