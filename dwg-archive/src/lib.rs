//! Classification, revision reconciliation and filesystem archival for
//! engineering drawing intake.
//!
//! The crate is layered leaves-first: [`naming`] and [`location`] are pure
//! parsers/mappers, [`index`] and [`reconcile`] form the pure decision
//! core, [`sidecar`] and [`orient`] are pure builders/oracles, and
//! [`effector`]/[`orchestrator`] are the only modules that touch disk.

mod config;
mod effector;
mod error;
mod event;
mod index;
mod location;
mod naming;
mod orchestrator;
mod orient;
mod reconcile;
mod sidecar;

pub use config::{Config, Paths};
pub use effector::{copy_or_link, move_to, move_to_historical, move_to_reject, write_lines, write_once};
pub use error::{Error, Result};
pub use event::{error_line, processed_line, EventSink, LogSink, PhaseGuard};
pub use index::{list_same_doc, same_sheet, SameDocEntry};
pub use location::{
    historical_dir_for, map_location, size_from_letter, uom_from_letter, DocType, Lang,
    LocationInfo,
};
pub use naming::{
    parse_for_iss_intake, parse_iss, parse_standard, DrawingName, Ext, IssClassic, IssIntakeName,
    IssMarked, IssName, MetricGroup,
};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use orient::ok as orientation_ok;
pub use reconcile::{archive_dest, historical_format_letter, reconcile, Decision, Intent, Outcome};
pub use sidecar::{
    build_iss_classic, build_iss_marked, build_standard, now_text, sidecar_name, SidecarSchema,
};
