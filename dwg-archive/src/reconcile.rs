//! The revision-reconciliation decision procedure.
//!
//! [`reconcile`] is pure: it never touches the filesystem. It consumes the
//! new drawing's parsed attributes plus the same-document index (already
//! restricted to the same sheet) and produces an ordered list of [`Intent`]s
//! for the effector to execute.

use std::path::PathBuf;

use crate::index::SameDocEntry;
use crate::naming::{DrawingName, MetricGroup};

pub const REASON_FORMATO_ERRATO: &str = "Formato Errato";
pub const REASON_LOCATION_ERRATA: &str = "Location Errata";
pub const REASON_METRICA_ERRATA: &str = "Metrica Errata";
pub const REASON_PARI_REVISIONE: &str = "Pari Revisione";
/// Spelling preserved verbatim for log compatibility with the historical
/// system; see SPEC_FULL.md §9.
pub const REASON_REVISIONE_PRECEDENTE: &str = "Revisione Precendente";
pub const REASON_CONFLITTO_METRICA_DN: &str = "Conflitto Metrica (DN a pari revisione)";
pub const REASON_CONFLITTO_METRICA_MI: &str = "Conflitto Metrica (MI a pari revisione)";
pub const REASON_CONFLITTO_METRICA_DN_DIVERSA: &str = "Conflitto Metrica (D/N a pari revisione)";
pub const REASON_METRICA_DIVERSA: &str = "Metrica Diversa";
pub const REASON_REV_SUPERATA: &str = "Rev superata";
pub const REASON_LEGACY_NON_STANDARD: &str = "Legacy non standard";
pub const REASON_ARCHIVIATO: &str = "Archiviato";

const VALID_FORMATS: &str = "ABCDE";
const VALID_LOCATIONS: &str = "MKFTESNP";
const VALID_METRICS: &str = "MIDN";

/// The terminal classification of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected,
    Duplicate,
}

/// A single ordered side effect the effector must carry out, or a pure log
/// event with no filesystem action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Move the new file from its source path into the archive target
    /// directory.
    MoveToArchive,
    /// Demote an already-archived `name` to the historical tree, for
    /// `reason` (`Rev superata` or `Legacy non standard`).
    MoveToHistorical { name: String, reason: &'static str },
    /// Route the new file to the reject directory.
    MoveToReject {
        reason: &'static str,
        reference: Option<String>,
    },
    /// Route the new file to the duplicate directory.
    MoveToDuplicate,
    /// Replicate the archived new file into the PLM export directory.
    CopyToPlm,
    /// Write the standard-schema sidecar for the new file.
    WriteSidecar,
    /// A log-only event: no filesystem action, just a `processed` record.
    Processed {
        reason: &'static str,
        reference: Option<String>,
    },
}

/// The reconciler's verdict: a terminal [`Outcome`] plus the ordered intents
/// to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub outcome: Outcome,
    pub intents: Vec<Intent>,
}

impl Decision {
    fn rejected(reason: &'static str, reference: Option<String>) -> Decision {
        Decision {
            outcome: Outcome::Rejected,
            intents: vec![Intent::MoveToReject { reason, reference }],
        }
    }

    fn duplicate() -> Decision {
        Decision {
            outcome: Outcome::Duplicate,
            intents: vec![Intent::MoveToDuplicate],
        }
    }
}

fn max_rev<'a>(entries: impl IntoIterator<Item = &'a SameDocEntry>) -> Option<u8> {
    entries.into_iter().map(|e| e.revision).max()
}

/// Runs the decision procedure for `new` against `same_sheet` (the
/// same-document index already restricted to `new.sheet`) and
/// `legacy_non_standard` (names sharing the doc-no prefix that are not
/// STANDARD-parseable).
pub fn reconcile(
    new: &DrawingName,
    same_sheet: &[&SameDocEntry],
    legacy_non_standard: &[String],
) -> Decision {
    if !VALID_FORMATS.contains(new.format.to_ascii_uppercase()) {
        return Decision::rejected(REASON_FORMATO_ERRATO, None);
    }
    if !VALID_LOCATIONS.contains(new.location.to_ascii_uppercase()) {
        return Decision::rejected(REASON_LOCATION_ERRATA, None);
    }
    if !VALID_METRICS.contains(new.metric.to_ascii_uppercase()) {
        return Decision::rejected(REASON_METRICA_ERRATA, None);
    }

    let same_sheet: Vec<&SameDocEntry> = same_sheet.iter().copied().collect();

    let new_name = new.filename();
    if same_sheet
        .iter()
        .any(|e| e.name == new_name && e.revision == new.revision)
    {
        return Decision::duplicate();
    }

    let new_metric = new.metric.to_ascii_uppercase();
    let new_group = new.metric_group();

    let same_mi: Vec<&SameDocEntry> = same_sheet
        .iter()
        .copied()
        .filter(|e| matches!(e.metric, 'M' | 'I'))
        .collect();
    let same_dn: Vec<&SameDocEntry> = same_sheet
        .iter()
        .copied()
        .filter(|e| matches!(e.metric, 'D' | 'N'))
        .collect();
    let same_own: Vec<&SameDocEntry> = same_sheet
        .iter()
        .copied()
        .filter(|e| e.metric == new_metric)
        .collect();

    let max_mi = max_rev(same_mi.iter().copied());
    let max_dn = max_rev(same_dn.iter().copied());
    let own_max = max_rev(same_own.iter().copied());

    let (other_group, other_max) = match new_group {
        MetricGroup::Mi => (&same_dn, max_dn),
        MetricGroup::Dn => (&same_mi, max_mi),
    };

    if let Some(other_max) = other_max {
        if new.revision < other_max {
            let reference = other_group
                .iter()
                .find(|e| e.revision == other_max)
                .map(|e| e.name.clone());
            return Decision::rejected(REASON_REVISIONE_PRECEDENTE, reference);
        }
    }
    if let Some(own_max) = own_max {
        if new.revision < own_max {
            let reference = same_own
                .iter()
                .find(|e| e.revision == own_max)
                .map(|e| e.name.clone());
            return Decision::rejected(REASON_REVISIONE_PRECEDENTE, reference);
        }
    }

    let mut metrica_diversa: Option<Intent> = None;
    match new_group {
        MetricGroup::Mi => {
            if let Some(e) = same_dn.iter().find(|e| e.revision == new.revision) {
                return Decision::rejected(REASON_CONFLITTO_METRICA_DN, Some(e.name.clone()));
            }
            if let Some(e) = same_mi
                .iter()
                .find(|e| e.revision == new.revision && e.metric != new_metric)
            {
                metrica_diversa = Some(Intent::Processed {
                    reason: REASON_METRICA_DIVERSA,
                    reference: Some(e.name.clone()),
                });
            }
        }
        MetricGroup::Dn => {
            if let Some(e) = same_mi.iter().find(|e| e.revision == new.revision) {
                return Decision::rejected(REASON_CONFLITTO_METRICA_MI, Some(e.name.clone()));
            }
            if let Some(e) = same_dn
                .iter()
                .find(|e| e.revision == new.revision && e.metric != new_metric)
            {
                return Decision::rejected(
                    REASON_CONFLITTO_METRICA_DN_DIVERSA,
                    Some(e.name.clone()),
                );
            }
        }
    }

    // Fall-through: accept as the new current revision.
    let mut intents = Vec::new();
    if let Some(event) = metrica_diversa {
        intents.push(event);
    }
    intents.push(Intent::MoveToArchive);

    if own_max.is_none() || new.revision > own_max.unwrap() {
        for e in &same_own {
            if e.revision < new.revision {
                intents.push(Intent::MoveToHistorical {
                    name: e.name.clone(),
                    reason: REASON_REV_SUPERATA,
                });
            }
        }
    }
    if let Some(other_max) = other_max {
        if new.revision > other_max {
            for e in other_group {
                if e.revision < new.revision {
                    intents.push(Intent::MoveToHistorical {
                        name: e.name.clone(),
                        reason: REASON_REV_SUPERATA,
                    });
                }
            }
        }
    }

    for name in legacy_non_standard {
        intents.push(Intent::MoveToHistorical {
            name: name.clone(),
            reason: REASON_LEGACY_NON_STANDARD,
        });
    }

    intents.push(Intent::CopyToPlm);
    intents.push(Intent::WriteSidecar);
    intents.push(Intent::Processed {
        reason: REASON_ARCHIVIATO,
        reference: None,
    });

    Decision {
        outcome: Outcome::Accepted,
        intents,
    }
}

/// The historical destination directory for a demoted archive entry's name,
/// given the format letter parsed from that name (or `None` if it is a
/// legacy non-standard name, in which case the caller falls back to an
/// "unknown" historical bucket).
pub fn historical_format_letter(name: &str) -> Option<char> {
    crate::naming::parse_standard(name).map(|dn| dn.format.to_ascii_uppercase())
}

/// Convenience used by tests and the orchestrator to build the archive path
/// a [`Intent::MoveToArchive`] targets.
pub fn archive_dest(target_dir: &std::path::Path, new: &DrawingName) -> PathBuf {
    target_dir.join(new.filename())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::naming::parse_standard;

    fn entry(name: &str) -> SameDocEntry {
        let dn = parse_standard(name).unwrap();
        SameDocEntry {
            revision: dn.revision,
            name: name.to_owned(),
            metric: dn.metric.to_ascii_uppercase(),
            sheet: dn.sheet,
        }
    }

    #[test]
    fn test_fresh_accept_empty_archive() {
        let new = parse_standard("DAM123456R02S01M.tif").unwrap();
        let decision = reconcile(&new, &[], &[]);
        assert_eq!(decision.outcome, Outcome::Accepted);
        assert_eq!(
            decision.intents,
            vec![
                Intent::MoveToArchive,
                Intent::CopyToPlm,
                Intent::WriteSidecar,
                Intent::Processed {
                    reason: REASON_ARCHIVIATO,
                    reference: None
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_reject() {
        let existing = entry("DAM123456R02S01M.tif");
        let new = parse_standard("DAM123456R02S01M.tif").unwrap();
        let same_sheet = vec![&existing];
        let decision = reconcile(&new, &same_sheet, &[]);
        assert_eq!(decision.outcome, Outcome::Duplicate);
        assert_eq!(decision.intents, vec![Intent::MoveToDuplicate]);
    }

    #[test]
    fn test_supersede_same_metric() {
        let existing = entry("DAM123456R01S01M.tif");
        let new = parse_standard("DAM123456R02S01M.tif").unwrap();
        let same_sheet = vec![&existing];
        let decision = reconcile(&new, &same_sheet, &[]);
        assert_eq!(decision.outcome, Outcome::Accepted);
        assert_eq!(
            decision.intents,
            vec![
                Intent::MoveToArchive,
                Intent::MoveToHistorical {
                    name: "DAM123456R01S01M.tif".to_owned(),
                    reason: REASON_REV_SUPERATA
                },
                Intent::CopyToPlm,
                Intent::WriteSidecar,
                Intent::Processed {
                    reason: REASON_ARCHIVIATO,
                    reference: None
                },
            ]
        );
    }

    #[test]
    fn test_metric_conflict_dn_rejects_mi_at_same_rev() {
        let existing = entry("DAM123456R02S01D.tif");
        let new = parse_standard("DAM123456R02S01M.tif").unwrap();
        let same_sheet = vec![&existing];
        let decision = reconcile(&new, &same_sheet, &[]);
        assert_eq!(decision.outcome, Outcome::Rejected);
        assert_eq!(
            decision.intents,
            vec![Intent::MoveToReject {
                reason: REASON_CONFLITTO_METRICA_DN,
                reference: Some("DAM123456R02S01D.tif".to_owned()),
            }]
        );
    }

    #[test]
    fn test_older_than_opposite_group_rejects() {
        let existing = entry("DAM123456R05S01M.tif");
        let new = parse_standard("DAM123456R03S01D.tif").unwrap();
        let same_sheet = vec![&existing];
        let decision = reconcile(&new, &same_sheet, &[]);
        assert_eq!(decision.outcome, Outcome::Rejected);
        assert_eq!(
            decision.intents,
            vec![Intent::MoveToReject {
                reason: REASON_REVISIONE_PRECEDENTE,
                reference: Some("DAM123456R05S01M.tif".to_owned()),
            }]
        );
    }

    #[test]
    fn test_metrica_diversa_is_informational_accept() {
        let existing = entry("DAM123456R02S01I.tif");
        let new = parse_standard("DAM123456R02S01M.tif").unwrap();
        let same_sheet = vec![&existing];
        let decision = reconcile(&new, &same_sheet, &[]);
        assert_eq!(decision.outcome, Outcome::Accepted);
        assert_eq!(
            decision.intents[0],
            Intent::Processed {
                reason: REASON_METRICA_DIVERSA,
                reference: Some("DAM123456R02S01I.tif".to_owned()),
            }
        );
        assert!(decision.intents.contains(&Intent::MoveToArchive));
    }

    #[test]
    fn test_dn_same_rev_different_metric_is_rejected() {
        let existing = entry("DAM123456R02S01N.tif");
        let new = parse_standard("DAM123456R02S01D.tif").unwrap();
        let same_sheet = vec![&existing];
        let decision = reconcile(&new, &same_sheet, &[]);
        assert_eq!(decision.outcome, Outcome::Rejected);
        assert_eq!(
            decision.intents,
            vec![Intent::MoveToReject {
                reason: REASON_CONFLITTO_METRICA_DN_DIVERSA,
                reference: Some("DAM123456R02S01N.tif".to_owned()),
            }]
        );
    }

    #[test]
    fn test_bad_format_rejects_before_duplicate_check() {
        // Format letter Z is not in {A,B,C,D,E} but still matches the
        // STANDARD grammar's broader [A-Z] character class.
        let new = parse_standard("DZM123456R02S01M.tif").unwrap();
        let decision = reconcile(&new, &[], &[]);
        assert_eq!(decision.outcome, Outcome::Rejected);
        assert_eq!(
            decision.intents,
            vec![Intent::MoveToReject {
                reason: REASON_FORMATO_ERRATO,
                reference: None,
            }]
        );
    }

    #[test]
    fn test_bad_metric_rejects() {
        let new = parse_standard("DAM123456R02S01Z.tif").unwrap();
        let decision = reconcile(&new, &[], &[]);
        assert_eq!(decision.outcome, Outcome::Rejected);
        assert_eq!(
            decision.intents,
            vec![Intent::MoveToReject {
                reason: REASON_METRICA_ERRATA,
                reference: None,
            }]
        );
    }

    #[test]
    fn test_legacy_non_standard_is_historicized_on_accept() {
        let new = parse_standard("DAM123456R02S01M.tif").unwrap();
        let legacy = vec!["DAM123456_oldscan.tif".to_owned()];
        let decision = reconcile(&new, &[], &legacy);
        assert!(decision.intents.contains(&Intent::MoveToHistorical {
            name: "DAM123456_oldscan.tif".to_owned(),
            reason: REASON_LEGACY_NON_STANDARD,
        }));
    }
}
