//! Batch orchestrator: drives one pass over the plotter directory and the
//! three auxiliary ingest directories, and optionally loops on a watch
//! interval behind a single-worker try-lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use log::debug;

use crate::config::Config;
use crate::effector;
use crate::event::{self, EventSink, PhaseGuard};
use crate::index;
use crate::location;
use crate::naming::{self, DrawingName, IssIntakeName};
use crate::orient;
use crate::reconcile::{self, Decision, Intent};
use crate::sidecar;
use crate::Result;

const REASON_NOME_FILE_ERRATO: &str = "Nome File Errato";
const REASON_IMMAGINE_GIRATA: &str = "Immagine Girata";
const REASON_PRESENTE_IN_STORICO: &str = "Presente in Storico";
const REASON_NOME_ISS_ERRATO: &str = "Nome ISS Errato";
const REASON_NOME_FIV_ERRATO: &str = "Nome FIV Errato";
const REASON_HENG_AMBIGUO: &str = "HENG: doppio disegno/DESEDI";

const DEFAULT_STATS_EVERY_SECS: u64 = 300;
const MIN_STATS_EVERY_SECS: u64 = 10;

fn stats_every() -> Duration {
    let secs = std::env::var("SWARKY_STATS_EVERY")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&v| v >= MIN_STATS_EVERY_SECS)
        .unwrap_or(DEFAULT_STATS_EVERY_SECS);
    Duration::from_secs(secs)
}

/// Result of attempting to trigger a pass.
#[derive(Debug)]
pub enum RunOutcome {
    Ran,
    Busy,
}

/// Owns the single-worker try-lock and the periodic-stats debounce state
/// across repeated passes.
pub struct Orchestrator {
    busy: AtomicBool,
    last_stats: Mutex<Option<Instant>>,
    candidates_seen: AtomicU64,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Orchestrator {
            busy: AtomicBool::new(false),
            last_stats: Mutex::new(None),
            candidates_seen: AtomicU64::new(0),
        }
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Orchestrator::default()
    }

    /// Attempts to run one pass. Returns [`RunOutcome::Busy`] immediately,
    /// without blocking, if another pass is already running.
    pub fn try_run_once(&self, config: &Config, sink: &dyn EventSink) -> Result<RunOutcome> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(RunOutcome::Busy);
        }
        let result = self.run_once(config, sink);
        self.busy.store(false, Ordering::SeqCst);
        result.map(|()| RunOutcome::Ran)
    }

    fn run_once(&self, config: &Config, sink: &dyn EventSink) -> Result<()> {
        let start = Instant::now();
        let mut log_lines = Vec::new();

        {
            let _phase = PhaseGuard::start_if("plotter_pass", config.log_phases, sink);
            self.plotter_pass(config, sink, &mut log_lines)?;
        }
        {
            let _phase = PhaseGuard::start_if("iss_ingest", config.log_phases, sink);
            self.iss_ingest(config, sink, &mut log_lines)?;
        }
        {
            let _phase = PhaseGuard::start_if("fiv_ingest", config.log_phases, sink);
            self.fiv_ingest(config, sink, &mut log_lines)?;
        }
        {
            let _phase = PhaseGuard::start_if("heng_ingest", config.log_phases, sink);
            self.heng_ingest(config, sink, &mut log_lines)?;
        }

        let elapsed = start.elapsed();
        log_lines.push(format!(
            "ProcessTime # {:02}:{:02}",
            elapsed.as_secs() / 60,
            elapsed.as_secs() % 60
        ));

        let monthly = monthly_log_path(&config.paths.log_dir);
        effector::write_lines(&monthly, &log_lines)?;

        self.maybe_emit_stats(config);
        Ok(())
    }

    fn maybe_emit_stats(&self, config: &Config) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let due = {
            let mut last = self.last_stats.lock().unwrap();
            let due = last.map(|t| t.elapsed() >= stats_every()).unwrap_or(true);
            if due {
                *last = Some(Instant::now());
            }
            due
        };
        if !due {
            return;
        }
        debug!(
            "queue depths: reject={} duplicate={} heng_in={} tables={} plm_error={} (candidates seen this run: {})",
            count_entries(&config.paths.reject_dir),
            count_entries(&config.paths.duplicate_dir),
            count_entries(&config.paths.heng_in),
            count_entries(&config.paths.tables_dir),
            count_entries(&config.paths.plm_error_dir),
            self.candidates_seen.load(Ordering::Relaxed),
        );
    }

    fn plotter_pass(
        &self,
        config: &Config,
        sink: &dyn EventSink,
        log_lines: &mut Vec<String>,
    ) -> Result<()> {
        let mut candidates = Vec::new();
        let read_dir = match std::fs::read_dir(&config.paths.plotter_in) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in read_dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let lower = name.to_ascii_lowercase();
            let accepted = lower.ends_with(".tif")
                || lower.ends_with(".tiff")
                || (config.accept_pdf && lower.ends_with(".pdf"));
            if accepted {
                candidates.push(entry.path());
            }
        }
        candidates.sort();

        for path in candidates {
            self.candidates_seen.fetch_add(1, Ordering::Relaxed);
            let path = match normalize_suffix(&path) {
                Ok(p) => p,
                Err(e) => {
                    log::error!("normalizing extension for {}: {e}", path.display());
                    continue;
                }
            };
            if let Err(e) = self.process_candidate(config, sink, log_lines, &path) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                log::error!("unexpected error processing {name}: {e}");
                record_error(log_lines, sink, &name, "Errore inatteso", "");
            }
        }
        Ok(())
    }

    fn process_candidate(
        &self,
        config: &Config,
        sink: &dyn EventSink,
        log_lines: &mut Vec<String>,
        path: &Path,
    ) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let new = match naming::parse_standard(&name) {
            Some(dn) => dn,
            None => {
                effector::move_to_reject(path, &config.paths.reject_dir)?;
                record_error(log_lines, sink, &name, REASON_NOME_FILE_ERRATO, "");
                return Ok(());
            }
        };

        if !orient::ok(path) {
            effector::move_to_reject(path, &config.paths.reject_dir)?;
            record_error(log_lines, sink, &name, REASON_IMMAGINE_GIRATA, "");
            return Ok(());
        }

        let loc = location::map_location(&new, &config.paths.archive_root);
        let (same_doc, legacy) = index::list_same_doc(&loc.target_dir, &new.doc_no())?;
        let same_sheet = index::same_sheet(&same_doc, &new);

        let decision = reconcile::reconcile(&new, &same_sheet, &legacy);
        self.apply_decision(config, sink, log_lines, path, &new, &loc, decision)?;
        Ok(())
    }

    fn apply_decision(
        &self,
        config: &Config,
        sink: &dyn EventSink,
        log_lines: &mut Vec<String>,
        src: &Path,
        new: &DrawingName,
        loc: &location::LocationInfo,
        decision: Decision,
    ) -> Result<()> {
        let name = new.filename();
        let mut current_path: Option<PathBuf> = Some(src.to_path_buf());

        for intent in decision.intents {
            match intent {
                Intent::MoveToArchive => {
                    let dest = reconcile::archive_dest(&loc.target_dir, new);
                    let from = current_path.take().unwrap_or_else(|| dest.clone());
                    effector::move_to(&from, &dest)?;
                    current_path = Some(dest);
                }
                Intent::MoveToHistorical {
                    name: old_name,
                    reason,
                } => {
                    let old_src = loc.target_dir.join(&old_name);
                    let format = reconcile::historical_format_letter(&old_name).unwrap_or('X');
                    let dest = location::historical_dir_for(&config.paths.historical_root, format)
                        .join(&old_name);
                    let (moved, _rc) = effector::move_to_historical(&old_src, &dest)?;
                    if !moved {
                        effector::move_to_reject(&old_src, &config.paths.reject_dir)?;
                        record_error(log_lines, sink, &old_name, REASON_PRESENTE_IN_STORICO, "");
                    } else {
                        record_processed(log_lines, sink, &old_name, &loc.log_name, reason, "Storico");
                    }
                }
                Intent::MoveToReject { reason, reference } => {
                    if let Some(p) = current_path.take() {
                        effector::move_to_reject(&p, &config.paths.reject_dir)?;
                    }
                    record_error(
                        log_lines,
                        sink,
                        &name,
                        reason,
                        reference.as_deref().unwrap_or(""),
                    );
                    return Ok(());
                }
                Intent::MoveToDuplicate => {
                    if let Some(p) = current_path.take() {
                        let dest = config.paths.duplicate_dir.join(&name);
                        effector::move_to(&p, &dest)?;
                    }
                    record_error(log_lines, sink, &name, reconcile::REASON_PARI_REVISIONE, "");
                    return Ok(());
                }
                Intent::CopyToPlm => {
                    if let Some(p) = &current_path {
                        let dest = config.paths.plm_out.join(&name);
                        effector::copy_or_link(p, &dest)?;
                    }
                }
                Intent::WriteSidecar => {
                    let lines = sidecar::build_standard(new, loc, &sidecar::now_text());
                    let dest = config.paths.plm_out.join(sidecar::sidecar_name(&name));
                    effector::write_once(&dest, &lines)?;
                }
                Intent::Processed { reason, reference } => {
                    record_processed(
                        log_lines,
                        sink,
                        &name,
                        &loc.log_name,
                        reason,
                        reference.as_deref().unwrap_or(""),
                    );
                }
            }
        }

        Ok(())
    }

    fn iss_ingest(
        &self,
        config: &Config,
        sink: &dyn EventSink,
        log_lines: &mut Vec<String>,
    ) -> Result<()> {
        let read_dir = match std::fs::read_dir(&config.paths.iss_in) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let lower = entry.file_name().to_string_lossy().to_ascii_lowercase();
            if lower.ends_with(".pdf") {
                files.push(entry.path());
            }
        }
        files.sort();

        let mut iss_log = Vec::new();
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let now = sidecar::now_text();
            let (lines, doc_stem) = match naming::parse_for_iss_intake(&name) {
                Some(IssIntakeName::Classic(c)) => {
                    (sidecar::build_iss_classic(&c, &name, &now), c.doc_no())
                }
                Some(IssIntakeName::Marked(m)) => {
                    (sidecar::build_iss_marked(&m, &name, &now), m.doc_no.clone())
                }
                Some(IssIntakeName::Standard(dn)) => {
                    let loc = location::map_location(&dn, &config.paths.archive_root);
                    (sidecar::build_standard(&dn, &loc, &now), dn.doc_no())
                }
                None => {
                    if let Err(e) = effector::move_to_reject(&path, &config.paths.plm_error_dir) {
                        log::error!("ISS reject move failed for {name}: {e}");
                    }
                    record_error(log_lines, sink, &name, REASON_NOME_ISS_ERRATO, "");
                    continue;
                }
            };

            let dest = config.paths.plm_out.join(&name);
            let sidecar_dest = config.paths.plm_out.join(sidecar::sidecar_name(&name));
            let result =
                effector::move_to(&path, &dest).and_then(|()| effector::write_once(&sidecar_dest, &lines));
            match result {
                Ok(_) => {
                    record_processed(log_lines, sink, &name, "ISS", "ISS", "");
                    let stem = name
                        .rsplit_once('.')
                        .map(|(s, _)| s.to_owned())
                        .unwrap_or_else(|| doc_stem.clone());
                    iss_log.push(format!("{} # {}", timestamp_prefix(), stem));
                }
                Err(e) => {
                    log::error!("ISS ingest failed for {name}: {e}");
                    record_error(log_lines, sink, &name, "Errore inatteso", "");
                }
            }
        }

        if !iss_log.is_empty() {
            effector::write_lines(&config.paths.iss_in.join("SwarkyISS.log"), &iss_log)?;
        }
        Ok(())
    }

    fn fiv_ingest(
        &self,
        config: &Config,
        sink: &dyn EventSink,
        log_lines: &mut Vec<String>,
    ) -> Result<()> {
        let read_dir = match std::fs::read_dir(&config.paths.fiv_in) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let lower = entry.file_name().to_string_lossy().to_ascii_lowercase();
            let accepted = lower.ends_with(".tif")
                || lower.ends_with(".tiff")
                || (config.accept_pdf && lower.ends_with(".pdf"));
            if accepted {
                files.push(entry.path());
            }
        }
        files.sort();

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dn = match naming::parse_standard(&name) {
                Some(dn) => dn,
                None => {
                    if let Err(e) = effector::move_to_reject(&path, &config.paths.plm_error_dir) {
                        log::error!("FIV reject move failed for {name}: {e}");
                    }
                    record_error(log_lines, sink, &name, REASON_NOME_FIV_ERRATO, "");
                    continue;
                }
            };

            let loc = location::map_location(&dn, &config.paths.archive_root);
            let lines = sidecar::build_standard(&dn, &loc, &sidecar::now_text());
            let sidecar_dest = config.paths.plm_out.join(sidecar::sidecar_name(&name));
            let dest = config.paths.plm_out.join(&name);
            let result =
                effector::write_once(&sidecar_dest, &lines).and_then(|_| effector::move_to(&path, &dest));
            match result {
                Ok(_) => record_processed(log_lines, sink, &name, "FIV", "FIV loading", ""),
                Err(e) => {
                    log::error!("FIV ingest failed for {name}: {e}");
                    record_error(log_lines, sink, &name, "Errore inatteso", "");
                }
            }
        }
        Ok(())
    }

    fn heng_ingest(
        &self,
        config: &Config,
        sink: &dyn EventSink,
        log_lines: &mut Vec<String>,
    ) -> Result<()> {
        let read_dir = match std::fs::read_dir(&config.paths.heng_in) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut drawings: std::collections::HashMap<String, Vec<PathBuf>> =
            std::collections::HashMap::new();
        let mut sidecars: std::collections::HashMap<String, Vec<PathBuf>> =
            std::collections::HashMap::new();

        for entry in read_dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let lower = name.to_ascii_lowercase();
            let Some((stem, _)) = name.rsplit_once('.') else {
                continue;
            };
            let stem_key = stem.to_ascii_lowercase();

            if lower.ends_with(".pdf") || lower.ends_with(".tif") || lower.ends_with(".tiff") {
                drawings.entry(stem_key).or_default().push(path);
            } else if lower.ends_with(".desedi") {
                sidecars.entry(stem_key).or_default().push(path);
            }
        }

        let mut stems: Vec<&String> = drawings.keys().chain(sidecars.keys()).collect();
        stems.sort();
        stems.dedup();

        for stem in stems {
            let drawing_group = drawings.get(stem);
            let sidecar_group = sidecars.get(stem);

            let (Some(dwgs), Some(scs)) = (drawing_group, sidecar_group) else {
                continue;
            };
            if dwgs.len() != 1 || scs.len() != 1 {
                let label = dwgs
                    .first()
                    .or_else(|| scs.first())
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| stem.clone());
                record_error(log_lines, sink, &label, REASON_HENG_AMBIGUO, "");
                continue;
            }

            let drawing = &dwgs[0];
            let sidecar_path = &scs[0];
            let dwg_name = drawing.file_name().unwrap().to_string_lossy().into_owned();
            let sc_name = sidecar_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned();

            let result = effector::move_to(drawing, &config.paths.plm_out.join(&dwg_name))
                .and_then(|()| effector::move_to(sidecar_path, &config.paths.plm_out.join(&sc_name)));
            match result {
                Ok(()) => {
                    record_processed(log_lines, sink, &dwg_name, "HENG", "Hengelo \u{2192} PLM", "PLM")
                }
                Err(e) => {
                    log::error!("HENG pair move failed for {dwg_name}/{sc_name}: {e}");
                    record_error(log_lines, sink, &dwg_name, "Errore inatteso", &sc_name);
                }
            }
        }
        Ok(())
    }

    /// Repeats [`Self::try_run_once`] with a sleep of `interval_secs`
    /// between passes. `cancel` is observed between passes, not during one.
    pub fn watch_loop(
        &self,
        config: &Config,
        sink: &dyn EventSink,
        interval_secs: u64,
        cancel: &AtomicBool,
    ) -> Result<()> {
        loop {
            if cancel.load(Ordering::SeqCst) {
                return Ok(());
            }
            self.try_run_once(config, sink)?;
            sleep_cancellable(Duration::from_secs(interval_secs.max(1)), cancel);
        }
    }
}

fn sleep_cancellable(total: Duration, cancel: &AtomicBool) {
    const TICK: Duration = Duration::from_millis(200);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(TICK);
        thread::sleep(step);
        remaining -= step;
    }
}

fn record_processed(
    log_lines: &mut Vec<String>,
    sink: &dyn EventSink,
    name: &str,
    location: &str,
    process: &str,
    reference: &str,
) {
    log_lines.push(event::processed_line(name, location, process, reference));
    sink.processed(name, location, process, reference);
}

fn record_error(
    log_lines: &mut Vec<String>,
    sink: &dyn EventSink,
    name: &str,
    reason: &str,
    reference: &str,
) {
    log_lines.push(event::error_line(name, reason, reference));
    sink.error(name, reason, reference);
}

fn timestamp_prefix() -> String {
    Local::now().format("%d.%b.%Y # %H:%M:%S").to_string()
}

fn monthly_log_path(log_dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%b.%Y").to_string();
    log_dir.join(format!("Swarky_{stamp}.log"))
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok()).count())
        .unwrap_or(0)
}

/// Renames `.TIF`/`.TIFF` (any-case) to `.tif`, returning the possibly-new
/// path. Falls back to the original path if the rename fails.
fn normalize_suffix(path: &Path) -> Result<PathBuf> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(path.to_path_buf());
    };
    if ext == "tif" || ext.eq_ignore_ascii_case("pdf") {
        return Ok(path.to_path_buf());
    }
    if ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff") {
        let new_path = path.with_extension("tif");
        if std::fs::rename(path, &new_path).is_ok() {
            return Ok(new_path);
        }
    }
    Ok(path.to_path_buf())
}
