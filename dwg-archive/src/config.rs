//! Configuration loading: a JSON file describing the archival paths and
//! the handful of runtime toggles the original operator's control panel
//! exposed.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::Result;

#[derive(Debug, Deserialize)]
struct PathsRaw {
    hplotter: PathBuf,
    archivio: PathBuf,
    error_dir: PathBuf,
    pari_rev: PathBuf,
    plm: PathBuf,
    storico: PathBuf,
    iss: PathBuf,
    fiv: PathBuf,
    heng: PathBuf,
    error_plm: PathBuf,
    tab: PathBuf,
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ConfigRaw {
    paths: PathsRaw,
    #[serde(rename = "AUTO_TIME", default)]
    auto_time: String,
    #[serde(rename = "LOG_LEVEL", default = "default_log_level")]
    log_level: String,
    #[serde(rename = "ACCEPT_PDF", default)]
    accept_pdf: bool,
    #[serde(rename = "LOG_PHASES", default)]
    log_phases: bool,
}

fn default_log_level() -> String {
    "INFO".to_owned()
}

/// Resolved, directory-validated archival paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Incoming plotter directory (candidates for the main pass).
    pub plotter_in: PathBuf,
    /// Archive root for accepted drawings.
    pub archive_root: PathBuf,
    /// Reject directory for rejected anomalies.
    pub reject_dir: PathBuf,
    /// Duplicate directory for "Pari Revisione" anomalies.
    pub duplicate_dir: PathBuf,
    /// PLM export directory.
    pub plm_out: PathBuf,
    /// Historical tree root.
    pub historical_root: PathBuf,
    /// ISS ingest incoming directory.
    pub iss_in: PathBuf,
    /// FIV ingest incoming directory.
    pub fiv_in: PathBuf,
    /// HENG ingest incoming directory.
    pub heng_in: PathBuf,
    /// PLM-side error directory.
    pub plm_error_dir: PathBuf,
    /// Lookup-tables directory.
    pub tables_dir: PathBuf,
    /// Monthly-log directory.
    pub log_dir: PathBuf,
}

/// The loaded, validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub paths: Paths,
    pub auto_time: String,
    pub log_level: String,
    pub accept_pdf: bool,
    pub log_phases: bool,
}

fn require_dir(path: &Path, field: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::Config(format!(
            "configured path `{field}` ({}) does not exist or is not a directory",
            path.display()
        )));
    }
    Ok(())
}

impl Config {
    /// Loads and validates a configuration file at `path`. All path fields
    /// except `log_dir` must already exist as directories; `log_dir`
    /// defaults to `hplotter` and is not required to pre-exist.
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let raw: ConfigRaw = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;

        for (field, p) in [
            ("hplotter", &raw.paths.hplotter),
            ("archivio", &raw.paths.archivio),
            ("error_dir", &raw.paths.error_dir),
            ("pari_rev", &raw.paths.pari_rev),
            ("plm", &raw.paths.plm),
            ("storico", &raw.paths.storico),
            ("iss", &raw.paths.iss),
            ("fiv", &raw.paths.fiv),
            ("heng", &raw.paths.heng),
            ("error_plm", &raw.paths.error_plm),
            ("tab", &raw.paths.tab),
        ] {
            require_dir(p, field)?;
        }

        let log_dir = raw
            .paths
            .log_dir
            .unwrap_or_else(|| raw.paths.hplotter.clone());

        Ok(Config {
            paths: Paths {
                plotter_in: raw.paths.hplotter,
                archive_root: raw.paths.archivio,
                reject_dir: raw.paths.error_dir,
                duplicate_dir: raw.paths.pari_rev,
                plm_out: raw.paths.plm,
                historical_root: raw.paths.storico,
                iss_in: raw.paths.iss,
                fiv_in: raw.paths.fiv,
                heng_in: raw.paths.heng,
                plm_error_dir: raw.paths.error_plm,
                tables_dir: raw.paths.tab,
                log_dir,
            },
            auto_time: raw.auto_time,
            log_level: raw.log_level,
            accept_pdf: raw.accept_pdf,
            log_phases: raw.log_phases,
        })
    }
}
