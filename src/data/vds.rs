//! VDS (vehicle detection system) exports: discovery, decoding, merge and
//! the processed junction file.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use encoding_rs::EUC_KR;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
    DF,
    constants::traffic::{TARGET_NODES, columns},
};

const UTF8_BOM: &str = "\u{feff}";

/// One detector row. Every field is optional because exports differ in which
/// columns they carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VdsRecord {
    #[serde(rename = "기준시간")]
    pub base_time: Option<String>,
    #[serde(rename = "기준일")]
    pub base_date: Option<String>,
    #[serde(rename = "요일명")]
    pub weekday: Option<String>,
    #[serde(rename = "노드명")]
    pub node: Option<String>,
    #[serde(rename = "교통량")]
    pub volume: Option<f64>,
    #[serde(rename = "평균속도")]
    pub speed: Option<f64>,
    #[serde(rename = "밀도")]
    pub density: Option<f64>,
}

#[derive(Debug, Default)]
pub struct VdsLoadReport {
    pub files_found: usize,
    pub skipped: Vec<(PathBuf, String)>,
    /// Rows across every readable file, before filtering.
    pub merged_rows: usize,
    /// Target-junction rows with positive volume and speed, density filled in.
    pub records: Vec<VdsRecord>,
}

/// Every file inside every `<prefix>*` directory under `base`, sorted by path.
pub fn discover_vds_files(base: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(base)
        .with_context(|| format!("cannot list {}", base.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
        })
        .collect();
    dirs.sort();

    let mut files = Vec::new();
    for dir in dirs {
        let mut inner: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("cannot list {}", dir.display()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        inner.sort();
        files.extend(inner);
    }
    Ok(files)
}

/// `"1,200"` -> 1200.0; blanks and junk -> `None`.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn non_empty(raw: &str) -> Option<String> {
    let t = raw.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Decode an EUC-KR export and keep the wanted columns that exist.
pub fn parse_vds_file(path: &Path) -> Result<Vec<VdsRecord>> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let (text, _, had_errors) = EUC_KR.decode(&bytes);
    if had_errors {
        bail!("{} is not valid EUC-KR", path.display());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches(UTF8_BOM).trim() == name)
    };

    let idx_time = col(columns::BASE_TIME);
    let idx_date = col(columns::BASE_DATE);
    let idx_weekday = col(columns::WEEKDAY);
    let idx_node = col(columns::NODE);
    let idx_volume = col(columns::VOLUME);
    let idx_speed = col(columns::SPEED);

    if [idx_time, idx_date, idx_weekday, idx_node, idx_volume, idx_speed]
        .iter()
        .all(Option::is_none)
    {
        bail!("{} has none of the expected VDS columns", path.display());
    }

    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        out.push(VdsRecord {
            base_time: field(idx_time).and_then(non_empty),
            base_date: field(idx_date).and_then(non_empty),
            weekday: field(idx_weekday).and_then(non_empty),
            node: field(idx_node).and_then(non_empty),
            volume: field(idx_volume).and_then(parse_number),
            speed: field(idx_speed).and_then(parse_number),
            density: None,
        });
    }
    Ok(out)
}

/// Keep target junctions with positive volume and speed; density = volume / speed.
pub fn filter_junctions(records: Vec<VdsRecord>) -> Vec<VdsRecord> {
    records
        .into_iter()
        .filter(|r| r.node.as_deref().is_some_and(|n| TARGET_NODES.contains(&n)))
        .filter_map(|mut r| match (r.volume, r.speed) {
            (Some(v), Some(s)) if v > 0.0 && s > 0.0 => {
                r.density = Some(v / s);
                Some(r)
            }
            _ => None,
        })
        .collect()
}

/// Merge every export under the `<prefix>*` directories of `base`.
/// Unreadable files are logged and skipped.
pub fn load_vds_dir(base: &Path, prefix: &str) -> Result<VdsLoadReport> {
    let files = discover_vds_files(base, prefix)?;
    log::info!("Found {} VDS files under {}", files.len(), base.display());

    // par_iter + collect keeps file order, so the merge is deterministic
    let parsed: Vec<(PathBuf, Result<Vec<VdsRecord>>)> = files
        .par_iter()
        .map(|p| (p.clone(), parse_vds_file(p)))
        .collect();

    let mut report = VdsLoadReport {
        files_found: files.len(),
        ..Default::default()
    };
    let mut merged = Vec::new();
    for (path, result) in parsed {
        match result {
            Ok(rows) => {
                if DF.log_vds_files {
                    log::info!("{}: {} rows", path.display(), rows.len());
                }
                merged.extend(rows);
            }
            Err(e) => {
                log::warn!("Skipping {}: {:#}", path.display(), e);
                report.skipped.push((path, format!("{:#}", e)));
            }
        }
    }

    report.merged_rows = merged.len();
    report.records = filter_junctions(merged);
    Ok(report)
}

/// Write the processed rows as UTF-8 CSV with a BOM.
pub fn save_processed(path: &Path, records: &[VdsRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let mut file =
        fs::File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    file.write_all(UTF8_BOM.as_bytes())?;

    let mut wtr = csv::Writer::from_writer(file);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn load_processed(path: &Path) -> Result<Vec<VdsRecord>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let body = text.strip_prefix(UTF8_BOM).unwrap_or(&text);
    let mut rdr = csv::Reader::from_reader(body.as_bytes());
    let mut out = Vec::new();
    for row in rdr.deserialize() {
        out.push(row.with_context(|| format!("malformed row in {}", path.display()))?);
    }
    Ok(out)
}
