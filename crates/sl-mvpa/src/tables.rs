//! Tabular inputs: subject roster, ROI catalog and trial labels.

use serde::Deserialize;
use sl_core::{Error, Modality, Result, TrialLabel};
use std::path::{Path, PathBuf};

use crate::config::InputLayout;

/// Roster, included ROIs and trial labels, loaded once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Subjects in roster order
    pub subjects: Vec<String>,
    /// Included ROI labels in catalog order
    pub rois: Vec<String>,
    /// One row per beta volume
    pub labels: Vec<TrialLabel>,
}

impl Dataset {
    /// Read the three tables named by `layout`.
    pub fn load(layout: &InputLayout) -> Result<Self> {
        let subjects = read_roster(&layout.roster)?;
        let rois = read_roi_catalog(&layout.roi_catalog)?;
        let labels = read_trial_labels(&layout.labels)?;
        tracing::info!(
            subjects = subjects.len(),
            rois = rois.len(),
            trials = labels.len(),
            "inputs loaded"
        );
        Ok(Self { subjects, rois, labels })
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    participant_id: String,
}

#[derive(Debug, Deserialize)]
struct RoiRow {
    label: String,
    #[serde(default)]
    input: String,
}

#[derive(Debug, Deserialize)]
struct LabelRow {
    participant_id: String,
    modality: String,
    correct: String,
    lexicon: String,
}

/// Subject identifiers from a tab-separated roster with `participant_id`.
pub fn read_roster(path: &Path) -> Result<Vec<String>> {
    let rows: Vec<RosterRow> = read_rows(path, b'\t', "subject roster")?;
    Ok(rows.into_iter().map(|r| r.participant_id).collect())
}

/// Labels of the ROIs whose `input` column equals 1.
pub fn read_roi_catalog(path: &Path) -> Result<Vec<String>> {
    let rows: Vec<RoiRow> = read_rows(path, b',', "ROI catalog")?;
    Ok(rows
        .into_iter()
        .filter(|r| r.input.trim().parse::<f64>().is_ok_and(|v| v == 1.0))
        .map(|r| r.label)
        .collect())
}

/// Trial table in volume order. Extra columns are ignored.
pub fn read_trial_labels(path: &Path) -> Result<Vec<TrialLabel>> {
    let rows: Vec<LabelRow> = read_rows(path, b'\t', "trial labels")?;
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| {
            let correct = parse_flag(&r.correct).ok_or_else(|| Error::Table {
                path: path.to_path_buf(),
                message: format!("row {}: cannot read `correct` value '{}'", i + 1, r.correct),
            })?;
            Ok(TrialLabel {
                participant_id: r.participant_id,
                modality: Modality::new(r.modality),
                correct,
                lexicon: r.lexicon,
            })
        })
        .collect()
}

/// `1`, `1.0`, `true`, `True` (and the zero/false forms).
pub fn parse_flag(raw: &str) -> Option<bool> {
    let s = raw.trim();
    match s {
        "true" | "True" | "TRUE" => return Some(true),
        "false" | "False" | "FALSE" => return Some(false),
        _ => {}
    }
    match s.parse::<f64>() {
        Ok(v) if v == 1.0 => Some(true),
        Ok(v) if v == 0.0 => Some(false),
        _ => None,
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path, delimiter: u8, role: &str) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(Error::MissingInput { role: role.to_string(), path: path.to_path_buf() });
    }
    let table_err = |e: csv::Error| Error::Table { path: PathBuf::from(path), message: e.to_string() };
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(table_err)?;
    rdr.deserialize().collect::<std::result::Result<Vec<T>, _>>().map_err(table_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(name: &str, body: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let p = std::env::temp_dir()
            .join(format!("sl_mvpa_tables_{}_{}_{}", std::process::id(), nanos, name));
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn flags_accept_pandas_spellings() {
        for (raw, want) in [("1", true), ("0", false), ("1.0", true), ("0.0", false), ("True", true), ("false", false)] {
            assert_eq!(parse_flag(raw), Some(want), "{raw}");
        }
        assert_eq!(parse_flag("yes"), None);
        assert_eq!(parse_flag("0.5"), None);
    }

    #[test]
    fn roi_catalog_keeps_included_rows() {
        let p = write("rois.csv", "label,input,note\nlvOT,1,x\nrSTG,0,y\nlIFG,1.0,z\nlPC,,w\n");
        assert_eq!(read_roi_catalog(&p).unwrap(), vec!["lvOT".to_string(), "lIFG".to_string()]);
        let _ = std::fs::remove_file(p);
    }

    #[test]
    fn trial_labels_ignore_extra_columns() {
        let p = write(
            "labels.tsv",
            "trial\tparticipant_id\tmodality\tcorrect\tlexicon\n\
             0\tsub-01\tV\t1\tword\n\
             1\tsub-01\tA\t0.0\tpseudoword\n",
        );
        let rows = read_trial_labels(&p).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].modality, Modality::new("V"));
        assert!(rows[0].correct);
        assert!(!rows[1].correct);
        assert_eq!(rows[1].lexicon, "pseudoword");
        let _ = std::fs::remove_file(p);
    }

    #[test]
    fn bad_flag_is_a_table_error() {
        let p = write("bad.tsv", "participant_id\tmodality\tcorrect\tlexicon\nsub-01\tV\tmaybe\tword\n");
        assert!(matches!(read_trial_labels(&p), Err(Error::Table { .. })));
        let _ = std::fs::remove_file(p);
    }

    #[test]
    fn missing_table_names_its_role() {
        let err = read_roster(Path::new("/nonexistent/participants_final.tsv")).unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
        assert!(err.to_string().contains("subject roster"));
    }
}
