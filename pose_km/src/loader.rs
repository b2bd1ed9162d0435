//! Dataset discovery and table parsing.
//!
//! Two on-disk layouts are normalized into the same [`GroupedDataset`]:
//!
//! * `PerLabel`:      `<root>/<label>.csv`, rows are `3 × joints` coordinates
//! * `LabelPrefixed`: `<root>/<time folder>/0/<file>.csv`, rows are
//!   `label, HHmmssfff, 3 × joints` coordinates
//!
//! Anything wrong with a single file is a [`LoadWarning`]; the file is skipped
//! and the run continues.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::catalog::JOINT_COUNT;
use crate::dataset::{GroupedDataset, Label};
use crate::error::{LoadError, LoadWarning};
use crate::table::{parse_cell, Frame, SampleTable};

/// Time folders hold their tables one level down, in this subdirectory.
const CAPTURE_SUBDIR: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    PerLabel,
    #[default]
    LabelPrefixed,
}

impl Layout {
    /// Leading non-coordinate columns.
    pub fn prefix_width(self) -> usize {
        match self {
            Layout::PerLabel => 0,
            Layout::LabelPrefixed => 2,
        }
    }

    pub fn row_width(self, joint_count: usize) -> usize {
        self.prefix_width() + 3 * joint_count
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "per_label" | "a" => Ok(Layout::PerLabel),
            "label_prefixed" | "b" => Ok(Layout::LabelPrefixed),
            other => Err(format!("unknown layout '{other}', expected per_label or label_prefixed")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub layout: Layout,
    pub joint_count: usize,
    pub extension: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            joint_count: JOINT_COUNT,
            extension: "csv".to_string(),
        }
    }
}

/// The operator's two free-text picks: a base folder under the data
/// directory and an optional sub-folder inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub base: String,
    pub sub: Option<String>,
}

impl Selection {
    pub fn new(base: impl Into<String>, sub: Option<String>) -> Self {
        let sub = sub.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            base: base.into().trim().to_string(),
            sub,
        }
    }

    pub fn root(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.base)
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub dataset: GroupedDataset,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    fn skip(&mut self, warning: LoadWarning) {
        warn!(%warning, "skipping table");
        self.warnings.push(warning);
    }
}

pub fn load_selection(
    data_dir: &Path,
    selection: &Selection,
    opts: &LoadOptions,
) -> Result<LoadReport, LoadError> {
    load(&selection.root(data_dir), selection.sub.as_deref(), opts)
}

/// Discover and parse every table under `root`.
///
/// `sub` narrows the search: the table directory for `PerLabel`, a single
/// time folder for `LabelPrefixed`.
pub fn load(root: &Path, sub: Option<&str>, opts: &LoadOptions) -> Result<LoadReport, LoadError> {
    if !root.is_dir() {
        return Err(LoadError::MissingRoot(root.to_path_buf()));
    }
    let mut report = LoadReport::default();

    match opts.layout {
        Layout::PerLabel => {
            let dir = existing_dir(root, sub)?;
            let mut files = list_tables(&dir, &opts.extension).map_err(|source| LoadError::Io {
                path: dir.clone(),
                source,
            })?;
            // numeric label order, so 2.csv comes before 10.csv
            files.sort_by_cached_key(|p| (stem_label(p), p.clone()));
            for path in files {
                load_per_label(&path, opts, &mut report);
            }
        }
        Layout::LabelPrefixed => {
            let folders = match sub {
                Some(_) => vec![existing_dir(root, sub)?],
                None => list_dirs(root).map_err(|source| LoadError::Io {
                    path: root.to_path_buf(),
                    source,
                })?,
            };
            for folder in folders {
                let capture = folder.join(CAPTURE_SUBDIR);
                if !capture.is_dir() {
                    debug!(folder = %folder.display(), "no capture directory, ignoring");
                    continue;
                }
                match list_tables(&capture, &opts.extension) {
                    Ok(files) => {
                        for path in files {
                            load_prefixed(&path, opts, &mut report);
                        }
                    }
                    Err(source) => report.skip(LoadWarning::Unreadable { path: capture, source }),
                }
            }
        }
    }

    info!(
        root = %root.display(),
        labels = report.dataset.len(),
        tables = report.dataset.table_count(),
        skipped = report.warnings.len(),
        "dataset loaded"
    );
    Ok(report)
}

fn existing_dir(root: &Path, sub: Option<&str>) -> Result<PathBuf, LoadError> {
    let dir = match sub {
        Some(sub) => root.join(sub),
        None => root.to_path_buf(),
    };
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(LoadError::MissingRoot(dir))
    }
}

fn list_dirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn list_tables(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

fn stem_label(path: &Path) -> Option<Label> {
    parse_label(file_stem(path))
}

fn load_per_label(path: &Path, opts: &LoadOptions, report: &mut LoadReport) {
    let Some(label) = stem_label(path) else {
        report.skip(LoadWarning::Label {
            path: path.to_path_buf(),
            text: file_stem(path).to_string(),
        });
        return;
    };

    match read_rows(path, opts) {
        Ok(rows) => {
            let frames: Vec<Frame> = rows.into_iter().map(|row| row.frame).collect();
            debug!(path = %path.display(), label, frames = frames.len(), "table parsed");
            report
                .dataset
                .insert(label, SampleTable::new(path, opts.joint_count, frames));
        }
        Err(warning) => report.skip(warning),
    }
}

fn load_prefixed(path: &Path, opts: &LoadOptions, report: &mut LoadReport) {
    let rows = match read_rows(path, opts) {
        Ok(rows) => rows,
        Err(warning) => return report.skip(warning),
    };

    // One file may interleave several labels; split it into one table each,
    // keeping the order in which labels first appear.
    let mut per_label: Vec<(Label, Vec<Frame>)> = Vec::new();
    for row in rows {
        let Some(label) = row.label else { continue };
        match per_label.iter_mut().find(|(l, _)| *l == label) {
            Some((_, frames)) => frames.push(row.frame),
            None => per_label.push((label, vec![row.frame])),
        }
    }

    for (label, frames) in per_label {
        debug!(path = %path.display(), label, frames = frames.len(), "table parsed");
        report
            .dataset
            .insert(label, SampleTable::new(path, opts.joint_count, frames));
    }
}

struct Row {
    label: Option<Label>,
    frame: Frame,
}

fn read_rows(path: &Path, opts: &LoadOptions) -> Result<Vec<Row>, LoadWarning> {
    let data = fs::read_to_string(path).map_err(|source| LoadWarning::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse_rows(path, &data, opts)?;
    if rows.is_empty() {
        return Err(LoadWarning::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(rows)
}

fn parse_rows(path: &Path, data: &str, opts: &LoadOptions) -> Result<Vec<Row>, LoadWarning> {
    let width = opts.layout.row_width(opts.joint_count);
    let prefix = opts.layout.prefix_width();
    let mut rows = Vec::new();

    for (n, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = n + 1;
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != width {
            return Err(LoadWarning::Width {
                path: path.to_path_buf(),
                line: line_no,
                expected: width,
                found: parts.len(),
            });
        }

        let (label, stamp) = match opts.layout {
            Layout::PerLabel => (None, None),
            Layout::LabelPrefixed => {
                let label = parse_label(parts[0]).ok_or_else(|| LoadWarning::Label {
                    path: path.to_path_buf(),
                    text: parts[0].trim().to_string(),
                })?;
                (Some(label), parts[1].trim().parse::<u32>().ok())
            }
        };

        let mut cells = Vec::with_capacity(width - prefix);
        for (i, text) in parts.iter().enumerate().skip(prefix) {
            let cell = parse_cell(text).map_err(|_| LoadWarning::Cell {
                path: path.to_path_buf(),
                line: line_no,
                column: i + 1,
                text: text.trim().to_string(),
            })?;
            cells.push(cell);
        }

        rows.push(Row {
            label,
            frame: Frame::new(cells).with_stamp(stamp),
        });
    }
    Ok(rows)
}

fn parse_label(text: &str) -> Option<Label> {
    let t = text.trim();
    t.parse::<Label>().ok().or_else(|| {
        t.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as Label)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn opts(layout: Layout) -> LoadOptions {
        LoadOptions {
            layout,
            joint_count: 1,
            extension: "csv".to_string(),
        }
    }

    fn write(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("nope"), None, &opts(Layout::PerLabel)).unwrap_err();
        assert!(matches!(err, LoadError::MissingRoot(_)));
    }

    #[test]
    fn missing_sub_folder_is_fatal() {
        let dir = tempdir().unwrap();
        let err = load(dir.path(), Some("nope"), &opts(Layout::LabelPrefixed)).unwrap_err();
        assert!(matches!(err, LoadError::MissingRoot(p) if p.ends_with("nope")));
    }

    #[test]
    fn per_label_uses_file_stem() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("3.csv"), "1,2,3\n4,5,6\n");
        write(&dir.path().join("1.csv"), "1,2,3\n");
        write(&dir.path().join("notes.txt"), "ignored");

        let report = load(dir.path(), None, &opts(Layout::PerLabel)).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.dataset.labels(), vec![1, 3]);
        assert_eq!(report.dataset.frame_count(3), 2);
    }

    #[test]
    fn per_label_files_follow_numeric_label_order() {
        let dir = tempdir().unwrap();
        for name in ["10.csv", "9.csv", "2.csv", "-1.csv"] {
            write(&dir.path().join(name), "1,2,3\n");
        }

        let report = load(dir.path(), None, &opts(Layout::PerLabel)).unwrap();
        assert_eq!(report.dataset.labels(), vec![-1, 2, 9, 10]);
    }

    #[test]
    fn unreadable_table_is_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1.csv"), b"\xff\xfe1,2\n").unwrap();
        write(&dir.path().join("2.csv"), "1,2,3\n");

        let report = load(dir.path(), None, &opts(Layout::PerLabel)).unwrap();
        assert_eq!(report.dataset.labels(), vec![2]);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(report.warnings[0], LoadWarning::Unreadable { .. }));
        assert!(report.warnings[0].path().ends_with("1.csv"));
    }

    #[test]
    fn per_label_bad_stem_is_skipped() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("walk.csv"), "1,2,3\n");
        write(&dir.path().join("2.csv"), "1,2,3\n");

        let report = load(dir.path(), None, &opts(Layout::PerLabel)).unwrap();
        assert_eq!(report.dataset.labels(), vec![2]);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(report.warnings[0], LoadWarning::Label { .. }));
    }

    #[test]
    fn prefixed_rows_split_by_label() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("t1/0/pos.csv"),
            "2, 101500000, 1,2,3\n1, 101500066, 4,5,6\n2, 101500133, 7,,9\n",
        );

        let report = load(dir.path(), None, &opts(Layout::LabelPrefixed)).unwrap();
        assert_eq!(report.dataset.labels(), vec![2, 1]);
        let t = &report.dataset.tables(2)[0];
        assert_eq!(t.len(), 2);
        assert_eq!(t.frames()[1].cells, vec![Some(7.0), None, Some(9.0)]);
        assert_eq!(t.stamp_span(), Some((101_500_000, 101_500_133)));
    }

    #[test]
    fn sub_selects_one_time_folder() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("t1/0/pos.csv"), "1,0,1,2,3\n");
        write(&dir.path().join("t2/0/pos.csv"), "2,0,1,2,3\n");

        let report = load(dir.path(), Some("t2"), &opts(Layout::LabelPrefixed)).unwrap();
        assert_eq!(report.dataset.labels(), vec![2]);
    }

    #[test]
    fn empty_and_valid_table_for_same_label() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a/0/pos.csv"), "\n");
        write(&dir.path().join("b/0/pos.csv"), "5,0,1,2,3\n");

        let report = load(dir.path(), None, &opts(Layout::LabelPrefixed)).unwrap();
        assert_eq!(report.dataset.labels(), vec![5]);
        assert_eq!(report.dataset.tables(5).len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(report.warnings[0], LoadWarning::Empty { .. }));
    }

    #[test]
    fn width_mismatch_skips_whole_table() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a/0/pos.csv"), "1,0,1,2,3\n1,0,1,2\n");

        let report = load(dir.path(), None, &opts(Layout::LabelPrefixed)).unwrap();
        assert!(report.dataset.is_empty());
        match &report.warnings[..] {
            [LoadWarning::Width { line, expected, found, .. }] => {
                assert_eq!((*line, *expected, *found), (2, 5, 4));
            }
            other => panic!("unexpected warnings {other:?}"),
        }
    }

    #[test]
    fn garbage_cell_skips_table() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("4.csv"), "1,two,3\n");

        let report = load(dir.path(), None, &opts(Layout::PerLabel)).unwrap();
        assert!(report.dataset.is_empty());
        assert!(matches!(report.warnings[0], LoadWarning::Cell { column: 2, .. }));
    }

    #[test]
    fn layout_names_parse() {
        assert_eq!("per-label".parse::<Layout>(), Ok(Layout::PerLabel));
        assert_eq!("LABEL_PREFIXED".parse::<Layout>(), Ok(Layout::LabelPrefixed));
        assert!("columns".parse::<Layout>().is_err());
        assert_eq!(Layout::LabelPrefixed.row_width(JOINT_COUNT), 98);
    }

    #[test]
    fn labels_accept_whole_floats() {
        assert_eq!(parse_label(" 7 "), Some(7));
        assert_eq!(parse_label("2.0"), Some(2));
        assert_eq!(parse_label("2.5"), None);
    }
}
