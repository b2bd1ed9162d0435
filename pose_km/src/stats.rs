//! Dispersion statistics per joint and per label.
//!
//! All values are pooled across every frame of every table under a label,
//! on raw sensor axes. Missing cells are dropped per axis, so a gap in `x`
//! never costs the `y` or `z` sample of the same frame.

use std::fmt::Write;

use tracing::{debug, info};

use crate::catalog::JointDef;
use crate::dataset::{GroupedDataset, Label};
use crate::table::{Axis, SampleTable};

/// Streaming population variance (Welford) plus min/max.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Spread {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Spread {
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Combine two partial accumulations (Chan et al.).
    pub fn merge(&mut self, other: &Spread) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let (na, nb) = (self.count as f64, other.count as f64);
        let n = na + nb;
        let delta = other.mean - self.mean;
        self.mean += delta * nb / n;
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Population standard deviation; `None` without samples.
    pub fn std(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.m2.max(0.0) / self.count as f64).sqrt())
    }

    pub fn range(&self) -> Option<f64> {
        (self.count > 0).then(|| self.max - self.min)
    }
}

impl FromIterator<f64> for Spread {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut spread = Spread::default();
        for v in iter {
            spread.push(v);
        }
        spread
    }
}

/// Mean of the defined values, `None` if there are none.
fn mean_defined(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct JointStatistic {
    pub joint: usize,
    pub axes: [Spread; 3],
}

impl JointStatistic {
    pub fn pool(tables: &[SampleTable], joint: usize) -> Self {
        let axes = Axis::ALL.map(|axis| {
            tables
                .iter()
                .flat_map(|t| t.axis_values(joint, axis))
                .collect::<Spread>()
        });
        Self { joint, axes }
    }

    pub fn axis(&self, axis: Axis) -> &Spread {
        &self.axes[axis.offset()]
    }

    /// Mean of the per-axis standard deviations, skipping empty axes.
    pub fn std(&self) -> Option<f64> {
        mean_defined(self.axes.iter().map(Spread::std))
    }

    pub fn range(&self) -> Option<f64> {
        mean_defined(self.axes.iter().map(Spread::range))
    }

    pub fn is_empty(&self) -> bool {
        self.axes.iter().all(|a| a.count() == 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStatistic {
    pub label: Label,
    pub tables: usize,
    pub frames: usize,
    pub joints: Vec<JointStatistic>,
    /// Mean over joints of the joint std; `None` when nothing was usable.
    pub mean_std: Option<f64>,
    /// Same for range; also `None` when ranges were not requested.
    pub mean_range: Option<f64>,
    /// Whole point cloud of the label, every joint pooled, per axis.
    pub cloud: [Spread; 3],
}

impl LabelStatistic {
    pub fn is_undefined(&self) -> bool {
        self.mean_std.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsOptions {
    pub ranges: bool,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self { ranges: true }
    }
}

/// Per-label statistics in dataset discovery order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub ranges: bool,
    entries: Vec<LabelStatistic>,
}

impl Summary {
    pub fn get(&self, label: Label) -> Option<&LabelStatistic> {
        self.entries.iter().find(|s| s.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelStatistic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain-text table of every label.
    pub fn report(&self) -> String {
        let fmt = |v: Option<f64>| v.map_or_else(|| "undefined".to_string(), |v| format!("{v:.3}"));
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>8} {:>6} {:>7} {:>10} {:>10}   spread X/Y/Z (std | range)",
            "label", "tables", "frames", "mean std", "mean range"
        );
        for s in &self.entries {
            let axes: Vec<String> = s
                .cloud
                .iter()
                .map(|a| format!("{}|{}", fmt(a.std()), fmt(a.range())))
                .collect();
            let range = if self.ranges { fmt(s.mean_range) } else { "-".to_string() };
            let _ = writeln!(
                out,
                "{:>8} {:>6} {:>7} {:>10} {:>10}   {}",
                s.label,
                s.tables,
                s.frames,
                fmt(s.mean_std),
                range,
                axes.join("  ")
            );
        }
        out
    }
}

pub fn label_statistic(
    label: Label,
    tables: &[SampleTable],
    catalog: &[JointDef],
    opts: StatsOptions,
) -> LabelStatistic {
    let joints: Vec<JointStatistic> = catalog
        .iter()
        .map(|j| JointStatistic::pool(tables, j.index))
        .collect();

    let mut cloud = [Spread::default(); 3];
    for js in &joints {
        for (acc, axis) in cloud.iter_mut().zip(js.axes.iter()) {
            acc.merge(axis);
        }
    }

    let used = joints.iter().filter(|j| !j.is_empty());
    let mean_std = mean_defined(used.clone().map(JointStatistic::std));
    let mean_range = if opts.ranges {
        mean_defined(used.map(JointStatistic::range))
    } else {
        None
    };

    LabelStatistic {
        label,
        tables: tables.len(),
        frames: tables.iter().map(SampleTable::len).sum(),
        joints,
        mean_std,
        mean_range,
        cloud,
    }
}

/// One entry per label of `dataset`, no more and no fewer.
pub fn compute_label_statistics(
    dataset: &GroupedDataset,
    catalog: &[JointDef],
    opts: StatsOptions,
) -> Summary {
    let entries: Vec<LabelStatistic> = dataset
        .iter()
        .map(|(label, tables)| {
            let stat = label_statistic(label, tables, catalog, opts);
            debug!(
                label,
                mean_std = ?stat.mean_std,
                mean_range = ?stat.mean_range,
                "label statistic"
            );
            stat
        })
        .collect();

    info!(
        labels = entries.len(),
        undefined = entries.iter().filter(|s| s.is_undefined()).count(),
        "statistics computed"
    );
    Summary {
        ranges: opts.ranges,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JOINTS;

    const EPS: f64 = 1e-9;

    fn one_joint(rows: Vec<[Option<f64>; 3]>) -> SampleTable {
        SampleTable::from_rows("mem", 1, rows.into_iter().map(|r| r.to_vec()).collect())
    }

    #[test]
    fn spread_population_std() {
        let s: Spread = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        assert!((s.std().unwrap() - 2.0).abs() < EPS);
        assert_eq!(s.range(), Some(7.0));
        assert_eq!(s.count(), 8);
    }

    #[test]
    fn spread_empty_is_undefined() {
        let s = Spread::default();
        assert_eq!(s.std(), None);
        assert_eq!(s.range(), None);
    }

    #[test]
    fn merge_matches_single_pass() {
        let all: Spread = (0..20).map(|i| (i * i) as f64 * 0.5).collect();
        let mut a: Spread = (0..7).map(|i| (i * i) as f64 * 0.5).collect();
        let b: Spread = (7..20).map(|i| (i * i) as f64 * 0.5).collect();
        a.merge(&b);
        assert_eq!(a.count(), all.count());
        assert!((a.std().unwrap() - all.std().unwrap()).abs() < 1e-9);
        assert_eq!(a.range(), all.range());
    }

    #[test]
    fn single_sample_has_zero_spread() {
        let t = one_joint(vec![[Some(4.0), None, None]]);
        let s = label_statistic(1, &[t], &JOINTS[..1], StatsOptions::default());
        assert_eq!(s.mean_std, Some(0.0));
        assert_eq!(s.mean_range, Some(0.0));
    }

    #[test]
    fn joint_std_averages_defined_axes_only() {
        let t = one_joint(vec![[Some(1.0), None, Some(5.0)], [Some(3.0), None, Some(5.0)]]);
        let js = JointStatistic::pool(&[t], 0);
        assert_eq!(js.axis(Axis::Y).count(), 0);
        assert_eq!(js.std(), Some(0.5));
    }

    #[test]
    fn empty_joints_do_not_drag_the_mean() {
        let t = SampleTable::from_rows(
            "mem",
            2,
            vec![
                vec![Some(0.0), Some(0.0), Some(0.0), None, None, None],
                vec![Some(2.0), Some(2.0), Some(2.0), None, None, None],
            ],
        );
        let s = label_statistic(1, &[t], &JOINTS[..2], StatsOptions::default());
        assert_eq!(s.mean_std, Some(1.0));
        assert_eq!(s.mean_range, Some(2.0));
    }

    #[test]
    fn ranges_can_be_skipped() {
        let t = one_joint(vec![
            [Some(1.0), Some(1.0), Some(1.0)],
            [Some(3.0), Some(1.0), Some(1.0)],
        ]);
        let s = label_statistic(1, &[t], &JOINTS[..1], StatsOptions { ranges: false });
        assert_eq!(s.mean_range, None);
        assert!(s.mean_std.is_some());
    }

    #[test]
    fn cloud_pools_all_joints() {
        let t = SampleTable::from_rows(
            "mem",
            2,
            vec![vec![Some(0.0), Some(1.0), Some(1.0), Some(10.0), Some(1.0), None]],
        );
        let s = label_statistic(1, &[t], &JOINTS[..2], StatsOptions::default());
        assert_eq!(s.cloud[0].range(), Some(10.0));
        assert_eq!(s.cloud[1].std(), Some(0.0));
        assert_eq!(s.cloud[2].count(), 1);
    }

    #[test]
    fn report_marks_undefined_labels() {
        let ds: GroupedDataset = [(9, one_joint(vec![[None, None, None]]))].into_iter().collect();
        let summary = compute_label_statistics(&ds, &JOINTS[..1], StatsOptions::default());
        assert!(summary.get(9).unwrap().is_undefined());
        assert!(summary.report().contains("undefined"));
    }
}
