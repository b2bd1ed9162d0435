use std::num::ParseFloatError;
use std::path::{Path, PathBuf};

use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn offset(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// One captured frame in canonical shape: `3 × joint_count` cells, x,y,z per
/// joint in catalog order. `None` marks a missing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Capture clock as written by the recorder (`HHmmssfff`), when present.
    pub stamp: Option<u32>,
    pub cells: Vec<Option<f64>>,
}

impl Frame {
    pub fn new(cells: Vec<Option<f64>>) -> Self {
        Self { stamp: None, cells }
    }

    pub fn with_stamp(mut self, stamp: Option<u32>) -> Self {
        self.stamp = stamp;
        self
    }
}

/// One parsed recording. Read-only once built.
#[derive(Debug, Clone)]
pub struct SampleTable {
    source: PathBuf,
    joint_count: usize,
    frames: Vec<Frame>,
}

impl SampleTable {
    /// Frames whose width differs from `3 × joint_count` are a loader bug;
    /// the accessors still never read past a row.
    pub fn new(source: impl Into<PathBuf>, joint_count: usize, frames: Vec<Frame>) -> Self {
        debug_assert!(frames.iter().all(|f| f.cells.len() == 3 * joint_count));
        Self {
            source: source.into(),
            joint_count,
            frames,
        }
    }

    /// Build from plain coordinate rows, mostly for tests and demos.
    pub fn from_rows(
        source: impl Into<PathBuf>,
        joint_count: usize,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Self {
        Self::new(source, joint_count, rows.into_iter().map(Frame::new).collect())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The single place that knows the column layout.
    pub fn coord(&self, frame: usize, joint: usize, axis: Axis) -> Option<f64> {
        if joint >= self.joint_count {
            return None;
        }
        let cell = 3 * joint + axis.offset();
        self.frames
            .get(frame)
            .and_then(|f| f.cells.get(cell).copied().flatten())
            .filter(|v| v.is_finite())
    }

    /// Every present value of one joint axis, in frame order.
    pub fn axis_values(&self, joint: usize, axis: Axis) -> impl Iterator<Item = f64> + '_ {
        (0..self.frames.len()).filter_map(move |f| self.coord(f, joint, axis))
    }

    /// Full position of a joint, only when all three axes are present.
    pub fn position(&self, frame: usize, joint: usize) -> Option<Point3<f64>> {
        Some(Point3::new(
            self.coord(frame, joint, Axis::X)?,
            self.coord(frame, joint, Axis::Y)?,
            self.coord(frame, joint, Axis::Z)?,
        ))
    }

    /// First and last recorder stamps, if the source carried them.
    pub fn stamp_span(&self) -> Option<(u32, u32)> {
        let mut stamps = self.frames.iter().filter_map(|f| f.stamp);
        let first = stamps.next()?;
        let (lo, hi) = stamps.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s)));
        Some((lo, hi))
    }
}

/// Parse one cell. `Ok(None)` is a missing sample; an error is text that is
/// neither a number nor a null marker.
pub fn parse_cell(text: &str) -> Result<Option<f64>, ParseFloatError> {
    let t = text.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    t.parse::<f64>().map(|v| v.is_finite().then_some(v))
}

/// Recorder stamps are `HHmmssfff`; format as `HH:mm:ss.fff`.
pub fn format_stamp(stamp: u32) -> String {
    let ms = stamp % 1000;
    let s = (stamp / 1000) % 100;
    let m = (stamp / 100_000) % 100;
    let h = stamp / 10_000_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_joint_table() -> SampleTable {
        SampleTable::from_rows(
            "mem",
            2,
            vec![
                vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), None, Some(6.0)],
                vec![None, Some(20.0), Some(30.0), Some(40.0), Some(50.0), Some(60.0)],
            ],
        )
    }

    #[test]
    fn coord_reads_joint_axis_offsets() {
        let t = two_joint_table();
        assert_eq!(t.coord(0, 0, Axis::Z), Some(3.0));
        assert_eq!(t.coord(0, 1, Axis::X), Some(4.0));
        assert_eq!(t.coord(1, 1, Axis::Z), Some(60.0));
        assert_eq!(t.coord(0, 1, Axis::Y), None);
    }

    #[test]
    fn coord_out_of_range_is_none() {
        let t = two_joint_table();
        assert_eq!(t.coord(5, 0, Axis::X), None);
        assert_eq!(t.coord(0, 2, Axis::X), None);
    }

    #[test]
    fn axis_values_skip_nulls_per_axis() {
        let t = two_joint_table();
        assert_eq!(t.axis_values(0, Axis::X).collect::<Vec<_>>(), vec![1.0]);
        assert_eq!(t.axis_values(0, Axis::Y).collect::<Vec<_>>(), vec![2.0, 20.0]);
    }

    #[test]
    fn position_needs_all_axes() {
        let t = two_joint_table();
        assert_eq!(t.position(0, 0), Some(Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(t.position(0, 1), None);
        assert_eq!(t.position(1, 0), None);
    }

    #[test]
    fn parse_cell_null_markers() {
        assert_eq!(parse_cell(" 12.5 "), Ok(Some(12.5)));
        assert_eq!(parse_cell(""), Ok(None));
        assert_eq!(parse_cell("NaN"), Ok(None));
        assert_eq!(parse_cell("null"), Ok(None));
        assert!(parse_cell("abc").is_err());
    }

    #[test]
    fn stamps_format_and_span() {
        assert_eq!(format_stamp(142_305_123), "14:23:05.123");
        let t = SampleTable::new(
            "mem",
            0,
            vec![
                Frame::new(vec![]).with_stamp(Some(500)),
                Frame::new(vec![]),
                Frame::new(vec![]).with_stamp(Some(100)),
            ],
        );
        assert_eq!(t.stamp_span(), Some((100, 500)));
    }
}
