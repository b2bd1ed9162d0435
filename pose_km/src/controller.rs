//! Label cycling state machine and the scatter redraw it drives.
//!
//! ```text
//!   labels[0] ──advance──▶ labels[1] ──advance──▶ … ──advance──▶ labels[n-1]
//!       ▲                                                            │
//!       └──────────────────────────advance───────────────────────────┘
//! ```

use tracing::debug;

use crate::catalog::JointDef;
use crate::dataset::{GroupedDataset, Label};
use crate::error::ControllerError;
use crate::render::{AxisRemap, ScatterSink};

/// The only mutable state of the viewer: which label is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCycle {
    labels: Vec<Label>,
    current: usize,
}

impl LabelCycle {
    pub fn new(labels: Vec<Label>) -> Result<Self, ControllerError> {
        if labels.is_empty() {
            return Err(ControllerError::EmptyLabelSet);
        }
        Ok(Self { labels, current: 0 })
    }

    pub fn current(&self) -> Label {
        self.labels[self.current]
    }

    /// 1-based position for display.
    pub fn position(&self) -> (usize, usize) {
        (self.current + 1, self.labels.len())
    }

    pub fn advance(&mut self) -> Label {
        self.current = (self.current + 1) % self.labels.len();
        self.current()
    }
}

/// What the last redraw put on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawInfo {
    pub label: Label,
    pub tables: usize,
    pub frames: usize,
    pub points: usize,
    /// Earliest and latest recorder stamps across the label's tables.
    pub span: Option<(u32, u32)>,
}

pub struct Controller<'a> {
    dataset: &'a GroupedDataset,
    catalog: &'a [JointDef],
    remap: AxisRemap,
    scale: f64,
    cycle: LabelCycle,
}

impl<'a> Controller<'a> {
    pub fn new(
        dataset: &'a GroupedDataset,
        catalog: &'a [JointDef],
        remap: AxisRemap,
        scale: f64,
    ) -> Result<Self, ControllerError> {
        Ok(Self {
            dataset,
            catalog,
            remap,
            scale,
            cycle: LabelCycle::new(dataset.labels())?,
        })
    }

    pub fn cycle(&self) -> &LabelCycle {
        &self.cycle
    }

    /// Move to the next label and repaint the sink with it.
    pub fn advance<S: ScatterSink + ?Sized>(&mut self, sink: &mut S) -> RedrawInfo {
        let label = self.cycle.advance();
        debug!(label, "advance");
        self.redraw(sink)
    }

    /// Clear the sink and draw every complete joint position of the current
    /// label. Depends only on the dataset and the current label.
    pub fn redraw<S: ScatterSink + ?Sized>(&self, sink: &mut S) -> RedrawInfo {
        let label = self.cycle.current();
        let tables = self.dataset.tables(label);
        sink.clear();

        let mut points = 0;
        for table in tables {
            debug!(
                label,
                source = %table.source().display(),
                frames = table.len(),
                "drawing table"
            );
            for frame in 0..table.len() {
                for joint in self.catalog {
                    if let Some(p) = table.position(frame, joint.index) {
                        sink.point(self.remap.apply(&p, self.scale), joint.color_f32());
                        points += 1;
                    }
                }
            }
        }

        let span = tables
            .iter()
            .filter_map(|t| t.stamp_span())
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)));

        RedrawInfo {
            label,
            tables: tables.len(),
            frames: self.dataset.frame_count(label),
            points,
            span,
        }
    }
}
