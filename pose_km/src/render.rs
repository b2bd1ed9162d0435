//! Contracts between the core and whatever draws it, plus the render-time
//! axis remap and the summary bar layout.

use nalgebra::Point3;

use crate::dataset::Label;
use crate::error::ConfigError;
use crate::stats::{LabelStatistic, Summary};

/// Destination for the 3D point cloud of one label.
pub trait ScatterSink {
    /// Drop everything drawn so far.
    fn clear(&mut self);
    fn point(&mut self, position: Point3<f32>, color: [f32; 3]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    MeanStd,
    MeanRange,
}

impl Series {
    pub fn title(self) -> &'static str {
        match self {
            Series::MeanStd => "mean std",
            Series::MeanRange => "mean range",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub series: Series,
    /// Position of the label in discovery order.
    pub slot: usize,
    pub label: Label,
    /// `None` for labels without usable samples.
    pub value: Option<f64>,
    /// `value` relative to the largest value of the same series, `0..=1`.
    pub height: f32,
}

/// Destination for the summary bar chart.
pub trait BarSink {
    fn bar(&mut self, bar: Bar);
}

/// Emit one bar per label for mean std and, when ranges were computed, a
/// second series for mean range. Each series is scaled on its own maximum.
pub fn render_summary<S: BarSink + ?Sized>(summary: &Summary, sink: &mut S) {
    let mut series = vec![Series::MeanStd];
    if summary.ranges {
        series.push(Series::MeanRange);
    }

    for s in series {
        let value_of = |label: &LabelStatistic| match s {
            Series::MeanStd => label.mean_std,
            Series::MeanRange => label.mean_range,
        };
        let max = summary
            .iter()
            .filter_map(value_of)
            .fold(0.0f64, f64::max);

        for (slot, stat) in summary.iter().enumerate() {
            let value = value_of(stat);
            let height = match value {
                Some(v) if max > 0.0 => (v / max) as f32,
                _ => 0.0,
            };
            sink.bar(Bar {
                series: s,
                slot,
                label: stat.label,
                value,
                height,
            });
        }
    }
}

/// Render-time axis permutation with optional sign flips.
///
/// Written as one axis letter per output slot, each optionally prefixed with
/// `-`: `"xz-y"` maps raw `(x, y, z)` to `(x, z, -y)`, turning the sensor's
/// y-down camera frame into a z-up plot frame. Statistics never see this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRemap {
    slots: [(f64, usize); 3],
}

impl Default for AxisRemap {
    fn default() -> Self {
        Self {
            slots: [(1.0, 0), (1.0, 2), (-1.0, 1)],
        }
    }
}

impl AxisRemap {
    pub fn identity() -> Self {
        Self {
            slots: [(1.0, 0), (1.0, 1), (1.0, 2)],
        }
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let err = |why| ConfigError::Remap(s.to_string(), why);
        let mut slots = [(1.0, 0); 3];
        let mut chars = s.chars().filter(|c| !c.is_whitespace());
        for slot in &mut slots {
            let c = chars.next().ok_or_else(|| err("needs three axes"))?;
            let (sign, axis_char) = if c == '-' {
                (-1.0, chars.next().ok_or_else(|| err("missing axis after '-'"))?)
            } else {
                (1.0, c)
            };
            let idx = match axis_char.to_ascii_lowercase() {
                'x' => 0,
                'y' => 1,
                'z' => 2,
                _ => return Err(err("axes must be x, y or z")),
            };
            *slot = (sign, idx);
        }
        if chars.next().is_some() {
            return Err(err("more than three axes"));
        }
        let mut seen = [false; 3];
        for (_, idx) in slots {
            if std::mem::replace(&mut seen[idx], true) {
                return Err(err("axis used twice"));
            }
        }
        Ok(Self { slots })
    }

    pub fn apply(&self, p: &Point3<f64>, scale: f64) -> Point3<f32> {
        let v = [p.x, p.y, p.z];
        let out = |i: usize| (self.slots[i].0 * v[self.slots[i].1] * scale) as f32;
        Point3::new(out(0), out(1), out(2))
    }
}
