//! Joint-position dispersion statistics for labelled body-tracking captures.

pub mod catalog;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod render;
pub mod stats;
pub mod table;

pub use catalog::{JointDef, JOINTS, JOINT_COUNT};
pub use config::ViewerConfig;
pub use controller::{Controller, LabelCycle, RedrawInfo};
pub use dataset::{GroupedDataset, Label};
pub use loader::{load, load_selection, Layout, LoadOptions, LoadReport, Selection};
pub use render::{render_summary, AxisRemap, Bar, BarSink, ScatterSink, Series};
pub use stats::{compute_label_statistics, StatsOptions, Summary};
pub use table::{Axis, SampleTable};
