use std::rc::Rc;

use kiss3d::text::Font;
use kiss3d::window::Window;
use nalgebra::{Point2, Point3};
use pose_km::render::{Bar, BarSink, ScatterSink, Series};
use pose_km::Label;

// ---------------------------------------------------------------------------
// Plot frame → display
//   Plot:   X = right, Y = away from the sensor, Z = up
//   kiss3d: X = right, Y = up,                  Z = toward camera
// ---------------------------------------------------------------------------

fn to_display(p: &Point3<f32>) -> Point3<f32> {
    Point3::new(p.x, p.z, -p.y)
}

// ---------------------------------------------------------------------------
// Point cloud of the current label
// ---------------------------------------------------------------------------

/// Immediate-mode scatter buffer, redrawn every frame until the next clear.
#[derive(Default)]
pub struct PointCloud {
    points: Vec<(Point3<f32>, Point3<f32>)>,
}

impl ScatterSink for PointCloud {
    fn clear(&mut self) {
        self.points.clear();
    }

    fn point(&mut self, position: Point3<f32>, color: [f32; 3]) {
        self.points
            .push((to_display(&position), Point3::new(color[0], color[1], color[2])));
    }
}

impl PointCloud {
    pub fn centroid(&self) -> Option<Point3<f32>> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f32;
        let sum = self
            .points
            .iter()
            .fold(Point3::origin(), |acc: Point3<f32>, (p, _)| acc + p.coords);
        Some(sum / n)
    }

    /// Lowest display height, where the ground grid goes.
    pub fn floor(&self) -> Option<f32> {
        self.points.iter().map(|(p, _)| p.y).reduce(f32::min)
    }

    pub fn draw(&self, window: &mut Window) {
        for (p, color) in &self.points {
            window.draw_point(p, color);
        }
    }
}

pub fn draw_ground_grid(window: &mut Window, center: &Point3<f32>, floor: f32, half: f32) {
    let grid_color = Point3::new(0.25f32, 0.25, 0.25);
    for i in -5..=5 {
        let v = i as f32 * half / 5.0;
        window.draw_line(
            &Point3::new(center.x - half, floor, center.z + v),
            &Point3::new(center.x + half, floor, center.z + v),
            &grid_color,
        );
        window.draw_line(
            &Point3::new(center.x + v, floor, center.z - half),
            &Point3::new(center.x + v, floor, center.z + half),
            &grid_color,
        );
    }
}

// ---------------------------------------------------------------------------
// Summary bar chart, drawn as a 2D overlay in the lower-left corner
// ---------------------------------------------------------------------------

const PANEL_MARGIN: f32 = 24.0;
const MAX_SLOT_WIDTH: f32 = 48.0;

fn series_color(series: Series, highlighted: bool) -> Point3<f32> {
    let (r, g, b) = match series {
        Series::MeanStd => (0.3, 0.6, 1.0),   // blue
        Series::MeanRange => (1.0, 0.6, 0.2), // orange
    };
    if highlighted {
        Point3::new(r, g, b)
    } else {
        Point3::new(r * 0.5, g * 0.5, b * 0.5)
    }
}

/// Collects the bars once; the overlay only changes which label is lit.
#[derive(Default)]
pub struct BarOverlay {
    bars: Vec<Bar>,
    slots: usize,
    series: usize,
}

impl BarSink for BarOverlay {
    fn bar(&mut self, bar: Bar) {
        self.slots = self.slots.max(bar.slot + 1);
        self.series = self.series.max(series_column(bar.series) + 1);
        self.bars.push(bar);
    }
}

fn series_column(series: Series) -> usize {
    match series {
        Series::MeanStd => 0,
        Series::MeanRange => 1,
    }
}

impl BarOverlay {
    pub fn draw(&self, window: &mut Window, font: &Rc<Font>, current: Label) {
        if self.bars.is_empty() {
            return;
        }
        let (w, h) = (window.width() as f32, window.height() as f32);

        // planar coordinates: origin at the window center, y up
        let left = -w / 2.0 + PANEL_MARGIN;
        let base = -h / 2.0 + PANEL_MARGIN * 2.0;
        let slot_w = ((w * 0.4) / self.slots as f32).min(MAX_SLOT_WIDTH);
        let panel_h = h * 0.2;
        let bar_w = slot_w * 0.8 / self.series as f32;

        let axis_color = Point3::new(0.5f32, 0.5, 0.5);
        window.draw_planar_line(
            &Point2::new(left, base),
            &Point2::new(left + slot_w * self.slots as f32, base),
            &axis_color,
        );
        window.draw_planar_line(
            &Point2::new(left, base),
            &Point2::new(left, base + panel_h),
            &axis_color,
        );

        for bar in &self.bars {
            let x0 = left
                + slot_w * (bar.slot as f32 + 0.1)
                + bar_w * series_column(bar.series) as f32;
            let color = series_color(bar.series, bar.label == current);
            match bar.value {
                Some(_) => {
                    let top = base + bar.height * panel_h;
                    let mut x = x0;
                    while x < x0 + bar_w - 1.0 {
                        window.draw_planar_line(
                            &Point2::new(x, base),
                            &Point2::new(x, top),
                            &color,
                        );
                        x += 1.0;
                    }
                }
                None => {
                    // undefined: a cross on the baseline instead of a bar
                    let s = bar_w.min(8.0) / 2.0;
                    let cx = x0 + bar_w / 2.0;
                    let cy = base + s;
                    window.draw_planar_line(
                        &Point2::new(cx - s, cy - s),
                        &Point2::new(cx + s, cy + s),
                        &color,
                    );
                    window.draw_planar_line(
                        &Point2::new(cx - s, cy + s),
                        &Point2::new(cx + s, cy - s),
                        &color,
                    );
                }
            }
        }

        // text coordinates: origin top-left, y down
        let text_color = Point3::new(0.7f32, 0.7, 0.7);
        let label_y = h - PANEL_MARGIN * 1.8;
        for bar in self.bars.iter().filter(|b| b.series == Series::MeanStd) {
            let x = w / 2.0 + left + slot_w * bar.slot as f32;
            let color = if bar.label == current {
                Point3::new(1.0, 1.0, 1.0)
            } else {
                text_color
            };
            let text = bar.label.to_string();
            window.draw_text(&text, &Point2::new(x, label_y), 22.0, font, &color);
        }

        let mut title_x = PANEL_MARGIN;
        let title_y = h / 2.0 - base - panel_h - PANEL_MARGIN;
        for series in [Series::MeanStd, Series::MeanRange] {
            if series_column(series) < self.series {
                window.draw_text(
                    series.title(),
                    &Point2::new(title_x, title_y),
                    22.0,
                    font,
                    &series_color(series, true),
                );
                title_x += 140.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_frame_is_y_up() {
        let mut cloud = PointCloud::default();
        cloud.point(Point3::new(1.0, 2.0, 3.0), [1.0, 0.0, 0.0]);
        cloud.point(Point3::new(3.0, 2.0, -1.0), [0.0, 1.0, 0.0]);
        assert_eq!(cloud.points[0].0, Point3::new(1.0, 3.0, -2.0));
        assert_eq!(cloud.centroid(), Some(Point3::new(2.0, 1.0, -2.0)));
        assert_eq!(cloud.floor(), Some(-1.0));

        cloud.clear();
        assert_eq!(cloud.centroid(), None);
    }

    #[test]
    fn overlay_counts_slots_and_series() {
        let mut overlay = BarOverlay::default();
        for (slot, series) in [(0, Series::MeanStd), (2, Series::MeanStd), (0, Series::MeanRange)] {
            overlay.bar(Bar {
                series,
                slot,
                label: slot as Label,
                value: None,
                height: 0.0,
            });
        }
        assert_eq!((overlay.slots, overlay.series), (3, 2));
    }
}
