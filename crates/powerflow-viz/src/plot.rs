use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use powerflow_core::{PowerflowError, PowerflowResult};

use crate::font::{draw_text, draw_text_vertical, text_height, text_width};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

const TITLE_SCALE: u32 = 3;
const LABEL_SCALE: u32 = 2;
const TICK_SCALE: u32 = 2;
const TICK_LENGTH: i64 = 5;
const TARGET_TICKS: usize = 6;

/// Data range of one axis plus its tick positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub ticks: Vec<f64>,
    /// Decimal places used for tick labels
    pub decimals: usize,
}

impl Axis {
    /// Axis covering `values` with 5% padding on both sides.
    pub fn fit(values: impl IntoIterator<Item = f64>) -> Self {
        let (lo, hi) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let (lo, hi) = if !lo.is_finite() || !hi.is_finite() {
            (0.0, 1.0)
        } else if (hi - lo).abs() < 1e-12 {
            let half = if lo.abs() > 1e-12 { lo.abs() * 0.05 } else { 0.5 };
            (lo - half, hi + half)
        } else {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        };

        let step = nice_step((hi - lo) / (TARGET_TICKS - 1) as f64);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        let ticks = (first..=last).map(|k| k as f64 * step).collect();
        let decimals = (-step.log10().floor()).max(0.0) as usize;

        Self {
            min: lo,
            max: hi,
            ticks,
            decimals,
        }
    }

    pub fn label(&self, value: f64) -> String {
        let text = format!("{:.*}", self.decimals, value);
        // avoid "-0.00"
        if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
            text[1..].to_string()
        } else {
            text
        }
    }

    /// Map `value` to `[0, 1]` along the axis.
    fn fraction(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

/// Round `raw` up to 1, 2, 2.5 or 5 times a power of ten.
pub fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

#[derive(Debug, Clone)]
pub struct ScatterPlot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
    pub width: u32,
    pub height: u32,
    pub marker_radius: u32,
    pub marker_color: Rgb<u8>,
    pub grid: bool,
}

impl Default for ScatterPlot {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            points: Vec::new(),
            width: 1000,
            height: 600,
            marker_radius: 5,
            marker_color: BLUE,
            grid: true,
        }
    }
}

/// Pixel rectangle of the plotting area.
struct Frame {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl ScatterPlot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_points(mut self, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        self.points = points.into_iter().collect();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }

    pub fn x_axis(&self) -> Axis {
        Axis::fit(self.points.iter().map(|p| p.0))
    }

    pub fn y_axis(&self) -> Axis {
        Axis::fit(self.points.iter().map(|p| p.1))
    }

    pub fn render(&self) -> PowerflowResult<RgbImage> {
        if self.width < 200 || self.height < 150 {
            return Err(PowerflowError::Render(format!(
                "plot size {}x{} is too small",
                self.width, self.height
            )));
        }
        if let Some(bad) = self
            .points
            .iter()
            .find(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(PowerflowError::Render(format!(
                "cannot plot non-finite point ({}, {})",
                bad.0, bad.1
            )));
        }

        let x_axis = self.x_axis();
        let y_axis = self.y_axis();
        let mut img = RgbImage::from_pixel(self.width, self.height, WHITE);

        let y_tick_width = y_axis
            .ticks
            .iter()
            .map(|&t| text_width(&y_axis.label(t), TICK_SCALE))
            .max()
            .unwrap_or(0) as i64;
        let frame = Frame {
            left: 20 + text_height(LABEL_SCALE) as i64 + 10 + y_tick_width + 8,
            top: 20 + text_height(TITLE_SCALE) as i64 + 15,
            right: self.width as i64 - 30,
            bottom: self.height as i64
                - (20 + text_height(LABEL_SCALE) as i64 + 10 + text_height(TICK_SCALE) as i64 + 8),
        };
        let plot_w = (frame.right - frame.left) as f64;
        let plot_h = (frame.bottom - frame.top) as f64;
        let to_px = |x: f64| frame.left + (x_axis.fraction(x) * plot_w).round() as i64;
        let to_py = |y: f64| frame.bottom - (y_axis.fraction(y) * plot_h).round() as i64;

        if self.grid {
            for &t in &x_axis.ticks {
                vline(&mut img, to_px(t), frame.top, frame.bottom, GRID);
            }
            for &t in &y_axis.ticks {
                hline(&mut img, frame.left, frame.right, to_py(t), GRID);
            }
        }

        hline(&mut img, frame.left, frame.right, frame.top, BLACK);
        hline(&mut img, frame.left, frame.right, frame.bottom, BLACK);
        vline(&mut img, frame.left, frame.top, frame.bottom, BLACK);
        vline(&mut img, frame.right, frame.top, frame.bottom, BLACK);

        for &t in &x_axis.ticks {
            let px = to_px(t);
            vline(&mut img, px, frame.bottom, frame.bottom + TICK_LENGTH, BLACK);
            let label = x_axis.label(t);
            let w = text_width(&label, TICK_SCALE) as i64;
            let y = frame.bottom + TICK_LENGTH + 4;
            draw_text(&mut img, px - w / 2, y, &label, TICK_SCALE, BLACK);
        }
        for &t in &y_axis.ticks {
            let py = to_py(t);
            hline(&mut img, frame.left - TICK_LENGTH, frame.left, py, BLACK);
            let label = y_axis.label(t);
            let w = text_width(&label, TICK_SCALE) as i64;
            let h = text_height(TICK_SCALE) as i64;
            let x = frame.left - TICK_LENGTH - 4 - w;
            draw_text(&mut img, x, py - h / 2, &label, TICK_SCALE, BLACK);
        }

        let centre_x = (frame.left + frame.right) / 2;
        let centre_y = (frame.top + frame.bottom) / 2;

        let w = text_width(&self.title, TITLE_SCALE) as i64;
        draw_text(&mut img, centre_x - w / 2, 20, &self.title, TITLE_SCALE, BLACK);

        let w = text_width(&self.x_label, LABEL_SCALE) as i64;
        let y = self.height as i64 - 20 - text_height(LABEL_SCALE) as i64;
        draw_text(&mut img, centre_x - w / 2, y, &self.x_label, LABEL_SCALE, BLACK);

        let h = text_width(&self.y_label, LABEL_SCALE) as i64;
        draw_text_vertical(&mut img, 20, centre_y - h / 2, &self.y_label, LABEL_SCALE, BLACK);

        for &(x, y) in &self.points {
            disc(&mut img, to_px(x), to_py(y), self.marker_radius as i64, self.marker_color);
        }

        Ok(img)
    }

    /// Render and encode as PNG.
    pub fn render_png(&self) -> PowerflowResult<Vec<u8>> {
        let img = self.render()?;
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png)
            .map_err(|err| PowerflowError::Render(format!("PNG encoding failed: {err}")))?;
        Ok(bytes.into_inner())
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn hline(img: &mut RgbImage, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
    for x in x0.min(x1)..=x0.max(x1) {
        put(img, x, y, color);
    }
}

fn vline(img: &mut RgbImage, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
    for y in y0.min(y1)..=y0.max(y1) {
        put(img, x, y, color);
    }
}

fn disc(img: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nice_steps() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-12;
        assert!(close(nice_step(0.88), 1.0));
        assert!(close(nice_step(0.013), 0.02));
        assert!(close(nice_step(2.3), 2.5));
        assert!(close(nice_step(40.0), 50.0));
        assert_eq!(nice_step(0.0), 1.0);
    }

    #[test]
    fn hop_axis_gets_integer_ticks() {
        let axis = Axis::fit([0.0, 1.0, 2.0, 4.0]);
        assert_eq!(axis.ticks, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(axis.decimals, 0);
        assert_eq!(axis.label(3.0), "3");
        assert!(axis.min < 0.0 && axis.max > 4.0);
    }

    #[test]
    fn voltage_axis_ticks_stay_inside_range() {
        let axis = Axis::fit([0.9576, 1.0, 1.04]);
        assert!(axis.ticks.len() >= 4 && axis.ticks.len() <= 8, "{:?}", axis.ticks);
        assert!(axis.ticks.iter().all(|t| *t >= axis.min && *t <= axis.max));
        assert_eq!(axis.decimals, 2);
    }

    #[test]
    fn degenerate_ranges() {
        let flat = Axis::fit([1.0, 1.0]);
        assert!(flat.min < 1.0 && flat.max > 1.0);
        let empty = Axis::fit(std::iter::empty());
        assert_eq!((empty.min, empty.max), (0.0, 1.0));
        assert!(!empty.ticks.is_empty());
    }

    #[test]
    fn negative_zero_label() {
        let axis = Axis::fit([-1.0, 1.0]);
        assert_eq!(axis.label(-0.0001), "0.0");
    }

    #[test]
    fn markers_are_blue() {
        let plot = ScatterPlot::new("t")
            .with_points([(0.0, 1.0), (1.0, 0.98), (2.0, 0.97)])
            .with_size(400, 300);
        let img = plot.render().unwrap();
        assert_eq!((img.width(), img.height()), (400, 300));
        assert!(img.pixels().filter(|p| **p == BLUE).count() > 3 * 50);
    }

    #[test]
    fn grid_can_be_disabled() {
        let points = [(0.0, 1.0), (3.0, 0.9)];
        let with = ScatterPlot::new("g").with_points(points).render().unwrap();
        let without = ScatterPlot::new("g")
            .with_points(points)
            .with_grid(false)
            .render()
            .unwrap();
        let grey = |img: &RgbImage| img.pixels().filter(|p| **p == GRID).count();
        assert!(grey(&with) > 0);
        assert_eq!(grey(&without), 0);
    }

    #[test]
    fn png_signature() {
        let bytes = ScatterPlot::new("png")
            .with_points([(0.0, 1.0)])
            .render_png()
            .unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn rejects_bad_input() {
        let tiny = ScatterPlot::new("x").with_size(10, 10).render();
        assert!(matches!(tiny, Err(PowerflowError::Render(_))));
        let nan = ScatterPlot::new("x").with_points([(f64::NAN, 1.0)]).render();
        assert!(matches!(nan, Err(PowerflowError::Render(_))));
    }
}
