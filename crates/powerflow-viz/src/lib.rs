//! Raster plots for power flow analysis.
//!
//! [`ScatterPlot`] draws axes, ticks, grid, labels and markers onto an RGB image using
//! a built-in bitmap font and encodes it as PNG. [`voltage_profile_plot`] configures
//! it for bus voltage against distance from the slack bus.

pub mod font;
pub mod plot;

pub use plot::{nice_step, Axis, ScatterPlot, BLUE};

use powerflow_core::{PowerflowError, PowerflowResult};
use tracing::debug;

pub const PROFILE_TITLE: &str = "Bus Voltage Profile vs Distance";
pub const PROFILE_X_LABEL: &str = "Distance from Slack Bus";
pub const PROFILE_Y_LABEL: &str = "Bus Voltage (p.u.)";

/// Scatter plot of bus voltage (p.u.) against hop distance from the slack bus.
pub fn voltage_profile_plot(distance: &[f64], vm_pu: &[f64]) -> PowerflowResult<ScatterPlot> {
    if distance.len() != vm_pu.len() {
        return Err(PowerflowError::Render(format!(
            "series length mismatch: {} distances, {} voltages",
            distance.len(),
            vm_pu.len()
        )));
    }
    debug!(points = distance.len(), "building voltage profile plot");

    Ok(ScatterPlot::new(PROFILE_TITLE)
        .with_labels(PROFILE_X_LABEL, PROFILE_Y_LABEL)
        .with_points(distance.iter().copied().zip(vm_pu.iter().copied())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_plot_labels() {
        let plot = voltage_profile_plot(&[0.0, 1.0, 2.0], &[1.04, 1.01, 0.99]).unwrap();
        assert_eq!(plot.title, "Bus Voltage Profile vs Distance");
        assert_eq!(plot.x_label, "Distance from Slack Bus");
        assert_eq!(plot.y_label, "Bus Voltage (p.u.)");
        assert_eq!(plot.points.len(), 3);
        assert!(plot.grid);
        assert_eq!(plot.marker_color, BLUE);
    }

    #[test]
    fn mismatched_series_rejected() {
        let err = voltage_profile_plot(&[0.0, 1.0], &[1.0]).unwrap_err();
        assert!(err.to_string().contains("length mismatch"));
    }

    #[test]
    fn renders_png() {
        let png = voltage_profile_plot(&[0.0, 1.0, 1.0, 2.0], &[1.0, 0.99, 0.98, 0.97])
            .unwrap()
            .render_png()
            .unwrap();
        assert!(png.starts_with(b"\x89PNG"));
        assert!(png.len() > 1000);
    }
}
