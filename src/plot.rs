//! Comparison figure
//!
//! One row per SNR: ground truth, observed image and the Wiener estimates for
//! each regularization parameter, all drawn with the CUBEHELIX colormap and
//! the dynamic range of the row ground truth.

use std::path::Path;

use plotters::prelude::*;

use crate::{evaluation::Report, Image};

/// Panel width and height [px]
const PANEL_SIZE: u32 = 240;

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("nothing to plot")]
    Empty,
    #[error("failed to draw the figure: {0}")]
    Drawing(String),
}
type Result<T> = std::result::Result<T, PlotError>;

fn drawing_error(e: impl std::fmt::Display) -> PlotError {
    PlotError::Drawing(e.to_string())
}

/// Draws `image` as a heatmap in `panel`, mapping `[min, max]` onto the colormap
fn heatmap<DB: DrawingBackend>(
    panel: &DrawingArea<DB, plotters::coord::Shift>,
    caption: &str,
    image: &Image,
    (min, max): (f64, f64),
) -> Result<()> {
    let (nrows, ncols) = image.shape();
    let range = max - min;
    let mut chart = ChartBuilder::on(panel)
        .caption(caption, ("sans-serif", 14))
        .margin(4)
        .build_cartesian_2d(0..ncols as i32, 0..nrows as i32)
        .map_err(drawing_error)?;
    chart
        .draw_series(
            (0..nrows)
                .flat_map(|i| (0..ncols).map(move |j| (i, j)))
                .map(|(i, j)| {
                    let value = if range > 0f64 {
                        ((image[(i, j)] - min) / range).clamp(0., 1.)
                    } else {
                        0.5
                    };
                    let color = colorous::CUBEHELIX.eval_continuous(value);
                    // first row at the top
                    let y = (nrows - 1 - i) as i32;
                    let x = j as i32;
                    Rectangle::new(
                        [(x, y), (x + 1, y + 1)],
                        RGBColor(color.r, color.g, color.b).filled(),
                    )
                }),
        )
        .map_err(drawing_error)?;
    Ok(())
}

impl Report {
    /// Saves the multi-panel comparison figure as a PNG file
    pub fn plot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if self.observations.is_empty() {
            return Err(PlotError::Empty);
        }
        let n_col = 2 + self.lambdas.len();
        let n_row = self.observations.len();
        log::info!("Plotting {n_row}x{n_col} panels to {:?}", path.as_ref());

        let root = BitMapBackend::new(
            path.as_ref(),
            (n_col as u32 * PANEL_SIZE, n_row as u32 * PANEL_SIZE),
        )
        .into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error)?;
        let panels = root.split_evenly((n_row, n_col));

        for (index, (observation, row)) in self
            .observations
            .iter()
            .zip(panels.chunks(n_col))
            .enumerate()
        {
            let minmax = observation.ground_truth.min_max();
            let snr = observation.snr;
            heatmap(
                &row[0],
                &format!("ground truth SNR={snr:.0}"),
                &observation.ground_truth,
                minmax,
            )?;
            heatmap(&row[1], "observed", &observation.observed, minmax)?;
            for (panel, &lambda) in row[2..].iter().zip(&self.lambdas) {
                match self
                    .row(index)
                    .find(|cell| cell.lambda == lambda)
                {
                    Some(cell) => heatmap(
                        panel,
                        &format!(
                            "lambda={lambda} {:.1}dB SSIM={:.3}",
                            cell.psnr, cell.ssim
                        ),
                        &cell.estimate,
                        minmax,
                    )?,
                    None => {
                        panel
                            .titled(&format!("lambda={lambda} failed"), ("sans-serif", 14))
                            .map_err(drawing_error)?;
                    }
                }
            }
        }
        root.present().map_err(drawing_error)?;
        Ok(())
    }
}
