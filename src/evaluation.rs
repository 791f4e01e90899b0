/*!
# Wiener deconvolution evaluation

Runs the Wiener solver over a grid of signal-to-noise ratios and
regularization parameters and scores each reconstruction against its
ground truth with [psnr] and [ssim].

```rust,no_run
use galaxy_deconv::{load_normalized, Evaluation};
use rand::{rngs::StdRng, SeedableRng};

let galaxy = load_normalized("data/galaxy.npy")?;
let psf = load_normalized("data/psf.npy")?;
let mut rng = StdRng::seed_from_u64(0);
let report = Evaluation::default().run(&galaxy, &psf, &mut rng)?;
println!("{report}");
# Ok::<(), Box<dyn std::error::Error>>(())
```

Observations are drawn one SNR after the other from the same random
generator, so a seeded generator gives the same report on every run. The
grid cells are then evaluated in parallel.
*/

use std::{fmt, path::Path, time::Instant};

use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    metrics::{psnr, ssim, MetricsError},
    noise::{NoiseError, NoiseParameters, Observation},
    wiener::{WienerError, WienerFilter},
    Image,
};

#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("failed to simulate the observations")]
    Noise(#[from] NoiseError),
    #[error("Wiener deconvolution failed")]
    Wiener(#[from] WienerError),
    #[error("failed to compute the image quality metrics")]
    Metrics(#[from] MetricsError),
    #[error("failed to write the CSV report")]
    Csv(#[from] csv::Error),
    #[error("ground truth for SNR={0} has no dynamic range")]
    DataRange(f64),
}
type Result<T> = std::result::Result<T, EvaluationError>;

/// Reconstruction of one observation for one regularization parameter
#[derive(Debug, Clone)]
pub struct Cell {
    /// index of the observation in [Report::observations]
    pub observation: usize,
    pub snr: f64,
    pub lambda: f64,
    pub estimate: Image,
    pub psnr: f64,
    pub ssim: f64,
}

/// Grid cell that could not be evaluated
#[derive(Debug)]
pub struct Failure {
    pub observation: usize,
    pub snr: f64,
    pub lambda: f64,
    pub error: EvaluationError,
}

#[derive(Debug, Serialize)]
struct Record {
    snr: f64,
    lambda: f64,
    psnr: f64,
    ssim: f64,
}

/// SNR and regularization grids
#[derive(Debug, Clone)]
pub struct Evaluation {
    parameters: NoiseParameters,
    snrs: Vec<f64>,
    lambdas: Vec<f64>,
}
impl Default for Evaluation {
    fn default() -> Self {
        Self {
            parameters: NoiseParameters::default(),
            snrs: vec![60., 100., 200., 300.],
            lambdas: vec![0.02, 0.05, 0.1, 0.2],
        }
    }
}
impl Evaluation {
    pub fn parameters(self, parameters: NoiseParameters) -> Self {
        Self { parameters, ..self }
    }
    pub fn snrs(self, snrs: Vec<f64>) -> Self {
        Self { snrs, ..self }
    }
    pub fn lambdas(self, lambdas: Vec<f64>) -> Self {
        Self { lambdas, ..self }
    }
    /// Simulates one observation per SNR and deconvolves each of them for every lambda
    ///
    /// `galaxy` and `psf` are expected to be normalized.
    pub fn run<R: Rng + ?Sized>(&self, galaxy: &Image, psf: &Image, rng: &mut R) -> Result<Report> {
        let now = Instant::now();
        let sigma = self.parameters.sigma();
        info!("noise sigma: {sigma:.3}");

        let observations = self
            .snrs
            .iter()
            .map(|&snr| Observation::simulate(galaxy, psf, snr, sigma, rng))
            .collect::<std::result::Result<Vec<_>, NoiseError>>()?;
        info!(
            "{} observations simulated in {}ms",
            observations.len(),
            now.elapsed().as_millis()
        );

        let filter = WienerFilter::new(psf);
        let grid: Vec<_> = observations
            .iter()
            .enumerate()
            .flat_map(|(index, observation)| {
                self.lambdas
                    .iter()
                    .map(move |&lambda| (index, observation, lambda))
            })
            .collect();
        let pb = ProgressBar::new(grid.len() as u64);
        let outcomes: Vec<_> = grid
            .into_par_iter()
            .progress_with(pb)
            .map(|(index, observation, lambda)| {
                evaluate(&filter, index, observation, lambda).map_err(|error| Failure {
                    observation: index,
                    snr: observation.snr,
                    lambda,
                    error,
                })
            })
            .collect();

        let mut cells = vec![];
        let mut failures = vec![];
        for outcome in outcomes {
            match outcome {
                Ok(cell) => cells.push(cell),
                Err(failure) => {
                    warn!(
                        "SNR={} lambda={} failed: {}",
                        failure.snr, failure.lambda, failure.error
                    );
                    failures.push(failure)
                }
            }
        }
        info!("... evaluated in {}ms", now.elapsed().as_millis());
        Ok(Report {
            observations,
            lambdas: self.lambdas.clone(),
            cells,
            failures,
        })
    }
}

fn evaluate(
    filter: &WienerFilter,
    index: usize,
    observation: &Observation,
    lambda: f64,
) -> Result<Cell> {
    let Observation {
        snr, ground_truth, ..
    } = observation;
    let estimate = filter.apply(&observation.observed, lambda)?;
    let (min, max) = ground_truth.min_max();
    let data_range = max - min;
    if !(data_range > 0f64) {
        return Err(EvaluationError::DataRange(*snr));
    }
    let psnr = psnr(ground_truth, &estimate, data_range)?;
    let ssim = ssim(ground_truth, &estimate, data_range)?;
    debug!("SNR={snr} lambda={lambda}: PSNR={psnr:.2}dB SSIM={ssim:.4}");
    Ok(Cell {
        observation: index,
        snr: *snr,
        lambda,
        estimate,
        psnr,
        ssim,
    })
}

/// Evaluation results
#[derive(Debug)]
pub struct Report {
    pub observations: Vec<Observation>,
    pub lambdas: Vec<f64>,
    pub cells: Vec<Cell>,
    pub failures: Vec<Failure>,
}
impl Report {
    /// Cells of the `index`th observation, in the order of the lambda grid
    pub fn row(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(move |cell| cell.observation == index)
    }
    /// The cell with the largest PSNR for each observation
    pub fn best(&self) -> Vec<&Cell> {
        (0..self.observations.len())
            .filter_map(|index| {
                self.row(index)
                    .filter(|cell| !cell.psnr.is_nan())
                    .max_by(|a, b| a.psnr.total_cmp(&b.psnr))
            })
            .collect()
    }
    /// Writes the metrics of every cell to a CSV file
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for cell in &self.cells {
            wtr.serialize(Record {
                snr: cell.snr,
                lambda: cell.lambda,
                psnr: cell.psnr,
                ssim: cell.ssim,
            })?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>6} {:>8} {:>10} {:>8}", "SNR", "lambda", "PSNR[dB]", "SSIM")?;
        for cell in &self.cells {
            writeln!(
                f,
                "{:>6.0} {:>8.3} {:>10.2} {:>8.4}",
                cell.snr, cell.lambda, cell.psnr, cell.ssim
            )?;
        }
        for failure in &self.failures {
            writeln!(
                f,
                "{:>6.0} {:>8.3} {}",
                failure.snr, failure.lambda, failure.error
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn galaxy(n: usize) -> Image {
        let c = (n / 2) as f64;
        Image::from_fn(n, n, |i, j| {
            let (x, y) = (i as f64 - c, (j as f64 - c) / 1.5);
            (-(x * x + y * y).sqrt() / 2.).exp()
        })
        .normalized()
        .unwrap()
    }

    fn psf(n: usize) -> Image {
        let c = (n / 2) as f64;
        Image::from_fn(n, n, |i, j| {
            let (x, y) = (i as f64 - c, j as f64 - c);
            (-(x * x + y * y) / 4.).exp()
        })
        .normalized()
        .unwrap()
    }

    #[test]
    fn full_grid() {
        let mut rng = StdRng::seed_from_u64(42);
        let report = Evaluation::default()
            .run(&galaxy(32), &psf(32), &mut rng)
            .unwrap();
        println!("{report}");
        assert_eq!(report.observations.len(), 4);
        assert_eq!(report.cells.len(), 16);
        assert!(report.failures.is_empty());
        assert!(report
            .cells
            .iter()
            .all(|cell| cell.psnr.is_finite() && cell.ssim <= 1. + 1e-9));
        let lambdas: Vec<_> = report.row(1).map(|cell| cell.lambda).collect();
        assert_eq!(lambdas, vec![0.02, 0.05, 0.1, 0.2]);
        assert_eq!(report.best().len(), 4);
    }

    #[test]
    fn reproducible_with_seed() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(9);
            Evaluation::default()
                .snrs(vec![100.])
                .lambdas(vec![0.05, 0.1])
                .run(&galaxy(16), &psf(16), &mut rng)
                .unwrap()
        };
        let (a, b) = (run(), run());
        for (a, b) in a.cells.iter().zip(&b.cells) {
            assert_eq!(a.estimate, b.estimate);
            assert_eq!(a.psnr, b.psnr);
        }
    }

    #[test]
    fn invalid_lambda_only_fails_its_cells() {
        let mut rng = StdRng::seed_from_u64(1);
        let report = Evaluation::default()
            .snrs(vec![60., 300.])
            .lambdas(vec![0.1, -1.])
            .run(&galaxy(16), &psf(16), &mut rng)
            .unwrap();
        assert_eq!(report.cells.len(), 2);
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .all(|failure| matches!(failure.error, EvaluationError::Wiener(WienerError::Lambda(_)))));
    }

    #[test]
    fn higher_snr_reconstructs_better() {
        let mut rng = StdRng::seed_from_u64(3);
        let report = Evaluation::default()
            .snrs(vec![20., 2000.])
            .lambdas(vec![0.05])
            .run(&galaxy(32), &psf(32), &mut rng)
            .unwrap();
        let (low, high) = (&report.cells[0], &report.cells[1]);
        assert!(high.ssim > low.ssim, "SSIM: {} vs {}", low.ssim, high.ssim);
    }

    #[test]
    fn zero_galaxy_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Evaluation::default().run(&Image::zeros((16, 16)), &psf(16), &mut rng),
            Err(EvaluationError::Noise(NoiseError::ZeroSignal))
        ));
    }

    #[test]
    fn csv_report() {
        let mut rng = StdRng::seed_from_u64(2);
        let report = Evaluation::default()
            .snrs(vec![100.])
            .run(&galaxy(16), &psf(16), &mut rng)
            .unwrap();
        let path = std::env::temp_dir().join(format!("galaxy-deconv_{}.csv", std::process::id()));
        report.to_csv(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("snr,lambda,psnr,ssim"));
        assert_eq!(lines.count(), 4);
    }

    #[test]
    fn repeated_snr_keeps_separate_rows() {
        let mut rng = StdRng::seed_from_u64(5);
        let report = Evaluation::default()
            .snrs(vec![100., 100.])
            .lambdas(vec![0.05, 0.1])
            .run(&galaxy(16), &psf(16), &mut rng)
            .unwrap();
        assert_eq!(report.row(0).count(), 2);
        assert_eq!(report.row(1).count(), 2);
        let best = report.best();
        assert_eq!(best.len(), 2);
        assert_eq!((best[0].observation, best[1].observation), (0, 1));
        assert_ne!(
            report.row(0).next().unwrap().estimate,
            report.row(1).next().unwrap().estimate
        );
    }
}
