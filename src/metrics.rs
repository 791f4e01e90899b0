//! Image fidelity metrics
//!
//! Peak signal-to-noise ratio and mean structural similarity index of a
//! reconstructed image against its reference.

use nalgebra as na;

use crate::{image::ImageError, Image};

/// SSIM window width
const WIN_SIZE: usize = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("image {0}x{1} is smaller than the 7x7 SSIM window")]
    TooSmall(usize, usize),
    #[error("data range must be positive, found {0}")]
    DataRange(f64),
    #[error("reference and test images are not compatible")]
    Image(#[from] ImageError),
}
type Result<T> = std::result::Result<T, MetricsError>;

/// Peak signal-to-noise ratio [dB]
///
/// Identical images give an infinite PSNR.
pub fn psnr(reference: &Image, test: &Image, data_range: f64) -> Result<f64> {
    if !(data_range > 0f64) {
        return Err(MetricsError::DataRange(data_range));
    }
    let mse = reference.try_sub(test)?.energy() / reference.len() as f64;
    Ok(10. * (data_range * data_range / mse).log10())
}

/// Summed-area table with a leading row and column of zeros
fn integral(data: &na::DMatrix<f64>) -> na::DMatrix<f64> {
    let (nrows, ncols) = data.shape();
    let mut table = na::DMatrix::<f64>::zeros(nrows + 1, ncols + 1);
    for j in 0..ncols {
        for i in 0..nrows {
            table[(i + 1, j + 1)] =
                data[(i, j)] + table[(i, j + 1)] + table[(i + 1, j)] - table[(i, j)];
        }
    }
    table
}

/// Sum over the window which top left corner is `(i, j)`
fn window_sum(table: &na::DMatrix<f64>, i: usize, j: usize) -> f64 {
    let (k, l) = (i + WIN_SIZE, j + WIN_SIZE);
    table[(k, l)] - table[(i, l)] - table[(k, j)] + table[(i, j)]
}

/// Mean structural similarity index
///
/// Local statistics are computed over a 7x7 uniform window with the sample
/// covariance normalization. The index is averaged over all the windows
/// fully contained in the image.
pub fn ssim(reference: &Image, test: &Image, data_range: f64) -> Result<f64> {
    reference.ensure_same_shape(test)?;
    if !(data_range > 0f64) {
        return Err(MetricsError::DataRange(data_range));
    }
    let (nrows, ncols) = reference.shape();
    if nrows < WIN_SIZE || ncols < WIN_SIZE {
        return Err(MetricsError::TooSmall(nrows, ncols));
    }

    let x: &na::DMatrix<f64> = reference;
    let y: &na::DMatrix<f64> = test;
    let sx = integral(x);
    let sy = integral(y);
    let sxx = integral(&x.component_mul(x));
    let syy = integral(&y.component_mul(y));
    let sxy = integral(&x.component_mul(y));

    let np = (WIN_SIZE * WIN_SIZE) as f64;
    let cov_norm = np / (np - 1.);
    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);

    let (n_i, n_j) = (nrows - WIN_SIZE + 1, ncols - WIN_SIZE + 1);
    let mut total = 0f64;
    for j in 0..n_j {
        for i in 0..n_i {
            let ux = window_sum(&sx, i, j) / np;
            let uy = window_sum(&sy, i, j) / np;
            let vx = cov_norm * (window_sum(&sxx, i, j) / np - ux * ux);
            let vy = cov_norm * (window_sum(&syy, i, j) / np - uy * uy);
            let vxy = cov_norm * (window_sum(&sxy, i, j) / np - ux * uy);
            total += ((2. * ux * uy + c1) * (2. * vxy + c2))
                / ((ux * ux + uy * uy + c1) * (vx + vy + c2));
        }
    }
    Ok(total / (n_i * n_j) as f64)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::noise::add_noise;

    fn pattern(n: usize) -> Image {
        Image::from_fn(n, n, |i, j| ((i as f64 / 3.).sin() * (j as f64 / 5.).cos() + 1.) * 10.)
    }

    #[test]
    fn identical_images() {
        let x = pattern(32);
        assert_eq!(psnr(&x, &x, 20.).unwrap(), f64::INFINITY);
        assert!((ssim(&x, &x, 20.).unwrap() - 1.).abs() < 1e-9);
    }

    #[test]
    fn psnr_of_constant_offset() {
        let x = pattern(16);
        let y = x.try_add(&Image::from_fn(16, 16, |_, _| 1.)).unwrap();
        // MSE = 1 so PSNR = 20 log10(data_range)
        assert!((psnr(&x, &y, 100.).unwrap() - 40.).abs() < 1e-9);
    }

    #[test]
    fn noise_degrades_both_metrics() {
        let x = pattern(48);
        let mut rng = StdRng::seed_from_u64(1);
        let slightly = add_noise(&x, 0.5, &mut rng).unwrap();
        let heavily = add_noise(&x, 5., &mut rng).unwrap();
        let range = 20.;
        assert!(psnr(&x, &slightly, range).unwrap() > psnr(&x, &heavily, range).unwrap());
        let (s1, s2) = (
            ssim(&x, &slightly, range).unwrap(),
            ssim(&x, &heavily, range).unwrap(),
        );
        assert!(s1 < 1. && s2 < s1, "SSIM: {s1} {s2}");
    }

    #[test]
    fn ssim_matches_brute_force() {
        let x = pattern(9);
        let y = Image::from_fn(9, 9, |i, j| x[(i, j)] * 0.8 + ((i + j) % 3) as f64);
        let range = 20.;
        let np = 49.;
        let c1 = (K1 * range).powi(2);
        let c2 = (K2 * range).powi(2);
        let mut total = 0.;
        for i in 0..3 {
            for j in 0..3 {
                let wx = x.view((i, j), (7, 7));
                let wy = y.view((i, j), (7, 7));
                let (ux, uy) = (wx.mean(), wy.mean());
                let vx = wx.iter().map(|a| (a - ux).powi(2)).sum::<f64>() / (np - 1.);
                let vy = wy.iter().map(|b| (b - uy).powi(2)).sum::<f64>() / (np - 1.);
                let vxy = wx
                    .iter()
                    .zip(wy.iter())
                    .map(|(a, b)| (a - ux) * (b - uy))
                    .sum::<f64>()
                    / (np - 1.);
                total += ((2. * ux * uy + c1) * (2. * vxy + c2))
                    / ((ux * ux + uy * uy + c1) * (vx + vy + c2));
            }
        }
        let expected = total / 9.;
        assert!((ssim(&x, &y, range).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn too_small() {
        let x = Image::zeros((6, 8));
        assert!(matches!(ssim(&x, &x, 1.), Err(MetricsError::TooSmall(6, 8))));
    }
}
