//! 2-D discrete Fourier transforms and quadrant shifts
//!
//! The transforms run [rustfft] plans over the contiguous columns of a
//! column-major [nalgebra] matrix, then over the columns of its transpose.

use nalgebra as na;
use rustfft::{num_complex::Complex, FftDirection, FftPlanner};

use crate::Image;

pub type Spectrum = na::DMatrix<Complex<f64>>;

fn transform(mut data: Spectrum, direction: FftDirection) -> Spectrum {
    if data.is_empty() {
        return data;
    }
    let (nrows, ncols) = data.shape();
    let mut planner = FftPlanner::<f64>::new();
    planner
        .plan_fft(nrows, direction)
        .process(data.as_mut_slice());
    let mut transposed = data.transpose();
    planner
        .plan_fft(ncols, direction)
        .process(transposed.as_mut_slice());
    transposed.transpose()
}

/// Unnormalized forward 2-D FFT of a complex array
pub fn fft2(data: Spectrum) -> Spectrum {
    transform(data, FftDirection::Forward)
}

/// Inverse 2-D FFT normalized by `1/(rows x columns)`
pub fn ifft2(data: Spectrum) -> Spectrum {
    let n = data.len() as f64;
    let mut out = transform(data, FftDirection::Inverse);
    out.iter_mut().for_each(|x| *x /= n);
    out
}

/// Forward 2-D FFT of a real image
pub fn rfft2(image: &Image) -> Spectrum {
    fft2(image.map(|x| Complex::new(x, 0f64)))
}

/// Real part of the inverse 2-D FFT
pub fn irfft2(spectrum: Spectrum) -> Image {
    ifft2(spectrum).map(|z| z.re).into()
}

/// Circular shift: the sample at `(i, j)` moves to `(i + rows, j + cols)` modulo the shape
fn roll<T: na::Scalar>(data: &na::DMatrix<T>, rows: usize, cols: usize) -> na::DMatrix<T> {
    let (nrows, ncols) = data.shape();
    na::DMatrix::from_fn(nrows, ncols, |i, j| {
        data[((i + nrows - rows) % nrows, (j + ncols - cols) % ncols)].clone()
    })
}

/// Moves the zero-frequency sample from the array origin to the center
pub fn fftshift<T: na::Scalar>(data: &na::DMatrix<T>) -> na::DMatrix<T> {
    let (nrows, ncols) = data.shape();
    roll(data, nrows / 2, ncols / 2)
}

/// Inverse of [fftshift]: moves the center sample to the array origin
pub fn ifftshift<T: na::Scalar>(data: &na::DMatrix<T>) -> na::DMatrix<T> {
    let (nrows, ncols) = data.shape();
    roll(data, nrows - nrows / 2, ncols - ncols / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_are_inverse() {
        for (nrows, ncols) in [(4, 6), (5, 7), (3, 8)] {
            let data = na::DMatrix::from_fn(nrows, ncols, |i, j| (i * ncols + j) as f64);
            assert_eq!(ifftshift(&fftshift(&data)), data);
            assert_eq!(fftshift(&ifftshift(&data)), data);
        }
    }

    #[test]
    fn ifftshift_centered_impulse_to_origin() {
        for shape in [(4, 4), (5, 6), (7, 3)] {
            let shifted = ifftshift(&Image::impulse(shape).into_inner());
            assert_eq!(shifted[(0, 0)], 1f64);
        }
    }

    #[test]
    fn fftshift_odd() {
        // numpy.fft.fftshift([0, 1, 2, 3, 4]) == [3, 4, 0, 1, 2]
        let data = na::DMatrix::from_row_slice(1, 5, &[0., 1., 2., 3., 4.]);
        let shifted = fftshift(&data);
        assert_eq!(shifted.as_slice(), &[3., 4., 0., 1., 2.]);
    }

    #[test]
    fn impulse_spectrum_is_flat() {
        let mut data = na::DMatrix::<f64>::zeros(8, 6);
        data[(0, 0)] = 1f64;
        let spectrum = rfft2(&data.into());
        assert!(spectrum.iter().all(|z| (z - Complex::new(1., 0.)).norm() < 1e-12));
    }

    #[test]
    fn round_trip() {
        let image: Image = na::DMatrix::from_fn(6, 10, |i, j| ((i * 7 + j * 3) % 5) as f64).into();
        let back = irfft2(rfft2(&image));
        assert!((back.into_inner() - image.into_inner()).amax() < 1e-12);
    }

    #[test]
    fn dc_term_is_the_sum() {
        let image = Image::from_fn(5, 3, |i, j| (i + 2 * j) as f64);
        let spectrum = rfft2(&image);
        assert!((spectrum[(0, 0)].re - image.sum()).abs() < 1e-12);
    }
}
