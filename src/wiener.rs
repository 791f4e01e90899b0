/*!
# Wiener deconvolution

Closed-form regularized inverse filter:

```text
X = conj(H) Y / (|H|^2 + lambda)
```

where `H` and `Y` are the spectra of the kernel and of the observed image.
`lambda` stands for a noise-to-signal power ratio assumed constant over all
frequencies.

With `lambda = 0` a true null of the kernel spectrum gives non-finite
samples in the estimate; this is not treated as an error and can be
checked with [`Image::is_finite`].
*/

use log::warn;

use crate::{
    fourier::{fftshift, ifftshift, irfft2, rfft2, Spectrum},
    image::ImageError,
    Image,
};

#[derive(Debug, thiserror::Error)]
pub enum WienerError {
    #[error("the regularization parameter must be positive and finite, found {0}")]
    Lambda(f64),
    #[error("kernel and observed image are not compatible")]
    Image(#[from] ImageError),
}
type Result<T> = std::result::Result<T, WienerError>;

/// Wiener filter of a given kernel
///
/// The kernel spectrum is computed once and reused for every observed
/// image and regularization parameter.
#[derive(Debug, Clone)]
pub struct WienerFilter {
    shape: (usize, usize),
    conj_kernel: Spectrum,
    kernel_power: Vec<f64>,
}
impl WienerFilter {
    pub fn new(kernel: &Image) -> Self {
        let kernel_fft = rfft2(&ifftshift(kernel).into());
        Self {
            shape: kernel.shape(),
            kernel_power: kernel_fft.iter().map(|h| h.norm_sqr()).collect(),
            conj_kernel: kernel_fft.map(|h| h.conj()),
        }
    }
    /// Estimate of the unblurred image
    pub fn apply(&self, observed: &Image, lambda: f64) -> Result<Image> {
        if !(lambda >= 0f64 && lambda.is_finite()) {
            return Err(WienerError::Lambda(lambda));
        }
        if observed.shape() != self.shape {
            return Err(ImageError::ShapeMismatch {
                expected: self.shape,
                found: observed.shape(),
            }
            .into());
        }
        let mut spectrum = rfft2(&ifftshift(observed).into());
        spectrum
            .iter_mut()
            .zip(self.conj_kernel.iter().zip(&self.kernel_power))
            .for_each(|(y, (h_conj, h_power))| {
                *y = h_conj * *y / (h_power + lambda);
            });
        let estimate: Image = fftshift(&irfft2(spectrum).into_inner()).into();
        if !estimate.is_finite() {
            warn!("Wiener estimate with lambda={lambda} has non-finite samples");
        }
        Ok(estimate)
    }
}

/// Wiener deconvolution of `observed` by `kernel`
pub fn wiener(observed: &Image, kernel: &Image, lambda: f64) -> Result<Image> {
    observed.ensure_same_shape(kernel)?;
    WienerFilter::new(kernel).apply(observed, lambda)
}
