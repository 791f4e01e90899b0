/*!
# Galaxy image deconvolution

Simulation of the blur and of the sensor noise of a telescope observing a
galaxy, and evaluation of the Wiener deconvolution of the simulated images.

## Key Components

- [`Image`] - 2-D flux container with shape-checked operations
- [`convolve`] - linear convolution through the Fourier domain
- [`NoiseParameters`] and [`Observation`] - sky and detector noise model
- [`wiener()`] and [`WienerFilter`] - closed-form Wiener deconvolution
- [`psnr`] and [`ssim`] - image fidelity metrics
- [`Evaluation`] - SNR x regularization grid and its [`Report`]

## Usage

```rust,no_run
use galaxy_deconv::{load_normalized, NoiseParameters, Observation, wiener};
use rand::thread_rng;

let galaxy = load_normalized("data/galaxy.npy")?;
let psf = load_normalized("data/psf.npy")?;
let sigma = NoiseParameters::default().sigma();
let observation = Observation::simulate(&galaxy, &psf, 100., sigma, &mut thread_rng())?;
let estimate = wiener(&observation.observed, &psf, 0.05)?;
# Ok::<(), galaxy_deconv::Error>(())
```
*/

use std::path::Path;

pub mod convolution;
mod error;
pub mod evaluation;
pub mod fourier;
pub mod image;
pub mod io;
pub mod metrics;
pub mod noise;
#[cfg(feature = "plot")]
pub mod plot;
pub mod wiener;

pub use convolution::convolve;
pub use error::Error;
pub use evaluation::{Cell, Evaluation, Report};
pub use image::Image;
pub use metrics::{psnr, ssim};
pub use noise::{NoiseParameters, Observation};
pub use wiener::{wiener, WienerFilter};

pub type Result<T> = std::result::Result<T, Error>;

/// Loads a 2-D array from a `.npy` file and divides it by its sum
pub fn load_normalized<P: AsRef<Path>>(path: P) -> Result<Image> {
    Ok(io::load_npy(path)?.normalized()?)
}

/// Loads the 2-D array `name` from a `.npz` archive and divides it by its sum
pub fn load_normalized_npz<P: AsRef<Path>>(path: P, name: &str) -> Result<Image> {
    Ok(io::load_npz(path, name)?.normalized()?)
}
