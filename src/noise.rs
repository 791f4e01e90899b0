/*!
# Sensor noise model

Converts the sky brightness and the detector parameters into a single
background noise level and produces noisy, blurred observations of a
galaxy at a requested signal-to-noise ratio.

The noise level is the additive approximation
`sky_level_pixel + dark_current + 2 x read_noise`: the dark current and the
read noise are not scaled with the exposure time (see
[`NoiseParameters::sigma`]).

Randomness is always supplied by the caller through a [`rand::Rng`] so that
seeded generators give reproducible observations.
*/

use log::debug;
use nalgebra as na;
use rand::Rng;
use rand_distr::Normal;

use crate::{convolution::convolve, image::ImageError, Image};

#[derive(Debug, thiserror::Error)]
pub enum NoiseError {
    #[error("cannot scale an image with no signal to a target SNR")]
    ZeroSignal,
    #[error("invalid noise standard deviation: {0}")]
    Sigma(f64),
    #[error("failed to form the observed image")]
    Image(#[from] ImageError),
}
type Result<T> = std::result::Result<T, NoiseError>;

/// Telescope, sky and detector parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParameters {
    /// pixel scale [arcsec]
    pub pixel_scale: f64,
    /// exposure time [s]
    pub exposure_time: f64,
    /// sky brightness [mag/arcsec^2]
    pub sky_brightness: f64,
    /// instrumental zero point [mag]
    pub zero_point: f64,
    pub quantum_efficiency: f64,
    /// read noise standard deviation [e-]
    pub read_noise: f64,
    /// dark current [e-/s]
    pub dark_current: f64,
}
impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            pixel_scale: 0.2,
            exposure_time: 30.0,
            sky_brightness: 20.46,
            zero_point: 28.17,
            quantum_efficiency: 0.94,
            read_noise: 8.8,
            dark_current: 0.2,
        }
    }
}
impl NoiseParameters {
    /// Expected sky background photons per pixel for the exposure
    pub fn sky_level_pixel(&self) -> f64 {
        self.pixel_scale.powi(2)
            * flux(
                self.exposure_time,
                self.sky_brightness,
                self.zero_point,
                self.quantum_efficiency,
            )
    }
    /// Background noise level shared by all the observations
    pub fn sigma(&self) -> f64 {
        total_noise(
            self.sky_level_pixel(),
            self.dark_current,
            self.exposure_time,
            self.read_noise,
        )
    }
}

/// Photon flux of a source of a given magnitude integrated over the exposure
pub fn flux(exposure_time: f64, magnitude: f64, zero_point: f64, quantum_efficiency: f64) -> f64 {
    exposure_time * 10f64.powf(-0.4 * (magnitude - zero_point) * quantum_efficiency)
}

/// Combined sky, dark current and read noise level
///
/// `exposure_time` does not enter the sum: dark current and read noise are
/// added unscaled.
pub fn total_noise(
    sky_level_pixel: f64,
    dark_current: f64,
    _exposure_time: f64,
    read_noise: f64,
) -> f64 {
    sky_level_pixel + dark_current + 2. * read_noise
}

/// Scales `galaxy` such as `sqrt(sum(galaxy^2)) / sigma` equals `target_snr`
pub fn scale_to_snr(galaxy: &Image, target_snr: f64, sigma: f64) -> Result<Image> {
    let norm = galaxy.energy().sqrt();
    if norm == 0f64 {
        return Err(NoiseError::ZeroSignal);
    }
    let alpha = target_snr * sigma / norm;
    Ok(galaxy.scaled(alpha))
}

/// Adds independent zero mean Gaussian samples of standard deviation `sigma` to every pixel
pub fn add_noise<R: Rng + ?Sized>(image: &Image, sigma: f64, rng: &mut R) -> Result<Image> {
    if !(sigma >= 0f64 && sigma.is_finite()) {
        return Err(NoiseError::Sigma(sigma));
    }
    let normal = Normal::new(0f64, sigma).map_err(|_| NoiseError::Sigma(sigma))?;
    let (nrows, ncols) = image.shape();
    let noise = na::DMatrix::from_distribution(nrows, ncols, &normal, rng);
    Ok(image.try_add(&noise.into())?)
}

/// Ground truth and blurred noisy image of a galaxy at a given SNR
#[derive(Debug, Clone)]
pub struct Observation {
    pub snr: f64,
    pub ground_truth: Image,
    pub observed: Image,
}
impl Observation {
    /// Scales `galaxy` to `snr`, blurs it with `psf` and adds the background noise
    pub fn simulate<R: Rng + ?Sized>(
        galaxy: &Image,
        psf: &Image,
        snr: f64,
        sigma: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let ground_truth = scale_to_snr(galaxy, snr, sigma)?;
        let blurred = convolve(&ground_truth, psf)?;
        let noise = add_noise(&Image::zeros(ground_truth.shape()), sigma, rng)?;
        let observed = blurred.try_add(&noise)?;
        debug!(
            "SNR {snr}: observed image range {:?}",
            observed.min_max()
        );
        Ok(Self {
            snr,
            ground_truth,
            observed,
        })
    }
}
