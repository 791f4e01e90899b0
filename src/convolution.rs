/*!
# Spectral convolution

Linear convolution of an image with a kernel, computed as a circular
convolution of the zero padded arrays in the Fourier domain.

Both arrays are padded with `H/2` rows and `W/2` columns on each side,
transformed, multiplied and transformed back. The result is the centered
quartile crop of the padded product. With odd dimensions the integer
divisions make the crop one row (or column) short of the input shape.
*/

use crate::{
    fourier::{fftshift, ifftshift, irfft2, rfft2},
    image::ImageError,
    Image,
};

/// Convolves `image` with `kernel`
///
/// The kernel is expected to be centered on `(H/2, W/2)` and to have the
/// same shape than the image.
pub fn convolve(image: &Image, kernel: &Image) -> Result<Image, ImageError> {
    image.ensure_same_shape(kernel)?;
    let (nrows, ncols) = image.shape();
    let (pad_rows, pad_cols) = (nrows / 2, ncols / 2);

    let image_fft = rfft2(&ifftshift(&image.padded(pad_rows, pad_cols).into_inner()).into());
    let kernel_fft = rfft2(&ifftshift(&kernel.padded(pad_rows, pad_cols).into_inner()).into());
    let product = image_fft.component_mul(&kernel_fft);

    let convolved: Image = fftshift(&irfft2(product).into_inner()).into();
    Ok(convolved.quartile_crop())
}
