/*!
# Images

[`Image`] is the 2-D flux container shared by the convolution, noise and
deconvolution modules. It wraps a [`nalgebra::DMatrix`] indexed by
`(row, column)` and only exposes shape-checked arithmetic: combining two
images of different shapes is an [`ImageError::ShapeMismatch`], never a
broadcast.
*/

use std::ops::Deref;

use nalgebra as na;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ImageError {
    #[error("image shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("cannot normalize an image which sum is zero")]
    ZeroSum,
}
type Result<T> = std::result::Result<T, ImageError>;

/// 2-D grid of flux samples
#[derive(Debug, Clone, PartialEq)]
pub struct Image(na::DMatrix<f64>);
impl Deref for Image {
    type Target = na::DMatrix<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<na::DMatrix<f64>> for Image {
    fn from(data: na::DMatrix<f64>) -> Self {
        Self(data)
    }
}
impl From<Image> for na::DMatrix<f64> {
    fn from(image: Image) -> Self {
        image.0
    }
}
impl Image {
    /// Image filled with zeros
    pub fn zeros((nrows, ncols): (usize, usize)) -> Self {
        Self(na::DMatrix::zeros(nrows, ncols))
    }
    /// Image from data stored row after row
    pub fn from_row_slice(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        Self(na::DMatrix::from_row_slice(nrows, ncols, data))
    }
    /// Image from a function of `(row, column)`
    pub fn from_fn<F>(nrows: usize, ncols: usize, f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        Self(na::DMatrix::from_fn(nrows, ncols, f))
    }
    /// Unit impulse located at the array center `(nrows/2, ncols/2)`
    pub fn impulse((nrows, ncols): (usize, usize)) -> Self {
        let mut data = na::DMatrix::zeros(nrows, ncols);
        if nrows > 0 && ncols > 0 {
            data[(nrows / 2, ncols / 2)] = 1f64;
        }
        Self(data)
    }
    pub fn into_inner(self) -> na::DMatrix<f64> {
        self.0
    }
    /// Sum of squared samples
    pub fn energy(&self) -> f64 {
        self.0.iter().map(|x| x * x).sum()
    }
    /// Returns the image divided by its sum
    pub fn normalized(&self) -> Result<Self> {
        let sum = self.0.sum();
        if sum == 0f64 {
            return Err(ImageError::ZeroSum);
        }
        Ok(Self(&self.0 / sum))
    }
    /// Returns the image multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        Self(&self.0 * factor)
    }
    /// Checks that `other` has the same shape than `self`
    pub fn ensure_same_shape(&self, other: &Image) -> Result<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(ImageError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            })
        }
    }
    /// Pixel-wise sum of two images of identical shape
    pub fn try_add(&self, other: &Image) -> Result<Self> {
        self.ensure_same_shape(other)?;
        Ok(Self(&self.0 + &other.0))
    }
    /// Pixel-wise difference of two images of identical shape
    pub fn try_sub(&self, other: &Image) -> Result<Self> {
        self.ensure_same_shape(other)?;
        Ok(Self(&self.0 - &other.0))
    }
    /// Minimum and maximum sample values
    pub fn min_max(&self) -> (f64, f64) {
        let min = self.0.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.0.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }
    /// Returns true if no sample is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }
    /// Zero padding with `rows` rows on top and bottom and `cols` columns on left and right
    pub fn padded(&self, rows: usize, cols: usize) -> Self {
        let (nrows, ncols) = self.shape();
        let mut data = na::DMatrix::zeros(nrows + 2 * rows, ncols + 2 * cols);
        data.view_mut((rows, cols), (nrows, ncols)).copy_from(&self.0);
        Self(data)
    }
    /// Quartile crop: keeps rows `H/4..3H/4` and columns `W/4..3W/4`
    ///
    /// Integer division is applied to the bounds, so an odd padded extent
    /// returns one row (or column) less than half of it.
    pub fn quartile_crop(&self) -> Self {
        let (nrows, ncols) = self.shape();
        let (r0, r1) = (nrows / 4, 3 * nrows / 4);
        let (c0, c1) = (ncols / 4, 3 * ncols / 4);
        Self(self.0.view((r0, c0), (r1 - r0, c1 - c0)).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize() {
        let image = Image::from_row_slice(2, 2, &[1., 2., 3., 4.]);
        let normed = image.normalized().unwrap();
        assert!((normed.sum() - 1f64).abs() < 1e-12);
        assert_eq!(normed[(1, 0)], 0.3);
    }

    #[test]
    fn normalize_zero_sum() {
        assert_eq!(
            Image::zeros((3, 3)).normalized(),
            Err(ImageError::ZeroSum)
        );
    }

    #[test]
    fn shape_mismatch() {
        let a = Image::zeros((4, 4));
        let b = Image::zeros((4, 3));
        assert_eq!(
            a.try_add(&b),
            Err(ImageError::ShapeMismatch {
                expected: (4, 4),
                found: (4, 3)
            })
        );
    }

    #[test]
    fn pad_then_crop() {
        let image = Image::from_fn(4, 6, |i, j| (i * 6 + j) as f64);
        let padded = image.padded(2, 3);
        assert_eq!(padded.shape(), (8, 12));
        assert_eq!(padded.sum(), image.sum());
        assert_eq!(padded.quartile_crop(), image);
    }

    #[test]
    fn odd_crop_loses_a_row() {
        let image = Image::from_fn(5, 4, |i, j| (i + j) as f64);
        let padded = image.padded(5 / 2, 4 / 2);
        assert_eq!(padded.shape(), (9, 8));
        assert_eq!(padded.quartile_crop().shape(), (4, 4));
    }

    #[test]
    fn impulse_at_center() {
        let image = Image::impulse((5, 4));
        assert_eq!(image[(2, 2)], 1f64);
        assert_eq!(image.sum(), 1f64);
    }
}
