//! NumPy array loading
//!
//! Galaxy and PSF frames are stored as 2-D `float64` (or `float32`) arrays,
//! either as standalone `.npy` files or as named entries of a `.npz` archive.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::{Path, PathBuf},
    time::Instant,
};

use npyz::{npz::NpzArchive, DType, NpyFile, Order};

use crate::Image;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed to open {1:?}")]
    Open(#[source] io::Error, PathBuf),
    #[error("failed to read the array from {1:?}")]
    Read(#[source] io::Error, PathBuf),
    #[error("array {0:?} not found in {1:?}")]
    Missing(String, PathBuf),
    #[error("failed to read the archive {1:?}")]
    Archive(#[source] io::Error, PathBuf),
    #[error("expected a 2-D array in {1:?}, found shape {0:?}")]
    Shape(Vec<u64>, PathBuf),
    #[error("unsupported array type {0} in {1:?}, expected f4 or f8")]
    DType(String, PathBuf),
}
type Result<T> = std::result::Result<T, IoError>;

fn read_image<R: Read>(npy: NpyFile<R>, path: &Path) -> Result<Image> {
    let (nrows, ncols) = match npy.shape() {
        &[nrows, ncols] => (nrows as usize, ncols as usize),
        shape => return Err(IoError::Shape(shape.to_vec(), path.to_path_buf())),
    };
    let order = npy.order();
    let descr = match npy.dtype() {
        DType::Plain(ty) => ty.to_string(),
        dtype => return Err(IoError::DType(format!("{dtype:?}"), path.to_path_buf())),
    };
    let data: Vec<f64> = if descr.ends_with("f8") {
        npy.into_vec::<f64>()
            .map_err(|e| IoError::Read(e, path.to_path_buf()))?
    } else if descr.ends_with("f4") {
        npy.into_vec::<f32>()
            .map_err(|e| IoError::Read(e, path.to_path_buf()))?
            .into_iter()
            .map(f64::from)
            .collect()
    } else {
        return Err(IoError::DType(descr, path.to_path_buf()));
    };
    Ok(match order {
        Order::C => Image::from_row_slice(nrows, ncols, &data),
        Order::Fortran => nalgebra::DMatrix::from_column_slice(nrows, ncols, &data).into(),
    })
}

/// Loads a 2-D array from a `.npy` file
pub fn load_npy<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    log::info!("Loading {:?}...", path);
    let now = Instant::now();
    let file = File::open(path).map_err(|e| IoError::Open(e, path.to_path_buf()))?;
    let npy = NpyFile::new(BufReader::new(file)).map_err(|e| IoError::Read(e, path.to_path_buf()))?;
    let image = read_image(npy, path)?;
    log::info!("... loaded {:?} in {:}ms", image.shape(), now.elapsed().as_millis());
    Ok(image)
}

/// Loads the 2-D array `name` from a `.npz` archive
pub fn load_npz<P: AsRef<Path>>(path: P, name: &str) -> Result<Image> {
    let path = path.as_ref();
    log::info!("Loading {:?} from {:?}...", name, path);
    let mut npz = NpzArchive::open(path).map_err(|e| IoError::Open(e, path.to_path_buf()))?;
    let image = match npz.by_name(name) {
        Ok(Some(npy)) => read_image(npy, path),
        Ok(None) => Err(IoError::Missing(name.to_string(), path.to_path_buf())),
        Err(e) => Err(IoError::Archive(e, path.to_path_buf())),
    };
    image
}
