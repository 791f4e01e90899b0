use crate::{
    evaluation::EvaluationError, image::ImageError, io::IoError, metrics::MetricsError,
    noise::NoiseError, wiener::WienerError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `image` module")]
    Image(#[from] ImageError),
    #[error("Error in the `io` module")]
    Io(#[from] IoError),
    #[error("Error in the `noise` module")]
    Noise(#[from] NoiseError),
    #[error("Error in the `wiener` module")]
    Wiener(#[from] WienerError),
    #[error("Error in the `metrics` module")]
    Metrics(#[from] MetricsError),
    #[error("Error in the `evaluation` module")]
    Evaluation(#[from] EvaluationError),
    #[cfg(feature = "plot")]
    #[error("Error in the `plot` module")]
    Plot(#[from] crate::plot::PlotError),
}
