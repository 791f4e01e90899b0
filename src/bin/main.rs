use std::{env, path::PathBuf, time::Instant};

use galaxy_deconv::{load_normalized, load_normalized_npz, Evaluation};
use rand::{rngs::StdRng, SeedableRng};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "galaxy-deconv",
    about = "Wiener deconvolution of simulated galaxy observations"
)]
struct Opt {
    /// Galaxy image [default: $DECONV_DATA/galaxy.npy]
    #[structopt(long, parse(from_os_str))]
    galaxy: Option<PathBuf>,
    /// PSF image [default: $DECONV_DATA/psf.npy]
    #[structopt(long, parse(from_os_str))]
    psf: Option<PathBuf>,
    /// Archive with both `galaxy` and `psf` arrays, supersedes `--galaxy` and `--psf`
    #[structopt(long, parse(from_os_str))]
    npz: Option<PathBuf>,
    /// Random generator seed
    #[structopt(short, long)]
    seed: Option<u64>,
    /// Save the metrics to a CSV file
    #[structopt(long, parse(from_os_str))]
    csv: Option<PathBuf>,
    /// Comparison figure
    #[cfg(feature = "plot")]
    #[structopt(short, long, parse(from_os_str), default_value = "wiener_comparison.png")]
    figure: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();
    let now = Instant::now();

    let (galaxy, psf) = if let Some(npz) = &opt.npz {
        (
            load_normalized_npz(npz, "galaxy")?,
            load_normalized_npz(npz, "psf")?,
        )
    } else {
        let data = PathBuf::from(env::var("DECONV_DATA").unwrap_or_else(|_| "data".to_string()));
        (
            load_normalized(opt.galaxy.unwrap_or_else(|| data.join("galaxy.npy")))?,
            load_normalized(opt.psf.unwrap_or_else(|| data.join("psf.npy")))?,
        )
    };

    let mut rng = match opt.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let report = Evaluation::default().run(&galaxy, &psf, &mut rng)?;
    println!("{report}");
    for cell in report.best() {
        println!(
            "SNR={:>4.0}: best lambda={} ({:.2}dB, SSIM={:.4})",
            cell.snr, cell.lambda, cell.psnr, cell.ssim
        );
    }

    if let Some(path) = &opt.csv {
        report.to_csv(path)?;
        println!("Metrics saved to {:?}", path);
    }
    #[cfg(feature = "plot")]
    {
        report.plot(&opt.figure)?;
        println!("Comparison figure saved to {:?}", opt.figure);
    }

    println!("Completed in {:.2}s", now.elapsed().as_secs_f64());
    Ok(())
}
