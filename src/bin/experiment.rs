//! End-to-end experiment driver.
//!
//! Builds a random dataset, labels it, injects noise features, splits it,
//! injects missing values and saves the damaged snapshot; then produces two
//! repaired copies (zero fill and column-mean fill), saving each and fitting
//! and plotting both in process.
//!
//! Run with:
//! `cargo run --bin experiment -- --observations 10000 --features 15`

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use datalab::plot::CurvePlot;
use datalab::{Damage, Dataset, Fix, FitParams, TargetFn, Trainer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    observations: usize,
    features: usize,
    noise_features: usize,
    na_proportion: f64,
    test_fraction: f64,
    epochs: usize,
    batch_size: usize,
    data_dir: PathBuf,
    plot_dir: PathBuf,
    seed: Option<u64>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            observations: 10_000,
            features: 15,
            noise_features: 5,
            na_proportion: 0.001,
            test_fraction: 0.3,
            epochs: 300,
            batch_size: 512,
            data_dir: PathBuf::from("data"),
            plot_dir: PathBuf::from("plots"),
            seed: None,
        }
    }
}

fn print_help_and_exit() -> ! {
    eprintln!(
        "Runs the full damage/repair experiment and plots fitting curves.\n\
         \n\
         Usage: experiment [options]\n\
         \n\
         Options:\n\
         \x20 --observations <n>    rows of random data (default 10000)\n\
         \x20 --features <n>        informative feature columns (default 15)\n\
         \x20 --noise-features <n>  appended noise columns (default 5)\n\
         \x20 --na <q>              missing-cell proportion in [0,1) (default 0.001)\n\
         \x20 --split <f>           test fraction in (0,1) (default 0.3)\n\
         \x20 --epochs <n>          fitting epochs (default 300)\n\
         \x20 --batch <n>           minibatch size (default 512)\n\
         \x20 --data-dir <dir>      snapshot directory (default data)\n\
         \x20 --plot-dir <dir>      plot directory (default plots)\n\
         \x20 --seed <n>            fixed seed for a reproducible run"
    );
    std::process::exit(2);
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--observations" => {
                args.observations = it.next().expect("--observations value").parse().unwrap()
            }
            "--features" => args.features = it.next().expect("--features value").parse().unwrap(),
            "--noise-features" => {
                args.noise_features = it.next().expect("--noise-features value").parse().unwrap()
            }
            "--na" => args.na_proportion = it.next().expect("--na value").parse().unwrap(),
            "--split" => args.test_fraction = it.next().expect("--split value").parse().unwrap(),
            "--epochs" => args.epochs = it.next().expect("--epochs value").parse().unwrap(),
            "--batch" => args.batch_size = it.next().expect("--batch value").parse().unwrap(),
            "--data-dir" => args.data_dir = PathBuf::from(it.next().expect("--data-dir path")),
            "--plot-dir" => args.plot_dir = PathBuf::from(it.next().expect("--plot-dir path")),
            "--seed" => args.seed = Some(it.next().expect("--seed value").parse().unwrap()),
            "--help" => print_help_and_exit(),
            other => {
                eprintln!("unknown arg: {other}");
                print_help_and_exit();
            }
        }
    }
    args
}

fn fit_and_plot(
    args: &Args,
    snapshot: &Path,
    signature: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = Dataset::new().read(snapshot)?;
    let trainer = Trainer::new(FitParams {
        batch_size: args.batch_size,
        epochs: args.epochs,
        seed: args.seed,
        ..FitParams::default()
    });
    let history = trainer.fit(&data)?;

    let accuracy = CurvePlot::accuracy(signature, &args.plot_dir)
        .render(&history.train_accuracy, &history.val_accuracy)?;
    let loss =
        CurvePlot::loss(signature, &args.plot_dir).render(&history.train_loss, &history.val_loss)?;
    println!("{signature}");
    println!("  accuracy plot: {}", accuracy.display());
    println!("  loss plot: {}", loss.display());
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(&args.data_dir)?;

    let base = match args.seed {
        Some(seed) => Dataset::with_seed(seed),
        None => Dataset::new(),
    };

    let damaged = base
        .random(args.observations, args.features)
        .make_target(TargetFn::Alpha)?
        .damage(Damage::NoiseFeatures(args.noise_features))?
        .split(args.test_fraction)?
        .damage(Damage::NaCells(args.na_proportion))?
        .save(&args.data_dir)?;
    info!(snapshot = %damaged.display(), "damaged dataset saved");

    let fix_zero = Dataset::new()
        .read(&damaged)?
        .fix(Fix::Zero)?
        .save(&args.data_dir)?;
    let fix_mean = Dataset::new()
        .read(&damaged)?
        .fix(Fix::ColumnMean)?
        .save(&args.data_dir)?;

    let signature = |fx: &str| {
        format!(
            "F={}, OBS={}, NF={}, NA={}, FX={fx}, SPL={}",
            args.features, args.observations, args.noise_features, args.na_proportion,
            args.test_fraction
        )
    };

    fit_and_plot(args, &fix_zero, &signature("0"))?;
    fit_and_plot(args, &fix_mean, &signature("Mu"))?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = parse_args();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("experiment failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
