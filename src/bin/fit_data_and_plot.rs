//! Fit a persisted dataset snapshot and render accuracy/loss plots.
//!
//! Usage:
//! `fit-data-and-plot --data data/<uuid>.dlab --signature "F=15, OBS=10000, ..."`
//!
//! Exit code is 0 on success and 1 on any failure; the failing stage is
//! reported on stderr.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use datalab::plot::CurvePlot;
use datalab::{Dataset, FitParams, Trainer};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    data: PathBuf,
    signature: String,
    epochs: usize,
    batch_size: usize,
    out_dir: PathBuf,
    history_json: Option<PathBuf>,
    seed: Option<u64>,
}

fn print_help_and_exit() -> ! {
    eprintln!(
        "Fits the model with a data set snapshot and produces accuracy and loss plots.\n\
         \n\
         Usage: fit-data-and-plot --data <snapshot> --signature <text> [options]\n\
         \n\
         Options:\n\
         \x20 --data <path>          dataset snapshot (.dlab) to fit\n\
         \x20 --signature <text>     free-text data signature used in plot titles\n\
         \x20 --epochs <n>           fitting epochs (default 300)\n\
         \x20 --batch <n>            minibatch size (default 512)\n\
         \x20 --out-dir <dir>        plot output directory (default plots)\n\
         \x20 --history-json <path>  also write the fit history as JSON\n\
         \x20 --seed <n>             fixed seed for reproducible fitting"
    );
    std::process::exit(2);
}

fn parse_args() -> Args {
    let mut data: Option<PathBuf> = None;
    let mut signature = String::new();
    let mut epochs = 300usize;
    let mut batch_size = 512usize;
    let mut out_dir = PathBuf::from("plots");
    let mut history_json: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data" => data = Some(PathBuf::from(it.next().expect("--data requires a path"))),
            "--signature" => signature = it.next().expect("--signature requires a value"),
            "--epochs" => epochs = it.next().expect("--epochs value").parse().unwrap(),
            "--batch" => batch_size = it.next().expect("--batch value").parse().unwrap(),
            "--out-dir" => out_dir = PathBuf::from(it.next().expect("--out-dir path")),
            "--history-json" => {
                history_json = Some(PathBuf::from(it.next().expect("--history-json path")))
            }
            "--seed" => seed = Some(it.next().expect("--seed value").parse().unwrap()),
            "--help" => print_help_and_exit(),
            other => {
                eprintln!("unknown arg: {other}");
                print_help_and_exit();
            }
        }
    }

    let Some(data) = data else {
        eprintln!("--data is required");
        print_help_and_exit();
    };
    Args {
        data,
        signature,
        epochs,
        batch_size,
        out_dir,
        history_json,
        seed,
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let data = Dataset::new().read(&args.data)?;

    let trainer = Trainer::new(FitParams {
        batch_size: args.batch_size,
        epochs: args.epochs,
        seed: args.seed,
        ..FitParams::default()
    });
    let history = trainer.fit(&data)?;

    if let Some(path) = &args.history_json {
        fs::write(path, serde_json::to_string_pretty(&history)?)?;
        println!("history: {}", path.display());
    }

    let accuracy = CurvePlot::accuracy(&args.signature, &args.out_dir)
        .render(&history.train_accuracy, &history.val_accuracy)?;
    let loss = CurvePlot::loss(&args.signature, &args.out_dir)
        .render(&history.train_loss, &history.val_loss)?;

    println!("accuracy plot: {}", accuracy.display());
    println!("loss plot: {}", loss.display());
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
            error!("fit-data-and-plot failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
