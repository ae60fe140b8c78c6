// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap` and delegates to Layer 2 (application):
//
//   1. `train`   — trains the model and writes checkpoints
//   2. `predict` — scores one JSON sample from disk
//   3. `serve`   — serves the model over HTTP
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, ServeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "scamscope",
    version,
    about = "Train a hybrid LSTM + CodeBERT scam classifier for crypto tokens, then score or serve it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case; never computes itself.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Serve(args)   => run_serve(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training; checkpoints go to '{}'", args.checkpoint_dir);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "\nTraining complete after {} epochs (final train_loss {:.4}, val_loss {:.4}).",
        summary.epochs, summary.last.train_loss, summary.last.val_loss
    );
    match summary.best {
        Some(best) => println!("Best model from epoch {} (loss {:.4}).", best.epoch, best.loss),
        None => println!("Checkpoint saved."),
    }
    if let Some(test) = summary.test {
        println!(
            "Test set: loss {:.4}, accuracy {:.1}% over {} samples.",
            test.loss, test.accuracy * 100.0, test.samples
        );
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.checkpoint_dir, args.raw_csv_data)?;
    let p = use_case.predict_file(&args.input)?;
    println!("\nScam probability: {:.4}", p);
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    use crate::application::serve_use_case::ServeUseCase;

    ServeUseCase::new(args.checkpoint_dir, &args.host, args.port).execute()
}
