use crate::commands::{run_locate, run_predict, run_train, LocateArgs, PredictArgs, TrainArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rent_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "rent-ai",
    about = "Estimate monthly rents in Santa Cruz de la Sierra from location and listing data",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Generate a synthetic dataset, train the forest, and persist both
    Train(TrainArgs),
    /// Price a single listing
    Predict(PredictArgs),
    /// Show the ring and zone classification of a coordinate
    Locate(LocateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Train(args) => run_train(args),
        Command::Predict(args) => run_predict(args),
        Command::Locate(args) => run_locate(args),
    }
}
