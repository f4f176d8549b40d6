use crate::report::{run_assess, run_extract, AssessArgs, ExtractArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use copria::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "CoPRIA",
    about = "Commercial Property Risk Intelligence Assistant: normalize submissions and flag underwriting risks",
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
    /// Assess a JSON file of structured submissions
    Assess(AssessArgs),
    /// Extract and assess a single free-text submission
    Extract(ExtractArgs),
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
        Command::Assess(args) => run_assess(args),
        Command::Extract(args) => run_extract(args).await,
    }
}
