use crate::demo::{run_demo, run_resolve, run_verify, DemoArgs, ResolveArgs, VerifyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fleet_trust::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Fleet Trust",
    about = "Resolve charter operators across sources and compute explainable trust scores",
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
    /// Run a full verification for one operator against the configured providers
    Verify(VerifyArgs),
    /// Resolve an operator name against the configured directory snapshot
    Resolve(ResolveArgs),
    /// Run an offline demo over a bundled directory and in-memory evidence
    Demo(DemoArgs),
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
        Command::Verify(args) => run_verify(args).await,
        Command::Resolve(args) => run_resolve(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
