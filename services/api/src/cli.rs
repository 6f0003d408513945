use crate::demo::{run_demo, run_workflow_describe, DemoArgs, DescribeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use inkasso::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Inkasso Case Service",
    about = "Run the debt collection case service or explore its workflow from the command line",
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
    /// Inspect the collection workflow configuration
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommand,
    },
    /// Walk a sample case from the first reminder to enforcement
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum WorkflowCommand {
    /// Print every status with its successors, deadlines, and legal basis
    Describe(DescribeArgs),
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
        Command::Workflow {
            command: WorkflowCommand::Describe(args),
        } => run_workflow_describe(args),
        Command::Demo(args) => run_demo(args),
    }
}
