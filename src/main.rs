use clap::{Parser, Subcommand};
use sheetkeeper::settings::Settings;
use sheetkeeper::{create_admin, run_server, ServerError};

#[derive(Parser)]
#[clap(version, about = "Character sheet server")]
struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create an administrator account interactively.
    CreateAdmin,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let cli = Cli::parse();
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Cannot read configuration: {e}");
            std::process::exit(2);
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(settings).await,
        Command::CreateAdmin => create_admin(&settings).await,
    }
}
