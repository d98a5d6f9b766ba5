use clap::Parser;
use growth_sim::api::{self, Cli, Command};
use growth_sim::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let constants = match api::build_constants(&cli.constants) {
        Ok(constants) => constants,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(1);
        }
    };

    let outcome = match cli.command {
        Command::Project(args) => api::run_project(&args, &constants),
        Command::Presets => api::print_presets(&constants),
        Command::Serve { port } => api::run_http_server(port, constants)
            .await
            .map_err(|e| format!("Server error: {e}")),
    };

    if let Err(msg) = outcome {
        eprintln!("{msg}");
        std::process::exit(1);
    }
}
