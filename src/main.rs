//! cpstats CLI binary entry point.

use clap::Parser;
use cpstats::cli::{Cli, Commands};
use cpstats::error::ClientError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login(args) => cpstats::cli::auth::handle_login(args).await,
        Commands::Register(args) => cpstats::cli::auth::handle_register(args).await,
        Commands::Logout => cpstats::cli::auth::handle_logout().await,
        Commands::Status => cpstats::cli::auth::handle_status().await,
        Commands::Report(args) => cpstats::cli::dashboard::handle_report(args).await,
        Commands::Admin(admin) => cpstats::cli::dashboard::handle_admin(admin.command).await,
    };

    if let Err(e) = result {
        // Try to downcast to ClientError for actionable help text
        let message = if let Some(client_err) = e.downcast_ref::<ClientError>() {
            cpstats::cli::errors::format_error_help(client_err)
        } else {
            format!("{e}")
        };
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}
