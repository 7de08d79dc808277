//! CLI handlers for reports and the admin panel.

use std::time::Duration;

use strum::IntoEnumIterator;

use super::auth::open_session;
use super::{AdminCommands, ReportArgs};
use crate::api::{Platform, Report};
use crate::auth::SessionState;
use crate::error::ClientError;

/// Handle `cpstats report [username] [--wait SECS]`.
pub async fn handle_report(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (session, _) = open_session()?;

    let username = match (args.username, session.bootstrap().await) {
        (Some(username), _) => username,
        (None, SessionState::Authenticated(user)) => user.username,
        (None, SessionState::Guest) => {
            return Err(ClientError::Authentication("no active session".to_string()).into());
        }
    };

    let report = match args.wait {
        Some(secs) => {
            println!("⏳ Waiting up to {secs}s for the report of {username}...");
            session
                .client()
                .wait_for_report(&username, Duration::from_secs(secs))
                .await?
        }
        None => session.client().report(&username).await?,
    };

    print_report(&username, &report);
    Ok(())
}

fn print_report(username: &str, report: &Report) {
    let summary = report.summary();
    println!("📊 Report for {username}\n");
    println!("  Total solved: {}", summary.total_solved);
    println!("  Max rating:   {:.0}\n", summary.max_rating);

    for platform in Platform::iter() {
        match report.platform(platform) {
            Some(stats) if platform.is_rated() => println!(
                "  {:<14} solved {:>5}   rating {:>6.0}",
                platform.to_string(),
                stats.problems_solved_total(),
                stats.rating()
            ),
            Some(stats) => println!(
                "  {:<14} solved {:>5}",
                platform.to_string(),
                stats.problems_solved_total()
            ),
            None => println!("  {:<14} -", platform.to_string()),
        }
    }
}

/// Handle `cpstats admin ...`.
pub async fn handle_admin(command: AdminCommands) -> Result<(), Box<dyn std::error::Error>> {
    let (session, _) = open_session()?;
    if let SessionState::Authenticated(user) = session.bootstrap().await {
        if !user.is_admin() {
            tracing::warn!(username = %user.username, "Admin command issued without ROLE_ADMIN");
        }
    }

    match command {
        AdminCommands::Health => {
            let health = session.client().health().await?;
            println!("🩺 Backend health\n");
            println!("  Server:     {}", health.server);
            println!("  Database:   {}", health.database);
            println!("  Memory:     {:.1} MiB", health.used_memory_mib());
            println!("  Processors: {}", health.available_processors);
            println!("  Version:    {}", health.version);
            println!("  Checked at: {}", health.timestamp);
        }
        AdminCommands::Delete { username } => {
            session.client().delete_user(&username).await?;
            println!("🗑️  Deleted user {username}");
        }
        AdminCommands::Revoke { username } => {
            session.client().revoke_sessions(&username).await?;
            println!("✅ Revoked all sessions of {username}");
        }
    }
    Ok(())
}
