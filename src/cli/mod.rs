//! CLI entry point for cpstats.

pub mod auth;
pub mod dashboard;
pub mod errors;

use clap::{Args, Parser, Subcommand};

/// cpstats CLI
#[derive(Parser, Debug)]
#[command(name = "cpstats", version, about = "Competitive-programming stats from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with a one-time password sent to your email
    Login(LoginArgs),
    /// Complete registration for a new account
    Register(RegisterArgs),
    /// Log out and forget the cached session
    Logout,
    /// Show who is logged in
    ///
    /// The cached access token is kept in the session store between runs, but
    /// the server's refresh cookie is held in memory only. Once the cached
    /// token expires, a new `cpstats login` is needed.
    Status,
    /// Show a statistics report
    ///
    /// Uses the cached access token. The refresh cookie does not outlive a
    /// single run, so an expired token means logging in again.
    Report(ReportArgs),
    /// Admin panel
    Admin(AdminArgs),
}

/// Arguments for `cpstats login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username or email to send the OTP to
    pub username: String,

    /// OTP to verify (prompted for when omitted)
    #[arg(long)]
    pub otp: Option<String>,
}

/// Arguments for `cpstats register`.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Registration token printed by `cpstats login`
    #[arg(long)]
    pub registration_token: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub phone_number: String,
    #[arg(long)]
    pub gender: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub date_of_birth: String,
    #[arg(long)]
    pub country: String,
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub pin_code: String,
    #[arg(long)]
    pub codechef: Option<String>,
    #[arg(long)]
    pub codeforces: Option<String>,
    #[arg(long)]
    pub gfg: Option<String>,
    #[arg(long)]
    pub leetcode: Option<String>,
}

/// Arguments for `cpstats report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// User to report on (defaults to the logged-in user)
    pub username: Option<String>,

    /// Keep polling up to this many seconds while the report is being built
    #[arg(long)]
    pub wait: Option<u64>,
}

/// Arguments for the `admin` subcommand group.
#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommands,
}

/// Admin subcommands.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Backend health check
    Health,
    /// Permanently delete a user
    Delete { username: String },
    /// Revoke all sessions of a user
    Revoke { username: String },
}
