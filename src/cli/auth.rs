//! CLI handlers for login, registration, logout and status.

use std::io::Write;
use std::sync::Arc;

use super::{LoginArgs, RegisterArgs};
use crate::api::{OtpOutcome, RegistrationDetails};
use crate::auth::{FileStore, SessionManager, SessionState, SessionStore};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{ApiClient, MemoryNavigator, Navigator, Route};

/// Build a session manager over the on-disk store.
pub fn open_session() -> Result<(SessionManager, Arc<MemoryNavigator>), ClientError> {
    let config = ClientConfig::from_env()?;
    let store = SessionStore::new(Arc::new(FileStore::new(config.store_dir().clone())));
    let navigator = Arc::new(MemoryNavigator::new(Route::Dashboard));
    let client = ApiClient::new(config, store, navigator.clone())?;
    Ok((SessionManager::new(client), navigator))
}

/// Handle `cpstats login <username>`.
pub async fn handle_login(args: LoginArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (session, _) = open_session()?;

    let otp = match args.otp {
        Some(otp) => otp,
        None => {
            session.client().send_otp(&args.username).await?;
            println!("📧 OTP sent to {}", args.username);
            prompt("Enter OTP: ")?
        }
    };

    match session.verify_otp(&args.username, &otp).await? {
        OtpOutcome::Authenticated { .. } => {
            let user = session
                .current_user()
                .map(|u| u.username)
                .unwrap_or_else(|| args.username.clone());
            println!("✅ Logged in as {user}");
        }
        OtpOutcome::RegistrationRequired {
            email,
            registration_token,
        } => {
            println!("🆕 New account detected for {email}. Please complete registration:");
            match registration_token {
                Some(token) => println!(
                    "   cpstats register --registration-token {token} --username <name> ..."
                ),
                None => println!("   (the server did not issue a registration token; try again)"),
            }
        }
    }
    Ok(())
}

/// Handle `cpstats register ...`.
pub async fn handle_register(args: RegisterArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (session, _) = open_session()?;

    let details = RegistrationDetails::builder()
        .registration_token(args.registration_token)
        .username(args.username)
        .full_name(args.full_name)
        .phone_number(args.phone_number)
        .maybe_gender(args.gender)
        .date_of_birth(args.date_of_birth)
        .country(args.country)
        .state(args.state)
        .city(args.city)
        .pin_code(args.pin_code)
        .maybe_codechef_handle(args.codechef)
        .maybe_codeforces_handle(args.codeforces)
        .maybe_gfg_handle(args.gfg)
        .maybe_leetcode_handle(args.leetcode)
        .build();

    let user = session.complete_registration(details).await?;
    println!("✅ Profile created. Logged in as {}", user.username);
    println!("⏳ Your first report is being built; try `cpstats report --wait 120`.");
    Ok(())
}

/// Handle `cpstats logout`.
pub async fn handle_logout() -> Result<(), Box<dyn std::error::Error>> {
    let (session, _) = open_session()?;
    session.logout().await;
    println!("✅ Logged out");
    Ok(())
}

/// Handle `cpstats status`.
pub async fn handle_status() -> Result<(), Box<dyn std::error::Error>> {
    let (session, navigator) = open_session()?;

    println!("🔐 Session Status\n");
    match session.bootstrap().await {
        SessionState::Authenticated(user) => {
            println!("  User:  {}", user.username);
            println!(
                "  Roles: {}",
                if user.roles.is_empty() {
                    "-".to_string()
                } else {
                    user.roles.join(", ")
                }
            );
            match user.expires_at() {
                Some(at) if user.is_expired() => println!(
                    "  Token: ⚠️  expired {} (run `cpstats login` if it cannot be refreshed)",
                    at.format("%Y-%m-%d %H:%M")
                ),
                Some(at) => println!("  Token: ✅ valid until {}", at.format("%Y-%m-%d %H:%M")),
                None => println!("  Token: ✅ valid"),
            }
        }
        SessionState::Guest => println!("  ❌ Not logged in"),
    }
    println!("  Device: {}", session.client().store().device_id()?);
    if navigator.current() == Route::Login {
        println!("\n  Run: cpstats login <username>");
    }
    Ok(())
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
