//! Typed backend endpoints, as methods on [`ApiClient`](crate::http::ApiClient).

pub mod admin;
pub mod auth;
pub mod reports;

pub use admin::HealthReport;
pub use auth::{AuthResponse, OtpOutcome, RegistrationDetails, RegistrationPayload};
pub use reports::{Platform, PlatformStats, Report, ReportSummary};
