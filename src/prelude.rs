//! Convenience re-exports for common use.

pub use crate::api::{HealthReport, OtpOutcome, RegistrationDetails, Report, ReportSummary};
pub use crate::auth::{FileStore, SessionManager, SessionState, SessionStore, UserProfile};
pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::http::{ApiClient, ApiRequest, MemoryNavigator, Navigator, Route};
