//! Authenticated HTTP client with single-flight session refresh.

pub mod client;
pub mod navigator;
pub mod refresh;
pub mod request;
pub mod transport;

pub use client::{classify, ApiClient, Disposition};
pub use navigator::{MemoryNavigator, Navigator, Route};
pub use refresh::{RefreshCoordinator, RefreshOutcome, RefreshTicket};
pub use request::{ApiRequest, ApiResponse, AuthMode, RequestKind};
pub use transport::{ReqwestTransport, Transport};
