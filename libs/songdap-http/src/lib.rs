//! HTTP plumbing for the Songdap client.
//!
//! Every backend call flows through [`AuthRefreshGate::execute`], which wraps an
//! [`HttpTransport`] (normally the traced reqwest client) and turns an expired
//! access token into a single shared refresh followed by one replay of each
//! affected request.

pub mod client;
pub mod error;
pub mod gate;
pub mod refresh;
pub mod request;
pub mod session;
pub mod simple_otel;

pub use client::{ClientOptions, HttpTransport, TracedClient};
pub use error::HttpError;
pub use gate::{AuthRefreshGate, GateOptions};
pub use refresh::{Acquire, RefreshCoordinator, RefreshLease, RefreshOutcome, RefreshWait};
pub use request::{ApiRequest, ApiResponse};
pub use session::{ExpiryReason, SessionObserver, SessionState, SessionStatus};

pub use http::{Method, StatusCode};
