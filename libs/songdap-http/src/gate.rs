//! Auth refresh gate: the decorator every backend call goes through.
//!
//! - 2xx: returned as is.
//! - 401 on a fresh, non-excluded request: one shared refresh, then a single replay.
//! - 401 after the replay, or a failed refresh: terminal, `SessionExpired`.
//! - 403: terminal for that request, optionally raising the session signal.
//! - no response at all: passed through untouched.

use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::client::HttpTransport;
use crate::error::HttpError;
use crate::refresh::{Acquire, RefreshCoordinator, RefreshOutcome};
use crate::request::{ApiRequest, ApiResponse};
use crate::session::{ExpiryReason, SessionObserver};

/// Endpoints and policy knobs for the gate.
#[derive(Debug, Clone)]
pub struct GateOptions {
    pub reissue_path: String,
    pub logout_path: String,
    /// Treat 403 like an expired session (the backend does not distinguish
    /// "not signed in" from "not allowed" reliably).
    pub forbidden_signals_session_expiry: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            reissue_path: "/auth/reissue".to_string(),
            logout_path: "/auth/logout".to_string(),
            forbidden_signals_session_expiry: true,
        }
    }
}

pub struct AuthRefreshGate {
    transport: Arc<dyn HttpTransport>,
    observer: Arc<dyn SessionObserver>,
    coordinator: RefreshCoordinator,
    options: GateOptions,
}

impl std::fmt::Debug for AuthRefreshGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRefreshGate")
            .field("coordinator", &self.coordinator)
            .field("options", &self.options)
            .finish()
    }
}

impl AuthRefreshGate {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        observer: Arc<dyn SessionObserver>,
        options: GateOptions,
    ) -> Self {
        Self {
            transport,
            observer,
            coordinator: RefreshCoordinator::new(),
            options,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    /// Send `request`, transparently refreshing the session once if needed.
    #[instrument(
        name = "songdap.http.gate.execute",
        skip_all,
        fields(method = %request.method(), path = %request.path())
    )]
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, HttpError> {
        let mut request = request;
        loop {
            let response = self.transport.send(&request).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            match status {
                StatusCode::UNAUTHORIZED if request.is_excluded_from_refresh() => {
                    return Err(response.into_status_error(request.path()));
                }
                StatusCode::UNAUTHORIZED if request.is_retried() => {
                    warn!("request rejected again after a token refresh");
                    self.observer
                        .on_session_expired(ExpiryReason::RetryExhausted);
                    return Err(HttpError::SessionExpired);
                }
                StatusCode::UNAUTHORIZED => {
                    self.refresh_session().await?;
                    request.mark_retried();
                    debug!("replaying request with renewed session");
                }
                StatusCode::FORBIDDEN => {
                    if !request.is_excluded_from_refresh()
                        && self.options.forbidden_signals_session_expiry
                    {
                        self.observer.on_session_expired(ExpiryReason::Forbidden);
                    }
                    return Err(HttpError::Forbidden {
                        path: request.path().to_string(),
                    });
                }
                _ => return Err(response.into_status_error(request.path())),
            }
        }
    }

    /// `execute` followed by JSON decoding of the body.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, HttpError> {
        let path = request.path().to_string();
        self.execute(request).await?.json(&path)
    }

    /// Explicit sign-out. Errors are reported, unlike the best-effort variant
    /// used after a failed refresh.
    #[instrument(name = "songdap.http.gate.logout", skip_all)]
    pub async fn logout(&self) -> Result<(), HttpError> {
        let request = ApiRequest::post(&self.options.logout_path).excluded_from_refresh();
        let response = self.transport.send(&request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(response.into_status_error(request.path()))
        }
    }

    async fn refresh_session(&self) -> Result<(), HttpError> {
        loop {
            match self.coordinator.acquire_or_wait() {
                Acquire::Leader(lease) => {
                    let outcome = self.reissue().await;
                    lease.release(outcome);

                    if outcome == RefreshOutcome::Renewed {
                        return Ok(());
                    }
                    if let Err(e) = self.logout().await {
                        debug!(error = %e, "best-effort logout failed");
                    }
                    self.observer
                        .on_session_expired(ExpiryReason::RefreshFailed);
                    return Err(HttpError::SessionExpired);
                }
                Acquire::Waiter(wait) => match wait.outcome().await {
                    RefreshOutcome::Renewed => return Ok(()),
                    RefreshOutcome::Failed => return Err(HttpError::SessionExpired),
                    RefreshOutcome::Abandoned => {
                        debug!("refresh leader went away, retrying refresh");
                    }
                },
            }
        }
    }

    #[instrument(name = "songdap.http.gate.reissue", skip_all)]
    async fn reissue(&self) -> RefreshOutcome {
        let request = ApiRequest::post(&self.options.reissue_path).excluded_from_refresh();
        match self.transport.send(&request).await {
            Ok(r) if r.status().is_success() => {
                debug!("access token reissued");
                RefreshOutcome::Renewed
            }
            Ok(r) => {
                warn!(status = %r.status(), "token reissue rejected");
                RefreshOutcome::Failed
            }
            Err(e) => {
                warn!(error = %e, "token reissue failed");
                RefreshOutcome::Failed
            }
        }
    }
}
