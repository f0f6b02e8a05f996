//! Session interceptor: silent token refresh and session teardown.
//!
//! Every request goes through [`SessionInterceptor::execute`]. The response
//! status drives a small state machine:
//!
//! | Status | Marker | Action |
//! |---|---|---|
//! | 2xx, other | any | pass the response through |
//! | 401 | any | teardown, [`ApiError::SessionExpired`] |
//! | 403 | [`RetryMarker::Fresh`] | refresh once, replay with the new credential |
//! | 403 | [`RetryMarker::Replayed`] | teardown, [`ApiError::SessionExpired`] |
//!
//! A failed refresh also ends in teardown. Teardown expires the session
//! cookies, notifies once, and schedules a redirect to the login surface for
//! the area the user is in.
//!
//! ## Single-flight refresh
//!
//! Concurrent requests that all see a 403 share one refresh call. The
//! coordinator counts completed refreshes in an epoch. A request snapshots the
//! epoch before it is sent; if the epoch has moved by the time it wants a
//! refresh, some other request already refreshed after it was sent, and it
//! reuses that outcome instead of calling the endpoint again.

use crate::config::SessionConfig;
use crate::error::{ApiError, ErrorKind};
use crate::navigate::{Navigator, login_surface_for};
use crate::normalize::{FailureShape, normalize};
use crate::notify::{Notification, Notifier};
use crate::transport::{RawResponse, Transport};
use crate::types::{AccessCredential, RequestDescriptor};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Shown when the server gives no reason for ending the session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Unauthorized. Please login again.";

/// Whether a request has already been replayed after a refresh.
///
/// A replayed request is never refreshed again, which bounds every call to
/// at most one refresh and one replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMarker {
    Fresh,
    Replayed,
}

/// Copy of `descriptor` carrying `credential`, marked as replayed.
pub fn replay(
    descriptor: &RequestDescriptor,
    credential: &AccessCredential,
) -> (RequestDescriptor, RetryMarker) {
    (
        descriptor.with_credential(credential.clone()),
        RetryMarker::Replayed,
    )
}

/// Auth failure a status signals, if any.
fn classify(status: u16) -> Option<ErrorKind> {
    match status {
        401 => Some(ErrorKind::SessionExpired),
        403 => Some(ErrorKind::TokenRefreshable),
        _ => None,
    }
}

/// Extract the access credential from a refresh response.
///
/// The token is the envelope's `data`, either as a bare string or as
/// `{"accessToken": "..."}`.
/// Every failure is [`ApiError::RefreshFailed`].
pub fn credential_from_refresh(response: &RawResponse) -> Result<AccessCredential, ApiError> {
    credential_token(response).map_err(ApiError::RefreshFailed)
}

fn credential_token(response: &RawResponse) -> Result<AccessCredential, String> {
    if !response.is_success() {
        return Err(format!("refresh endpoint returned {}", response.status));
    }
    let body: Value = serde_json::from_slice(&response.body)
        .map_err(|e| format!("refresh response is not JSON: {e}"))?;
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(normalize(&FailureShape::from_payload(body)));
    }
    let token = match body.get("data") {
        Some(Value::String(token)) => Some(token.as_str()),
        Some(data) => data.get("accessToken").and_then(Value::as_str),
        None => None,
    };
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => Ok(AccessCredential::new(token)),
        None => Err("refresh response carried no access token".to_string()),
    }
}

struct RefreshState {
    epoch: u64,
    last: Option<Result<AccessCredential, String>>,
}

/// Serializes refresh calls and shares each outcome with every request that
/// was in flight when it started.
pub struct RefreshCoordinator {
    epoch: AtomicU64,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU64::new(0),
            state: Mutex::new(RefreshState {
                epoch: 0,
                last: None,
            }),
        }
    }

    /// Number of completed refresh attempts. Snapshot it before sending.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Obtain a credential for a request sent at epoch `seen`.
    ///
    /// The lock is held across the refresh call, so waiters park until the
    /// in-flight refresh settles and then read its outcome.
    pub async fn refresh_after(
        &self,
        seen: u64,
        transport: &dyn Transport,
    ) -> Result<AccessCredential, ApiError> {
        let mut state = self.state.lock().await;
        if state.epoch > seen {
            if let Some(last) = &state.last {
                tracing::debug!(epoch = state.epoch, "reusing refresh outcome");
                return last.clone().map_err(ApiError::RefreshFailed);
            }
        }

        let outcome = match transport.refresh().await {
            Ok(response) => credential_token(&response),
            Err(e) => Err(e.to_string()),
        };
        state.epoch += 1;
        tracing::info!(epoch = state.epoch, refreshed = outcome.is_ok(), "access token refresh finished");
        state.last = Some(outcome.clone());
        self.epoch.store(state.epoch, Ordering::Release);
        outcome.map_err(ApiError::RefreshFailed)
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SessionInterceptor {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    coordinator: RefreshCoordinator,
    torn_down: AtomicBool,
}

impl SessionInterceptor {
    pub fn new(
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            notifier,
            navigator,
            config,
            coordinator: RefreshCoordinator::new(),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Send `descriptor`, refreshing and replaying it at most once.
    ///
    /// Returns the final response for every status except the ones that end
    /// the session.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, ApiError> {
        let mut attempt = (Cow::Borrowed(descriptor), RetryMarker::Fresh);
        loop {
            let seen = self.coordinator.epoch();
            let response = self.transport.send(&attempt.0).await?;

            match (classify(response.status), attempt.1) {
                (None, _) => return Ok(response),
                (Some(ErrorKind::TokenRefreshable), RetryMarker::Fresh) => {
                    tracing::debug!(url = %descriptor.url, "access token rejected; refreshing");
                    let credential = self.refreshed_credential(seen).await?;
                    let (replayed, marker) = replay(&attempt.0, &credential);
                    attempt = (Cow::Owned(replayed), marker);
                }
                (status, marker) => {
                    tracing::debug!(url = %descriptor.url, ?status, ?marker, "session rejected");
                    return Err(self.expire(response.message()));
                }
            }
        }
    }

    async fn refreshed_credential(&self, seen: u64) -> Result<AccessCredential, ApiError> {
        match self
            .coordinator
            .refresh_after(seen, self.transport.as_ref())
            .await
        {
            Ok(credential) => {
                self.session_started();
                Ok(credential)
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not refresh session");
                Err(self.expire(None))
            }
        }
    }

    /// Re-arm teardown after a successful login or refresh.
    pub fn session_started(&self) {
        self.torn_down.store(false, Ordering::Release);
    }

    /// Expire the session cookies without notifying or redirecting.
    pub fn end_session(&self) {
        self.transport.clear_session();
    }

    /// Whether teardown has run since the last login or refresh.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Tear the session down once and build the terminal error.
    fn expire(&self, server_message: Option<String>) -> ApiError {
        let message = server_message.unwrap_or_else(|| SESSION_EXPIRED_MESSAGE.to_string());
        if !self.torn_down.swap(true, Ordering::AcqRel) {
            tracing::info!(reason = %message, "session ended; clearing credentials");
            self.transport.clear_session();
            self.notifier.notify(Notification::error(message.clone()));
            self.schedule_redirect();
        }
        ApiError::SessionExpired { message }
    }

    fn schedule_redirect(&self) {
        let target = login_surface_for(&self.navigator.current_path(), &self.config).to_string();
        let delay = Duration::from_millis(self.config.redirect_delay_ms);
        if delay.is_zero() {
            self.navigator.go_to(&target);
            return;
        }
        let navigator = Arc::clone(&self.navigator);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.go_to(&target);
        });
    }
}
