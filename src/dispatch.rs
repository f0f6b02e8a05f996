//! Request dispatcher.
//!
//! [`ApiClient`] is the single entry point for backend calls. It builds a
//! [`RequestDescriptor`], runs it through the [`SessionInterceptor`], decodes
//! the `{success, message, data}` envelope, and turns every failure into at
//! most one user notification. The convenience methods never return an
//! error: a failed call yields `None`.
//!
//! [`ApiClient::try_send`] is the non-notifying variant for callers that need
//! the typed failure.

use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::navigate::Navigator;
use crate::normalize::{FailureShape, normalize};
use crate::notify::{Notification, Notifier};
use crate::session::SessionInterceptor;
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use crate::types::{
    MultipartForm, RequestBody, RequestDescriptor, RequestOptions, ResponseEnvelope, Verb,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub struct ApiClient {
    config: ClientConfig,
    session: SessionInterceptor,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = SessionInterceptor::new(
            transport,
            Arc::clone(&notifier),
            navigator,
            config.session.clone(),
        );
        Self {
            config,
            session,
            notifier,
        }
    }

    /// Client over a real HTTP transport.
    pub fn connect(
        config: ClientConfig,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new(&config.api)?);
        Ok(Self::new(config, transport, notifier, navigator))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionInterceptor {
        &self.session
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Send a descriptor and decode the envelope. Never notifies.
    pub async fn try_send<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<ResponseEnvelope<T>, ApiError> {
        if descriptor.url.trim().is_empty() {
            return Err(ApiError::InvalidRequest("request path is empty".into()));
        }
        let response = self.session.execute(descriptor).await?;
        decode_envelope(response)
    }

    /// Send a descriptor; on failure notify (unless silenced) and yield `None`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Option<ResponseEnvelope<T>> {
        match self.try_send(descriptor).await {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                self.report(descriptor, &err);
                None
            }
        }
    }

    /// The generic entry point behind the verb shorthands.
    pub async fn request<T: DeserializeOwned>(
        &self,
        verb: Verb,
        url: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Option<ResponseEnvelope<T>> {
        let descriptor = RequestDescriptor::new(verb, url)
            .with_body(body)
            .with_options(options);
        self.send(&descriptor).await
    }

    /// [`request`](Self::request) without notification, keeping the typed error.
    pub async fn try_request<T: DeserializeOwned>(
        &self,
        verb: Verb,
        url: &str,
        body: Option<RequestBody>,
    ) -> Result<ResponseEnvelope<T>, ApiError> {
        let descriptor = RequestDescriptor::new(verb, url).with_body(body);
        self.try_send(&descriptor).await
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Option<ResponseEnvelope<T>> {
        self.request(Verb::Get, url, None, RequestOptions::default())
            .await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        options: RequestOptions,
    ) -> Option<ResponseEnvelope<T>> {
        let query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let descriptor = RequestDescriptor::new(Verb::Get, url)
            .with_query(query)
            .with_options(options);
        self.send(&descriptor).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Option<ResponseEnvelope<T>> {
        self.with_json(Verb::Post, url, body).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Option<ResponseEnvelope<T>> {
        self.with_json(Verb::Put, url, body).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Option<ResponseEnvelope<T>> {
        self.with_json(Verb::Patch, url, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> Option<ResponseEnvelope<T>> {
        self.request(Verb::Delete, url, None, RequestOptions::default())
            .await
    }

    /// POST a multipart form.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: &str,
        form: MultipartForm,
        options: RequestOptions,
    ) -> Option<ResponseEnvelope<T>> {
        self.request(Verb::Post, url, Some(RequestBody::Multipart(form)), options)
            .await
    }

    async fn with_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        verb: Verb,
        url: &str,
        body: &B,
    ) -> Option<ResponseEnvelope<T>> {
        match RequestBody::json(body) {
            Ok(body) => {
                self.request(verb, url, Some(body), RequestOptions::default())
                    .await
            }
            Err(e) => {
                let descriptor = RequestDescriptor::new(verb, url);
                self.report(&descriptor, &ApiError::InvalidRequest(e.to_string()));
                None
            }
        }
    }

    fn report(&self, descriptor: &RequestDescriptor, err: &ApiError) {
        tracing::warn!(
            verb = %descriptor.verb,
            url = %descriptor.url,
            kind = ?err.kind(),
            error = %err,
            "request failed"
        );
        if descriptor.options.notify_on_error && !err.already_surfaced() {
            self.notifier
                .notify(Notification::error(err.user_message()));
        }
    }
}

/// Decode a response that got past the session interceptor.
///
/// Non-2xx statuses and `success: false` envelopes are business failures with
/// a normalized message. `data` is handed back exactly as the server sent it.
pub fn decode_envelope<T: DeserializeOwned>(
    response: RawResponse,
) -> Result<ResponseEnvelope<T>, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Business {
            status: response.status,
            message: normalize(&FailureShape::from_response(response.json())),
        });
    }

    let body: Value = serde_json::from_slice(&response.body)
        .map_err(|e| ApiError::MalformedResponse(format!("body is not JSON: {e}")))?;
    match body.get("success").and_then(Value::as_bool) {
        Some(true) => {}
        Some(false) => {
            return Err(ApiError::Business {
                status: response.status,
                message: normalize(&FailureShape::from_payload(body)),
            });
        }
        None => {
            return Err(ApiError::MalformedResponse(
                "envelope has no boolean `success` field".into(),
            ));
        }
    }

    serde_json::from_value(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}
