//! HTTP transport.
//!
//! [`Transport`] is the seam between the client logic and the network: the
//! session interceptor and dispatcher only ever see status codes and bodies.
//! [`ReqwestTransport`] is the production implementation; tests substitute a
//! scripted fake.
//!
//! ## Session cookies
//!
//! The session lives in the transport's cookie jar as two opaque cookies,
//! `accessToken` and `refreshToken`. The server sets them on login and
//! refresh; the jar replays them on every request. The client never reads
//! them. [`Transport::clear_session`] expires both.

use crate::config::ApiConfig;
use crate::error::TransportError;
use crate::normalize::message_field;
use crate::types::{MultipartForm, RequestBody, RequestDescriptor, Verb};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, header, multipart};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Status and body of a completed exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Non-empty `message` field of a JSON body.
    pub fn message(&self) -> Option<String> {
        self.json().as_ref().and_then(message_field)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Any status is a successful exchange; only failures
    /// to complete the exchange are errors.
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError>;

    /// Call the refresh endpoint with the session cookies and no credentials.
    async fn refresh(&self) -> Result<RawResponse, TransportError>;

    /// Expire both session cookies.
    fn clear_session(&self);
}

/// reqwest-backed transport with a shared cookie jar.
pub struct ReqwestTransport {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
    refresh_url: Url,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            refresh_url: parse_url(&config.refresh_url)?,
        })
    }

    /// Resolve a request path against the base address.
    ///
    /// The path is appended, not joined: a base of `http://host/api` and a
    /// path of `/user/x` give `http://host/api/user/x`.
    pub fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        let path = path.trim();
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        parse_url(&joined)
    }

    /// `Cookie` header the jar would send to the base address.
    pub fn cookie_header(&self) -> Option<String> {
        let base = self.resolve("/").ok()?;
        self.jar
            .cookies(&base)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

fn parse_url(raw: &str) -> Result<Url, TransportError> {
    Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

fn method(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Patch => Method::PATCH,
        Verb::Delete => Method::DELETE,
    }
}

fn multipart_form(form: &MultipartForm) -> Result<multipart::Form, TransportError> {
    let mut out = multipart::Form::new();
    for (name, value) in &form.text {
        out = out.text(name.clone(), value.clone());
    }
    for field in &form.files {
        let part = multipart::Part::bytes(field.bytes.clone())
            .file_name(field.file_name.clone())
            .mime_str(&field.content_type)?;
        out = out.part(field.field_name.clone(), part);
    }
    Ok(out)
}

async fn read_response(response: reqwest::Response) -> Result<RawResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response.bytes().await?;
    Ok(RawResponse::new(status, body.to_vec()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let url = self.resolve(&request.url)?;
        tracing::debug!(verb = %request.verb, %url, replay = request.credential.is_some(), "sending request");

        let mut builder = self.client.request(method(request.verb), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(credential) = &request.credential {
            builder = builder.header(header::AUTHORIZATION, credential.bearer());
        }
        builder = match &request.body {
            // .json() sets Content-Type: application/json
            Some(RequestBody::Json(value)) => builder.json(value),
            // .multipart() sets the boundary content type
            Some(RequestBody::Multipart(form)) => builder.multipart(multipart_form(form)?),
            None => builder,
        };

        let response = builder.send().await?;
        read_response(response).await
    }

    async fn refresh(&self) -> Result<RawResponse, TransportError> {
        tracing::debug!(url = %self.refresh_url, "refreshing access token");
        let response = self
            .client
            .post(self.refresh_url.clone())
            .json(&serde_json::json!({}))
            .send()
            .await?;
        read_response(response).await
    }

    fn clear_session(&self) {
        let mut origins = vec![self.refresh_url.clone()];
        if let Ok(base) = self.resolve("/") {
            origins.push(base);
        }
        for url in &origins {
            for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE] {
                let expired = format!("{name}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
                self.jar.add_cookie_str(&expired, url);
            }
        }
    }
}
