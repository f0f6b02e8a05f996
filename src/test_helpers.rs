//! Shared test utilities.
//!
//! Provides synthetic images, a scripted [`Transport`] fake, and a one-call
//! client harness with recording notifier and navigator.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let transport = FakeTransport::new(|_| json_response(200, ok_envelope(json!({"n": 1}))));
//! let h = client_harness(transport, "/profile");
//!
//! let envelope = h.client.get::<Value>("/user/profile/getProfile").await;
//! assert!(envelope.is_some());
//! assert!(h.notifier.notifications().is_empty());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, RgbImage};
use serde_json::{Value, json};

use crate::config::{ClientConfig, SessionConfig};
use crate::dispatch::ApiClient;
use crate::error::TransportError;
use crate::navigate::RecordingNavigator;
use crate::notify::RecordingNotifier;
use crate::transport::{RawResponse, Transport};
use crate::types::RequestDescriptor;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// A smooth gradient encoded as PNG.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    gradient(width, height)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// A smooth gradient encoded as JPEG at the encoder's default quality.
pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

// =========================================================================
// Responses
// =========================================================================

pub fn json_response(status: u16, body: Value) -> RawResponse {
    RawResponse::new(status, body.to_string())
}

pub fn ok_envelope(data: Value) -> Value {
    json!({"success": true, "message": "ok", "data": data})
}

// =========================================================================
// Scripted transport
// =========================================================================

type Handler = Box<dyn Fn(&RequestDescriptor) -> RawResponse + Send + Sync>;

/// A [`Transport`] answering every request from a closure.
///
/// Records what was sent, how often the refresh endpoint was hit, and how
/// often the session was cleared.
pub struct FakeTransport {
    handler: Handler,
    offline: bool,
    refresh_response: Option<RawResponse>,
    refresh_yields: usize,
    sent: Mutex<Vec<RequestDescriptor>>,
    refreshes: AtomicUsize,
    clears: AtomicUsize,
}

impl FakeTransport {
    pub fn new(handler: impl Fn(&RequestDescriptor) -> RawResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            offline: false,
            refresh_response: None,
            refresh_yields: 0,
            sent: Mutex::new(Vec::new()),
            refreshes: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        }
    }

    /// Every request fails before a status arrives.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::new(|_| RawResponse::new(599, Vec::new()))
        }
    }

    /// Response of the refresh endpoint. Without one, refresh is unreachable.
    pub fn with_refresh(mut self, response: RawResponse) -> Self {
        self.refresh_response = Some(response);
        self
    }

    /// Yield to the scheduler this many times inside each refresh so that
    /// concurrent requests interleave with it.
    pub fn with_refresh_yields(mut self, yields: usize) -> Self {
        self.refresh_yields = yields;
        self
    }

    pub fn sent(&self) -> Vec<RequestDescriptor> {
        self.sent.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        if self.offline {
            return Err(TransportError::Unreachable("connection refused".into()));
        }
        Ok((self.handler)(request))
    }

    async fn refresh(&self) -> Result<RawResponse, TransportError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        for _ in 0..self.refresh_yields {
            tokio::task::yield_now().await;
        }
        self.refresh_response
            .clone()
            .ok_or_else(|| TransportError::Unreachable("refresh endpoint unreachable".into()))
    }

    fn clear_session(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

// =========================================================================
// Client harness
// =========================================================================

pub struct ClientHarness {
    pub client: ApiClient,
    pub transport: Arc<FakeTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

/// An [`ApiClient`] over `transport`, with the user on `path` and redirects
/// applied immediately.
pub fn client_harness(transport: FakeTransport, path: &str) -> ClientHarness {
    let transport = Arc::new(transport);
    let notifier = Arc::new(RecordingNotifier::new());
    let navigator = Arc::new(RecordingNavigator::at(path));
    let config = ClientConfig {
        session: SessionConfig {
            redirect_delay_ms: 0,
            ..SessionConfig::default()
        },
        ..ClientConfig::default()
    };
    let client = ApiClient::new(
        config,
        transport.clone(),
        notifier.clone(),
        navigator.clone(),
    );
    ClientHarness {
        client,
        transport,
        notifier,
        navigator,
    }
}
