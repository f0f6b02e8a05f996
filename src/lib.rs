//! # Courier
//!
//! The network client behind the weekly-count app: one dispatcher for every
//! backend call, a session interceptor that silently refreshes expired access
//! tokens, a single error normalizer, and an image upload pipeline that checks
//! and shrinks files before they leave the machine.
//!
//! # Request Flow
//!
//! ```text
//! caller ─▶ ApiClient ─▶ SessionInterceptor ─▶ Transport ─▶ backend
//!              │               │  403 → refresh once → replay
//!              │               │  401 / replayed 403 → teardown + redirect
//!              ▼               ▼
//!          normalize ─────▶ Notifier (one message per failed call)
//! ```
//!
//! Callers receive `Option<ResponseEnvelope<T>>`: the envelope exactly as the
//! server sent it, or `None` after the user has been told what went wrong.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dispatch`] | `ApiClient`: request construction, envelope decoding, notification policy |
//! | [`session`] | 401/403 state machine, single-flight refresh, teardown and redirect |
//! | [`transport`] | `Transport` trait and the reqwest implementation with its cookie jar |
//! | [`normalize`] | Failure shape → one human-readable message |
//! | [`error`] | `ApiError` and the failure taxonomy |
//! | [`upload`] | Validate → compress → multipart → send |
//! | [`imaging`] | Pure-Rust validation, dimension math, and re-encoding |
//! | [`services`] / [`routes`] | Typed user and admin endpoints |
//! | [`notify`] / [`navigate`] | Injected UI capabilities: toasts and redirects |
//! | [`config`] | `courier.toml` loading, layering, validation |
//! | [`types`] | Envelope, descriptors, credentials, backend records |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Client Context
//!
//! There is no global HTTP instance. An [`dispatch::ApiClient`] is built once
//! from a [`config::ClientConfig`] and passed by reference. Its transport,
//! notifier, and navigator are trait objects, so tests run the full request
//! flow against a scripted fake without a server.
//!
//! ## Opaque Cookie Session
//!
//! The session is two HTTP-only cookies the server sets and the transport's
//! jar replays. The client never reads them. The only credential it handles
//! is the short-lived access token a refresh returns, which it attaches to
//! exactly one replay.
//!
//! ## Compression Is Best Effort
//!
//! A file that passes validation is always uploadable. If decoding, resizing,
//! or encoding fails, or the result is not smaller, the original bytes are
//! sent instead.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod imaging;
pub mod navigate;
pub mod normalize;
pub mod notify;
pub mod output;
pub mod routes;
pub mod services;
pub mod session;
pub mod transport;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
