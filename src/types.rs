//! Shared types used across the dispatcher, the session interceptor, and the
//! upload pipeline.
//!
//! The wire types ([`ResponseEnvelope`], [`UserData`], [`LoginRequest`]) mirror
//! the backend's JSON contract and must stay field-for-field compatible with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The uniform `{success, message, data}` wrapper returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T = Value> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// HTTP verbs the dispatcher speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named binary segment of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartField {
    /// Form field name the server reads the file from.
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A multipart form body. Kept as plain data so a request can be replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub files: Vec<MultipartField>,
    pub text: Vec<(String, String)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, field: MultipartField) -> Self {
        self.files.push(field);
        self
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.push((name.into(), value.into()));
        self
    }
}

/// Request payload. JSON and multipart are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Serialize any value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Emit a user-facing notification when the call fails.
    pub notify_on_error: bool,
}

impl RequestOptions {
    /// Options for background calls such as polling.
    pub fn silent() -> Self {
        Self {
            notify_on_error: false,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            notify_on_error: true,
        }
    }
}

/// A short-lived access credential returned by the refresh endpoint.
///
/// Opaque: the client only forwards it as a bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential(String);

impl AccessCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessCredential(..)")
    }
}

/// Everything needed to send one request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub verb: Verb,
    /// Path relative to the configured base address.
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub options: RequestOptions,
    /// Bearer credential attached on replay after a refresh.
    pub credential: Option<AccessCredential>,
}

impl RequestDescriptor {
    pub fn new(verb: Verb, url: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            query: Vec::new(),
            body: None,
            options: RequestOptions::default(),
            credential: None,
        }
    }

    pub fn with_body(self, body: Option<RequestBody>) -> Self {
        Self { body, ..self }
    }

    pub fn with_query(self, query: Vec<(String, String)>) -> Self {
        Self { query, ..self }
    }

    pub fn with_options(self, options: RequestOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_credential(&self, credential: AccessCredential) -> Self {
        Self {
            credential: Some(credential),
            ..self.clone()
        }
    }
}

// =============================================================================
// Backend resources
// =============================================================================

/// Credentials posted to either login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Which area of the application a caller acts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    User,
    Admin,
}

/// A user record as returned by profile and admin endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_acc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_limit_pic: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// The administrator identity returned by the admin login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminData {
    pub name: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_without_data_deserializes() {
        let env: ResponseEnvelope = serde_json::from_value(json!({
            "success": false,
            "message": "nope"
        }))
        .unwrap();
        assert!(!env.success);
        assert_eq!(env.data, None);
    }

    #[test]
    fn envelope_serialization_omits_missing_data() {
        let env: ResponseEnvelope<Value> = ResponseEnvelope {
            success: true,
            message: "ok".into(),
            data: None,
        };
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"success": true, "message": "ok"})
        );
    }

    #[test]
    fn user_data_uses_backend_field_names() {
        let user: UserData = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Ada",
            "role": "user",
            "weeklyLimitPic": ["a.jpg"],
            "currentCount": 3,
            "createdAt": "2024-01-01",
            "updatedAt": "2024-01-02"
        }))
        .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.weekly_limit_pic.as_deref(), Some(&["a.jpg".to_string()][..]));
        assert_eq!(user.current_count, Some(3));
    }

    #[test]
    fn with_credential_leaves_original_untouched() {
        let original = RequestDescriptor::new(Verb::Get, "/user/profile/getProfile");
        let replay = original.with_credential(AccessCredential::new("t"));
        assert_eq!(original.credential, None);
        assert_eq!(replay.credential.map(|c| c.bearer()), Some("Bearer t".into()));
    }

    #[test]
    fn credential_debug_hides_token() {
        let cred = AccessCredential::new("secret");
        assert!(!format!("{cred:?}").contains("secret"));
    }
}
