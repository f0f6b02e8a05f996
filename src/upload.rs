//! Image upload pipeline: validate, compress, encode, send.
//!
//! ```text
//! ImageAsset ─validate─▶ ValidatedAsset ─compress─▶ EncodedAsset ─encode─▶ MultipartField ─▶ ApiClient
//! ```
//!
//! Validation failures stop the pipeline before any network traffic.
//! Compression runs on the blocking pool and never fails the upload: if it
//! cannot produce a smaller file the original bytes are sent.

use crate::config::UploadConfig;
use crate::dispatch::ApiClient;
use crate::imaging::{
    CompressParams, EncodedAsset, FallbackReason, ImageAsset, ImageCodec, RustCodec,
    ValidatedAsset, ValidationError, compress, validate,
};
use crate::notify::Notification;
use crate::types::{MultipartField, MultipartForm, RequestOptions, ResponseEnvelope};
use serde_json::Value;
use std::sync::Arc;

/// Wrap encoded bytes as the named multipart field.
pub fn encode(asset: EncodedAsset, field_name: &str) -> MultipartField {
    MultipartField {
        field_name: field_name.to_string(),
        file_name: asset.file_name,
        content_type: asset.content_type,
        bytes: asset.bytes,
    }
}

/// The stored resource as the server described it.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedResource {
    /// Canonical reference to the stored image, when the response names one.
    pub reference: Option<String>,
    /// The full `data` payload, as returned.
    pub resource: Value,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Stored(UploadedResource),
    /// Rejected locally; nothing was sent.
    Rejected(ValidationError),
    /// The request failed. The dispatcher already notified the user.
    Failed,
}

impl UploadOutcome {
    /// Reference of the stored image, or `None` for any other outcome.
    pub fn reference(&self) -> Option<&str> {
        match self {
            UploadOutcome::Stored(resource) => resource.reference.as_deref(),
            _ => None,
        }
    }
}

/// Pull the image reference out of the response payload.
///
/// The field holds either a single reference or a list of them, in which case
/// the most recent (last) one is the new upload.
pub fn extract_reference(data: &Value, reference_field: &str) -> Option<String> {
    match data.get(reference_field)? {
        Value::String(reference) => Some(reference.clone()),
        Value::Array(items) => items.last().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

pub struct UploadPipeline {
    codec: Arc<dyn ImageCodec>,
    params: CompressParams,
    field_name: String,
    reference_field: String,
}

impl UploadPipeline {
    pub fn new(config: &UploadConfig) -> Self {
        Self::with_codec(config, Arc::new(RustCodec::new()))
    }

    pub fn with_codec(config: &UploadConfig, codec: Arc<dyn ImageCodec>) -> Self {
        Self {
            codec,
            params: CompressParams::from_upload_config(config),
            field_name: config.field_name.clone(),
            reference_field: config.reference_field.clone(),
        }
    }

    /// Validate and compress, producing the field that will be sent.
    pub async fn prepare(&self, asset: ImageAsset) -> Result<MultipartField, ValidationError> {
        let validated = validate(asset)?;
        let encoded = self.compress_off_thread(validated).await;
        Ok(encode(encoded, &self.field_name))
    }

    async fn compress_off_thread(&self, validated: ValidatedAsset) -> EncodedAsset {
        let codec = Arc::clone(&self.codec);
        let params = self.params;
        let asset = Arc::new(validated);
        let task_asset = Arc::clone(&asset);

        match tokio::task::spawn_blocking(move || compress(codec.as_ref(), &task_asset, &params))
            .await
        {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(file = asset.file_name(), error = %e, "compression task aborted; uploading original");
                EncodedAsset::original(&asset, FallbackReason::Failed(e.to_string()))
            }
        }
    }

    /// Run the whole pipeline against `url`.
    ///
    /// A local rejection is shown to the user here, since no request is made
    /// for the dispatcher to report.
    pub async fn upload(&self, client: &ApiClient, url: &str, asset: ImageAsset) -> UploadOutcome {
        let field = match self.prepare(asset).await {
            Ok(field) => field,
            Err(e) => {
                tracing::info!(error = %e, "upload rejected before sending");
                client.notifier().notify(Notification::error(e.to_string()));
                return UploadOutcome::Rejected(e);
            }
        };
        tracing::debug!(
            url,
            file = %field.file_name,
            bytes = field.bytes.len(),
            content_type = %field.content_type,
            "uploading image"
        );

        let form = MultipartForm::new().file(field);
        let envelope: Option<ResponseEnvelope> = client
            .post_multipart(url, form, RequestOptions::default())
            .await;

        match envelope {
            Some(envelope) => {
                let resource = envelope.data.unwrap_or(Value::Null);
                let reference = extract_reference(&resource, &self.reference_field);
                if reference.is_none() {
                    tracing::warn!(field = %self.reference_field, "upload response names no image reference");
                }
                UploadOutcome::Stored(UploadedResource {
                    reference,
                    resource,
                    message: envelope.message,
                })
            }
            None => UploadOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockCodec, RecordedOp};
    use crate::imaging::{CompressionOutcome, Dimensions, MAX_UPLOAD_BYTES};
    use crate::test_helpers::{
        FakeTransport, client_harness, gradient_jpeg, json_response, ok_envelope,
    };
    use crate::types::RequestBody;
    use serde_json::json;

    fn pipeline_with(codec: Arc<dyn ImageCodec>) -> UploadPipeline {
        UploadPipeline::with_codec(&UploadConfig::default(), codec)
    }

    #[test]
    fn encode_uses_configured_field_name() {
        let field = encode(
            EncodedAsset {
                file_name: "a.jpg".into(),
                content_type: "image/jpeg".into(),
                bytes: vec![1, 2, 3],
                dimensions: None,
                outcome: CompressionOutcome::Compressed { original_len: 10 },
            },
            "image",
        );
        assert_eq!(field.field_name, "image");
        assert_eq!(field.file_name, "a.jpg");
        assert_eq!(field.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn reference_is_last_list_element_or_plain_string() {
        let list = json!({"weeklyLimitPic": ["old.jpg", "new.jpg"]});
        assert_eq!(extract_reference(&list, "weeklyLimitPic").as_deref(), Some("new.jpg"));

        let single = json!({"avatar": "me.png"});
        assert_eq!(extract_reference(&single, "avatar").as_deref(), Some("me.png"));

        assert_eq!(extract_reference(&json!({"weeklyLimitPic": []}), "weeklyLimitPic"), None);
        assert_eq!(extract_reference(&Value::Null, "weeklyLimitPic"), None);
    }

    #[tokio::test]
    async fn oversized_file_never_reaches_the_network() {
        let h = client_harness(FakeTransport::new(|_| json_response(200, ok_envelope(json!({})))), "/");
        let codec = Arc::new(MockCodec::failing());
        let asset = ImageAsset {
            file_name: "huge.jpg".into(),
            bytes: vec![0; 16],
            declared_type: "image/jpeg".into(),
            declared_size: 8 * 1024 * 1024,
        };

        let outcome = pipeline_with(codec.clone())
            .upload(&h.client, "/user/profile/uploadImage", asset)
            .await;

        assert!(matches!(outcome, UploadOutcome::Rejected(ValidationError::TooLarge { .. })));
        assert!(h.transport.sent().is_empty());
        assert!(codec.get_operations().is_empty());
        assert_eq!(
            h.notifier.errors(),
            vec!["Image must be 5 MB or smaller (got 8.0 MB)".to_string()]
        );
    }

    #[tokio::test]
    async fn compressed_image_is_sent_and_server_error_yields_failed() {
        let h = client_harness(
            FakeTransport::new(|_| json_response(500, json!({"message": "Storage full"}))),
            "/profile",
        );
        let codec = Arc::new(MockCodec::shrinking_to(
            Dimensions {
                width: 4000,
                height: 3000,
            },
            1024,
        ));
        let asset = ImageAsset::new("shot.png", vec![5; 3 * 1024 * 1024], "image/png");

        let outcome = pipeline_with(codec.clone())
            .upload(&h.client, "/user/profile/uploadImage", asset)
            .await;

        assert_eq!(outcome, UploadOutcome::Failed);
        assert_eq!(outcome.reference(), None);
        assert_eq!(h.notifier.errors(), vec!["Storage full".to_string()]);
        assert!(codec.get_operations().contains(&RecordedOp::Transcode {
            width: 1440,
            height: 1080,
            quality: 80
        }));

        let sent = h.transport.sent();
        let Some(RequestBody::Multipart(form)) = &sent[0].body else {
            panic!("expected a multipart body");
        };
        assert_eq!(form.files[0].field_name, "image");
        assert_eq!(form.files[0].bytes.len(), 1024);
        assert_eq!(form.files[0].content_type, "image/png");
    }

    #[tokio::test]
    async fn stored_upload_returns_newest_reference() {
        let h = client_harness(
            FakeTransport::new(|_| {
                json_response(
                    200,
                    ok_envelope(json!({"_id": "u1", "weeklyLimitPic": ["a.jpg", "b.jpg"]})),
                )
            }),
            "/profile",
        );
        let asset = ImageAsset::new("b.jpg", gradient_jpeg(64, 48), "image/jpeg");

        let outcome = UploadPipeline::new(&UploadConfig::default())
            .upload(&h.client, "/user/profile/uploadImage", asset)
            .await;

        assert_eq!(outcome.reference(), Some("b.jpg"));
        assert!(h.notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn codec_failure_still_uploads_original_bytes() {
        let h = client_harness(
            FakeTransport::new(|_| json_response(200, ok_envelope(json!({"weeklyLimitPic": "x"})))),
            "/",
        );
        let original = vec![9; 2048];
        let asset = ImageAsset::new("x.webp", original.clone(), "image/webp");

        let outcome = pipeline_with(Arc::new(MockCodec::failing()))
            .upload(&h.client, "/user/profile/uploadImage", asset)
            .await;

        assert_eq!(outcome.reference(), Some("x"));
        let sent = h.transport.sent();
        let Some(RequestBody::Multipart(form)) = &sent[0].body else {
            panic!("expected a multipart body");
        };
        assert_eq!(form.files[0].bytes, original);
    }

    #[test]
    fn ceiling_constant_matches_policy() {
        assert_eq!(MAX_UPLOAD_BYTES, 5_242_880);
    }
}
