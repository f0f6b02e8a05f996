//! Typed wrappers over the backend endpoints.
//!
//! Each service borrows an [`ApiClient`] and inherits its failure policy:
//! calls yield `None` after the dispatcher has notified the user.

use crate::dispatch::ApiClient;
use crate::imaging::ImageAsset;
use crate::notify::Notification;
use crate::routes::{admin, user};
use crate::types::{LoginRequest, ResponseEnvelope, UserData};
use crate::upload::{UploadOutcome, UploadPipeline};
use serde_json::{Value, json};

/// Endpoints available to a signed-in user.
pub struct UserService<'a> {
    client: &'a ApiClient,
    uploads: UploadPipeline,
}

impl<'a> UserService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        let uploads = UploadPipeline::new(&client.config().upload);
        Self { client, uploads }
    }

    pub fn with_pipeline(client: &'a ApiClient, uploads: UploadPipeline) -> Self {
        Self { client, uploads }
    }

    /// Sign in. The server sets the session cookies on success.
    pub async fn login(&self, credentials: &LoginRequest) -> Option<ResponseEnvelope> {
        let envelope = self.client.post(user::LOGIN, credentials).await?;
        self.client.session().session_started();
        Some(envelope)
    }

    /// Sign out. Local session cookies are expired even if the call fails.
    pub async fn logout(&self) -> Option<ResponseEnvelope> {
        let envelope = self.client.post(user::LOGOUT, &json!({})).await;
        self.client.session().end_session();
        envelope
    }

    pub async fn profile(&self) -> Option<ResponseEnvelope<UserData>> {
        self.client.get(user::PROFILE).await
    }

    /// Set this week's count. Negative counts are rejected locally.
    pub async fn update_count(&self, count: i64) -> Option<ResponseEnvelope<UserData>> {
        if count < 0 {
            self.client
                .notifier()
                .notify(Notification::error("Please enter a valid number (0 or greater)"));
            return None;
        }
        let envelope = self
            .client
            .patch(user::UPDATE_COUNT, &json!({ "count": count }))
            .await?;
        self.client
            .notifier()
            .notify(Notification::success("Count updated successfully!"));
        Some(envelope)
    }

    /// Validate, compress, and upload an image for this week.
    pub async fn upload_image(&self, asset: ImageAsset) -> UploadOutcome {
        let outcome = self
            .uploads
            .upload(self.client, user::UPLOAD_IMAGE, asset)
            .await;
        if let UploadOutcome::Stored(_) = &outcome {
            self.client
                .notifier()
                .notify(Notification::success("Image uploaded successfully!"));
        }
        outcome
    }
}

/// Endpoints available to an administrator.
pub struct AdminService<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Option<ResponseEnvelope> {
        let envelope = self.client.post(admin::LOGIN, credentials).await?;
        self.client.session().session_started();
        Some(envelope)
    }

    pub async fn users(&self) -> Option<ResponseEnvelope<Vec<UserData>>> {
        self.client.get(admin::USERS).await
    }

    /// A single user's record, untyped so callers see every field.
    pub async fn user(&self, id: &str) -> Option<ResponseEnvelope<Value>> {
        self.client.get(&admin::user(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockCodec;
    use crate::imaging::Dimensions;
    use crate::notify::Level;
    use crate::test_helpers::{FakeTransport, client_harness, json_response, ok_envelope};
    use crate::types::{RequestBody, Verb};
    use std::sync::Arc;

    fn profile_json() -> Value {
        json!({
            "_id": "65f0c2",
            "name": "Ada",
            "role": "user",
            "weeklyLimitPic": ["w1.jpg"],
            "currentCount": 4,
            "growth": 12.5,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-05T00:00:00Z"
        })
    }

    fn credentials() -> LoginRequest {
        LoginRequest {
            email: "ada@example.com".into(),
            password: "hunter2".into(),
        }
    }

    #[tokio::test]
    async fn login_posts_credentials_without_notifying() {
        let h = client_harness(
            FakeTransport::new(|_| json_response(200, ok_envelope(json!({"role": "user"})))),
            "/login",
        );

        let envelope = UserService::new(&h.client).login(&credentials()).await.unwrap();

        assert!(envelope.success);
        assert!(h.notifier.notifications().is_empty());
        let sent = h.transport.sent();
        assert_eq!(sent[0].url, user::LOGIN);
        assert_eq!(
            sent[0].body,
            Some(RequestBody::Json(
                json!({"email": "ada@example.com", "password": "hunter2"})
            ))
        );
    }

    #[tokio::test]
    async fn profile_refresh_is_invisible_to_the_caller() {
        let transport = FakeTransport::new(|req| match &req.credential {
            Some(_) => json_response(200, ok_envelope(profile_json())),
            None => json_response(403, json!({"success": false, "message": "jwt expired"})),
        })
        .with_refresh(json_response(200, json!({"success": true, "data": "fresh"})));
        let h = client_harness(transport, "/profile");

        let envelope = UserService::new(&h.client).profile().await.unwrap();

        let profile = envelope.data.unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.weekly_limit_pic, Some(vec!["w1.jpg".to_string()]));
        assert_eq!(h.transport.refresh_count(), 1);
        assert!(h.notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn update_count_patches_and_confirms() {
        let h = client_harness(
            FakeTransport::new(|_| json_response(200, ok_envelope(profile_json()))),
            "/profile",
        );

        let envelope = UserService::new(&h.client).update_count(4).await.unwrap();

        assert_eq!(envelope.data.unwrap().current_count, Some(4));
        let sent = h.transport.sent();
        assert_eq!(sent[0].verb, Verb::Patch);
        assert_eq!(sent[0].body, Some(RequestBody::Json(json!({"count": 4}))));
        let notes = h.notifier.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Success);
    }

    #[tokio::test]
    async fn negative_count_is_rejected_locally() {
        let h = client_harness(
            FakeTransport::new(|_| json_response(200, ok_envelope(profile_json()))),
            "/profile",
        );

        assert!(UserService::new(&h.client).update_count(-1).await.is_none());
        assert!(h.transport.sent().is_empty());
        assert_eq!(
            h.notifier.errors(),
            vec!["Please enter a valid number (0 or greater)".to_string()]
        );
    }

    #[tokio::test]
    async fn logout_clears_session_even_when_the_call_fails() {
        let h = client_harness(FakeTransport::offline(), "/profile");

        assert!(UserService::new(&h.client).logout().await.is_none());
        assert_eq!(h.transport.clear_count(), 1);
    }

    #[tokio::test]
    async fn upload_image_goes_to_upload_route() {
        let h = client_harness(
            FakeTransport::new(|_| {
                json_response(200, ok_envelope(json!({"weeklyLimitPic": ["w1.jpg", "w2.jpg"]})))
            }),
            "/profile",
        );
        let codec = Arc::new(MockCodec::shrinking_to(
            Dimensions {
                width: 800,
                height: 600,
            },
            10,
        ));
        let pipeline = UploadPipeline::with_codec(&h.client.config().upload, codec);

        let outcome = UserService::with_pipeline(&h.client, pipeline)
            .upload_image(ImageAsset::new("w2.jpg", vec![1; 100], "image/jpeg"))
            .await;

        assert_eq!(outcome.reference(), Some("w2.jpg"));
        assert_eq!(h.transport.sent()[0].url, user::UPLOAD_IMAGE);
        assert_eq!(h.notifier.notifications()[0].level, Level::Success);
    }

    #[tokio::test]
    async fn admin_lists_users() {
        let h = client_harness(
            FakeTransport::new(|_| json_response(200, ok_envelope(json!([profile_json()])))),
            "/admin/users",
        );

        let users = AdminService::new(&h.client).users().await.unwrap().data.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "65f0c2");
        assert_eq!(h.transport.sent()[0].url, admin::USERS);
    }

    #[tokio::test]
    async fn admin_fetches_single_user_by_id() {
        let h = client_harness(
            FakeTransport::new(|_| json_response(200, ok_envelope(profile_json()))),
            "/admin/users",
        );

        let envelope = AdminService::new(&h.client).user("65f0c2").await.unwrap();

        assert_eq!(envelope.data.unwrap()["name"], "Ada");
        assert_eq!(h.transport.sent()[0].url, "/admin/m/getUser/65f0c2");
    }
}
