//! Backend endpoint paths, relative to the configured base address.

/// Endpoints for regular users.
pub mod user {
    pub const LOGIN: &str = "/user/auth/login";
    pub const LOGOUT: &str = "/user/auth/logout";
    pub const PROFILE: &str = "/user/profile/getProfile";
    pub const UPDATE_COUNT: &str = "/user/profile/updateCount";
    pub const UPLOAD_IMAGE: &str = "/user/profile/uploadImage";
}

/// Endpoints for administrators.
pub mod admin {
    pub const LOGIN: &str = "/admin/auth/login";
    pub const USERS: &str = "/admin/m/getAll";

    /// A single user's record. The id is percent-encoded.
    pub fn user(id: &str) -> String {
        let id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        format!("/admin/m/getUser/{id}")
    }
}
