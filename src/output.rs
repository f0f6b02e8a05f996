//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Profile
//!
//! ```text
//! Ada (user)
//!     Id: 65f0c2
//!     Count: 4
//!     Growth: +12.5%
//!     Images: 2
//!         001 w1.jpg
//!         002 w2.jpg
//! ```
//!
//! ## Users
//!
//! ```text
//! 001 Ada (user)
//!     Id: 65f0c2
//! 002 Grace (admin)
//!     Id: 77aa01
//!
//! 2 users
//! ```
//!
//! ## Compression
//!
//! ```text
//! photo.jpg (image/jpeg)
//!     Size: 3.2 MB → 412.0 KB
//!     Dimensions: 1920x1080
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::imaging::{CompressionOutcome, EncodedAsset, FallbackReason, Validation};
use crate::types::{ResponseEnvelope, UserData};
use crate::upload::UploadOutcome;
use serde_json::Value;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count, binary units.
pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn user_header(user: &UserData) -> String {
    format!("{} ({})", user.name, user.role)
}

// ============================================================================
// Users
// ============================================================================

pub fn format_profile(user: &UserData) -> Vec<String> {
    let mut lines = vec![user_header(user)];
    lines.push(format!("{}Id: {}", indent(1), user.id));
    if let Some(count) = user.current_count {
        lines.push(format!("{}Count: {}", indent(1), count));
    }
    if let Some(growth) = user.growth {
        lines.push(format!("{}Growth: {:+.1}%", indent(1), growth));
    }
    if let Some(linked) = &user.linked_acc {
        lines.push(format!("{}Linked: {}", indent(1), linked));
    }
    if let Some(images) = &user.weekly_limit_pic {
        lines.push(format!("{}Images: {}", indent(1), images.len()));
        for (i, image) in images.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(2), format_index(i + 1), image));
        }
    }
    lines
}

pub fn format_users(users: &[UserData]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, user) in users.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), user_header(user)));
        lines.push(format!("{}Id: {}", indent(1), user.id));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    let noun = if users.len() == 1 { "user" } else { "users" };
    lines.push(format!("{} {}", users.len(), noun));
    lines
}

// ============================================================================
// Raw envelopes
// ============================================================================

/// Message line followed by pretty-printed data, if any.
pub fn format_envelope(envelope: &ResponseEnvelope<Value>) -> Vec<String> {
    let mut lines = Vec::new();
    if !envelope.message.is_empty() {
        lines.push(envelope.message.clone());
    }
    if let Some(data) = &envelope.data {
        let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        lines.extend(pretty.lines().map(str::to_string));
    }
    lines
}

// ============================================================================
// Images
// ============================================================================

pub fn format_validation(file_name: &str, validation: &Validation) -> Vec<String> {
    match &validation.error {
        None => vec![format!("{}: ok", file_name)],
        Some(error) => vec![format!("{}: rejected", file_name), format!("{}{}", indent(1), error)],
    }
}

pub fn format_compression(asset: &EncodedAsset) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", asset.file_name, asset.content_type)];
    match &asset.outcome {
        CompressionOutcome::Compressed { original_len } => lines.push(format!(
            "{}Size: {} → {}",
            indent(1),
            format_bytes(*original_len),
            format_bytes(asset.bytes.len())
        )),
        CompressionOutcome::Kept(reason) => {
            lines.push(format!("{}Size: {} (original)", indent(1), format_bytes(asset.bytes.len())));
            let why = match reason {
                FallbackReason::Passthrough => "format is uploaded as-is".to_string(),
                FallbackReason::NotSmaller { encoded_len } => {
                    format!("re-encoded size {} was not smaller", format_bytes(*encoded_len))
                }
                FallbackReason::Failed(error) => format!("compression failed: {}", error),
            };
            lines.push(format!("{}Kept: {}", indent(1), why));
        }
    }
    if let Some(dims) = asset.dimensions {
        lines.push(format!("{}Dimensions: {}x{}", indent(1), dims.width, dims.height));
    }
    lines
}

pub fn format_upload(outcome: &UploadOutcome) -> Vec<String> {
    match outcome {
        UploadOutcome::Stored(resource) => match &resource.reference {
            Some(reference) => vec![format!("Stored: {}", reference)],
            None => vec!["Stored (no image reference returned)".to_string()],
        },
        UploadOutcome::Rejected(error) => vec![format!("Rejected: {}", error)],
        UploadOutcome::Failed => vec!["Upload failed".to_string()],
    }
}

// ============================================================================
// Printers
// ============================================================================

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_profile(user: &UserData) {
    print_lines(&format_profile(user));
}

pub fn print_users(users: &[UserData]) {
    print_lines(&format_users(users));
}

pub fn print_envelope(envelope: &ResponseEnvelope<Value>) {
    print_lines(&format_envelope(envelope));
}

pub fn print_validation(file_name: &str, validation: &Validation) {
    print_lines(&format_validation(file_name, validation));
}

pub fn print_compression(asset: &EncodedAsset) {
    print_lines(&format_compression(asset));
}

pub fn print_upload(outcome: &UploadOutcome) {
    print_lines(&format_upload(outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::ValidationError;
    use crate::upload::UploadedResource;
    use serde_json::json;

    fn user(name: &str, role: &str, id: &str) -> UserData {
        serde_json::from_value(json!({"_id": id, "name": name, "role": role})).unwrap()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    // =========================================================================
    // Users
    // =========================================================================

    #[test]
    fn profile_lists_images_with_indices() {
        let mut ada = user("Ada", "user", "65f0c2");
        ada.current_count = Some(4);
        ada.growth = Some(12.5);
        ada.weekly_limit_pic = Some(vec!["w1.jpg".into(), "w2.jpg".into()]);

        assert_eq!(
            format_profile(&ada),
            vec![
                "Ada (user)",
                "    Id: 65f0c2",
                "    Count: 4",
                "    Growth: +12.5%",
                "    Images: 2",
                "        001 w1.jpg",
                "        002 w2.jpg",
            ]
        );
    }

    #[test]
    fn profile_omits_missing_fields() {
        let lines = format_profile(&user("Ada", "user", "1"));
        assert_eq!(lines, vec!["Ada (user)", "    Id: 1"]);
    }

    #[test]
    fn users_are_numbered_and_counted() {
        let lines = format_users(&[user("Ada", "user", "1"), user("Grace", "admin", "2")]);
        assert_eq!(
            lines,
            vec![
                "001 Ada (user)",
                "    Id: 1",
                "002 Grace (admin)",
                "    Id: 2",
                "",
                "2 users",
            ]
        );
    }

    #[test]
    fn empty_user_list() {
        assert_eq!(format_users(&[]), vec!["0 users"]);
    }

    // =========================================================================
    // Envelopes
    // =========================================================================

    #[test]
    fn envelope_prints_message_then_data() {
        let envelope = ResponseEnvelope {
            success: true,
            message: "Fetched".into(),
            data: Some(json!({"a": 1})),
        };
        assert_eq!(format_envelope(&envelope), vec!["Fetched", "{", "  \"a\": 1", "}"]);
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn validation_shows_reason_on_rejection() {
        let rejected = Validation {
            valid: false,
            error: Some("Image file is empty".into()),
        };
        assert_eq!(
            format_validation("a.png", &rejected),
            vec!["a.png: rejected", "    Image file is empty"]
        );
    }

    #[test]
    fn compression_reports_size_change() {
        let asset = EncodedAsset {
            file_name: "photo.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0; 2048],
            dimensions: Some(Dimensions {
                width: 1920,
                height: 1080,
            }),
            outcome: CompressionOutcome::Compressed {
                original_len: 3 * 1024 * 1024,
            },
        };
        assert_eq!(
            format_compression(&asset),
            vec![
                "photo.jpg (image/jpeg)",
                "    Size: 3.0 MB → 2.0 KB",
                "    Dimensions: 1920x1080",
            ]
        );
    }

    #[test]
    fn compression_explains_kept_original() {
        let asset = EncodedAsset {
            file_name: "anim.gif".into(),
            content_type: "image/gif".into(),
            bytes: vec![0; 100],
            dimensions: None,
            outcome: CompressionOutcome::Kept(FallbackReason::Passthrough),
        };
        assert_eq!(
            format_compression(&asset),
            vec![
                "anim.gif (image/gif)",
                "    Size: 100 B (original)",
                "    Kept: format is uploaded as-is",
            ]
        );
    }

    #[test]
    fn upload_outcomes() {
        let stored = UploadOutcome::Stored(UploadedResource {
            reference: Some("w2.jpg".into()),
            resource: json!({}),
            message: "ok".into(),
        });
        assert_eq!(format_upload(&stored), vec!["Stored: w2.jpg"]);
        assert_eq!(
            format_upload(&UploadOutcome::Rejected(ValidationError::Empty)),
            vec!["Rejected: Image file is empty"]
        );
        assert_eq!(format_upload(&UploadOutcome::Failed), vec!["Upload failed"]);
    }
}
