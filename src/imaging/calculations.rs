//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale factor that fits `original` inside `bounds` without upscaling.
///
/// `min(max_w / w, max_h / h, 1)`. A zero-sized original yields `1.0`.
pub fn calculate_scale(original: (u32, u32), bounds: (u32, u32)) -> f64 {
    let (w, h) = original;
    let (max_w, max_h) = bounds;
    if w == 0 || h == 0 {
        return 1.0;
    }

    let scale_w = max_w as f64 / w as f64;
    let scale_h = max_h as f64 / h as f64;
    scale_w.min(scale_h).min(1.0)
}

/// Calculate output dimensions that fit within `bounds`, preserving aspect ratio.
///
/// # Arguments
/// * `original` - Source image dimensions (width, height)
/// * `bounds` - Largest allowed (width, height)
///
/// # Returns
/// * `(width, height)` - Never larger than `bounds` on either axis, never
///   larger than `original`, and never zero.
///
/// # Examples
/// ```
/// # use courier::imaging::calculate_bounded_dimensions;
/// // 4000x3000 into 1920x1080 → height is the limiting axis
/// assert_eq!(calculate_bounded_dimensions((4000, 3000), (1920, 1080)), (1440, 1080));
///
/// // Already small enough → untouched
/// assert_eq!(calculate_bounded_dimensions((640, 480), (1920, 1080)), (640, 480));
/// ```
pub fn calculate_bounded_dimensions(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = original;
    let scale = calculate_scale(original, bounds);
    if scale >= 1.0 {
        return original;
    }

    // round() cannot push an axis past its bound: the exact product is
    // already <= the integer bound.
    let out_w = ((w as f64 * scale).round() as u32).clamp(1, bounds.0.max(1));
    let out_h = ((h as f64 * scale).round() as u32).clamp(1, bounds.1.max(1));
    (out_w, out_h)
}
