pub mod attendance;
pub mod faces;

use crate::error::{AppError, AppResult};

/// A present, non-empty descriptor whose components are all finite.
///
/// JSON numbers beyond the `f32` range deserialize to infinity, so the range
/// check has to happen here rather than in serde.
fn require_descriptor(descriptor: Option<Vec<f32>>, missing: &str) -> AppResult<Vec<f32>> {
    let descriptor = descriptor
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::BadRequest(missing.to_string()))?;

    if descriptor.iter().any(|v| !v.is_finite()) {
        return Err(AppError::BadRequest(
            "descriptor values must be finite numbers".into(),
        ));
    }
    Ok(descriptor)
}
