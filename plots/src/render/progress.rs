/// Information about plot rendering progress
#[derive(Clone, Debug)]
pub struct ProgressInfo {
    /// What the renderer is currently doing (e.g. "series 3/12", "encode")
    pub stage: String,
    /// Progress percentage (0.0 to 100.0)
    pub percent: f32,
}

/// Callback function type for reporting plot rendering progress
///
/// The callback receives progress information and returns a result.
/// Errors from the callback are logged but do not stop rendering.
pub type ProgressCallback =
    Box<dyn FnMut(ProgressInfo) -> Result<(), Box<dyn std::error::Error + Send + Sync>>>;
