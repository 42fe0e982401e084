//! Vision-capable AI collaborator port

/// AI client able to read a rasterized statement page
///
/// Implementations own transport, timeouts and retry/backoff policy. The engine
/// calls [`vision_complete`](VisionAssist::vision_complete) at most once per page
/// and treats every error or unparsable reply as a per-page warning.
pub trait VisionAssist: Send + Sync {
    /// Whether a provider is configured and usable (e.g. an API key is present)
    fn is_available(&self) -> bool;

    /// Send an image with a prompt and return the raw text reply
    ///
    /// # Arguments
    /// * `image` - Encoded image bytes
    /// * `mime_type` - MIME type of `image` (e.g. "image/png")
    /// * `prompt` - Extraction instructions
    fn vision_complete(&self, image: &[u8], mime_type: &str, prompt: &str) -> anyhow::Result<String>;
}
