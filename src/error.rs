//! Error types for the un-threads library.
//!
//! Two error types reflect two failure modes:
//!
//! * [`HarvestError`] — the operation cannot proceed (unparseable feed,
//!   unreachable library, unwritable ledger, a platform refusing a post).
//!   Returned as `Err(HarvestError)` and classified by
//!   [`HarvestError::is_tolerated`] at the top of a run.
//!
//! * [`PageError`] — a single PDF page failed to rasterise or encode. Never
//!   propagated: the renderer degrades that page to "no image" and carries on
//!   with its siblings.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the un-threads library.
#[derive(Debug, Error)]
pub enum HarvestError {
    // ── Feed errors ───────────────────────────────────────────────────────
    /// The MARCXML document is not well-formed.
    #[error("Malformed MARCXML at byte {position}: {detail}")]
    Parse { position: usize, detail: String },

    /// A record lacks its control identifier (tag 001), the dedup key.
    #[error("Record #{index} has no control identifier (tag 001)")]
    MalformedRecord { index: usize },

    /// The draft-resolution search returned more than one match.
    #[error("Expected at most one draft resolution for '{symbol}', found {found}")]
    AmbiguousDraft { symbol: String, found: usize },

    /// A DOCX summary document could not be read.
    #[error("Unreadable DOCX summary: {0}")]
    Docx(String),

    // ── Network errors ────────────────────────────────────────────────────
    /// HTTP request failed or returned a non-success status.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// HTTP request exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Ledger errors ─────────────────────────────────────────────────────
    /// The ledger file could not be read or written.
    #[error("Ledger I/O failed for '{path}': {source}")]
    LedgerIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ledger file exists but is not the expected JSON shape.
    #[error("Ledger '{path}' is not valid JSON: {detail}")]
    LedgerFormat { path: PathBuf, detail: String },

    // ── Publishing errors ─────────────────────────────────────────────────
    /// The platform rejected the post because of rate limiting.
    #[error("Rate limit exceeded on {platform}")]
    RateLimited {
        platform: String,
        retry_after_secs: Option<u64>,
    },

    /// The platform refused the post (permissions, suspended account).
    #[error("Posting forbidden on {platform}: {detail}")]
    Forbidden { platform: String, detail: String },

    /// Any other publishing failure.
    #[error("Publishing to {platform} failed: {detail}")]
    PublishFailed { platform: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HarvestError {
    /// Rate-limit and permission errors are reported but do not fail a run.
    pub fn is_tolerated(&self) -> bool {
        matches!(
            self,
            HarvestError::RateLimited { .. } | HarvestError::Forbidden { .. }
        )
    }
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The requested page index does not exist.
    #[error("Page {page}: out of range (document has {total} pages)")]
    OutOfRange { page: usize, total: usize },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// JPEG encoding failed.
    #[error("Page {page}: encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerated_errors() {
        let e = HarvestError::RateLimited {
            platform: "x".into(),
            retry_after_secs: Some(900),
        };
        assert!(e.is_tolerated());
        let e = HarvestError::Forbidden {
            platform: "x".into(),
            detail: "duplicate content".into(),
        };
        assert!(e.is_tolerated());
        let e = HarvestError::PublishFailed {
            platform: "bluesky".into(),
            detail: "500".into(),
        };
        assert!(!e.is_tolerated());
    }

    #[test]
    fn malformed_record_display() {
        let e = HarvestError::MalformedRecord { index: 4 };
        assert!(e.to_string().contains("#4"), "got: {e}");
    }

    #[test]
    fn ambiguous_draft_display() {
        let e = HarvestError::AmbiguousDraft {
            symbol: "A/80/L.1".into(),
            found: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("A/80/L.1"));
        assert!(msg.contains("found 2"));
    }

    #[test]
    fn page_error_display() {
        let e = PageError::OutOfRange { page: 3, total: 1 };
        assert!(e.to_string().contains("Page 3"));
    }
}
