//! Configuration types for the harvest pipeline.
//!
//! Every knob lives in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The defaults reproduce the production
//! configuration: 300-character posts, two preview pages per document and a
//! 950 kB ceiling per image.

use crate::error::HarvestError;
use serde::{Deserialize, Serialize};

/// Configuration for one harvest run.
///
/// # Example
/// ```rust
/// use un_threads::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .max_length(300)
///     .feed_size(50)
///     .build()
///     .unwrap();
/// assert_eq!(config.reply_length(), 290);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Platform length ceiling for a single post, in characters. Default: 300.
    pub max_length: usize,

    /// Characters reserved for the fixed text of a report root post. Default: 80.
    pub report_base_length: usize,

    /// Characters reserved for the fixed text of a resolution root post. Default: 100.
    pub resolution_base_length: usize,

    /// Head-room subtracted from `max_length` when chunking reply prose. Default: 10.
    pub chunk_margin: usize,

    /// Abbreviations (without the period) that never end a sentence, on top
    /// of the built-in English list. Default: `paras`, `pp`, `p`.
    pub abbreviations: Vec<String>,

    /// File-name suffix identifying the English rendition. Default: `-EN.pdf`.
    pub language_suffix: String,

    /// Language sub-field value identifying the English rendition. Default: `English`.
    pub language_label: String,

    /// Base URL of the bibliographic catalogue.
    pub library_url: String,

    /// Base URL of the official document system (DOCX summaries).
    pub documents_url: String,

    /// Records requested per feed page. Default: 20.
    pub feed_size: usize,

    /// HTTP timeout in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Preview-image rendering.
    pub render: RenderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_length: 300,
            report_base_length: 80,
            resolution_base_length: 100,
            chunk_margin: 10,
            abbreviations: vec!["paras".into(), "pp".into(), "p".into()],
            language_suffix: "-EN.pdf".into(),
            language_label: "English".into(),
            library_url: "https://digitallibrary.un.org".into(),
            documents_url: "https://documents.un.org".into(),
            feed_size: 20,
            download_timeout_secs: 60,
            render: RenderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Chunk budget for reply posts.
    pub fn reply_length(&self) -> usize {
        self.max_length.saturating_sub(self.chunk_margin)
    }

    /// Canonical landing page of a catalogue record.
    pub fn record_url(&self, id: &str) -> String {
        format!(
            "{}/record/{}?ln=en&v=pdf",
            self.library_url.trim_end_matches('/'),
            id
        )
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_length(mut self, n: usize) -> Self {
        self.config.max_length = n;
        self
    }

    pub fn report_base_length(mut self, n: usize) -> Self {
        self.config.report_base_length = n;
        self
    }

    pub fn resolution_base_length(mut self, n: usize) -> Self {
        self.config.resolution_base_length = n;
        self
    }

    pub fn chunk_margin(mut self, n: usize) -> Self {
        self.config.chunk_margin = n;
        self
    }

    pub fn abbreviation(mut self, abbrev: impl Into<String>) -> Self {
        self.config.abbreviations.push(abbrev.into());
        self
    }

    pub fn language_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.language_suffix = suffix.into();
        self
    }

    pub fn library_url(mut self, url: impl Into<String>) -> Self {
        self.config.library_url = url.into();
        self
    }

    pub fn documents_url(mut self, url: impl Into<String>) -> Self {
        self.config.documents_url = url.into();
        self
    }

    pub fn feed_size(mut self, n: usize) -> Self {
        self.config.feed_size = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn render(mut self, render: RenderConfig) -> Self {
        self.config.render = render;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, HarvestError> {
        let c = &self.config;
        if c.report_base_length + 3 >= c.max_length || c.resolution_base_length + 3 >= c.max_length
        {
            return Err(HarvestError::InvalidConfig(format!(
                "base lengths ({}, {}) leave no room for a title within {} characters",
                c.report_base_length, c.resolution_base_length, c.max_length
            )));
        }
        if c.reply_length() <= 7 {
            return Err(HarvestError::InvalidConfig(format!(
                "reply budget {} is too small to hold continuation markers",
                c.reply_length()
            )));
        }
        if c.render.scale.is_nan() || c.render.scale <= 0.0 {
            return Err(HarvestError::InvalidConfig(format!(
                "render scale must be positive, got {}",
                c.render.scale
            )));
        }
        if c.render.quality_floor == 0 || c.render.quality_floor > 100 {
            return Err(HarvestError::InvalidConfig(format!(
                "quality floor must be 1–100, got {}",
                c.render.quality_floor
            )));
        }
        Ok(self.config)
    }
}

/// Preview-image rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Page scale factor applied when rasterising. Default: 1.5.
    pub scale: f32,

    /// Zero-based page indices rendered as previews. Default: first two pages.
    pub pages: Vec<usize>,

    /// Maximum encoded size of one image in bytes. Default: 950 000.
    pub byte_budget: usize,

    /// Lowest JPEG quality the size loop may reach. Default: 10.
    pub quality_floor: u8,

    /// Quality reduction per re-encode. Default: 10.
    pub quality_step: u8,

    /// Upper bound on encode attempts per page. Default: 10.
    pub max_attempts: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1.5,
            pages: vec![0, 1],
            byte_budget: 950_000,
            quality_floor: 10,
            quality_step: 10,
            max_attempts: 10,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The two catalogue feeds the harvester follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedKind {
    /// Newly released reports.
    Reports,
    /// Voting records of newly adopted resolutions.
    Resolutions,
    /// Draft resolutions, looked up by symbol.
    Drafts,
}

impl FeedKind {
    /// Catalogue collection name.
    pub fn collection(self) -> &'static str {
        match self {
            FeedKind::Reports => "Reports",
            FeedKind::Resolutions => "Voting Data",
            FeedKind::Drafts => "Draft resolutions and decisions",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production() {
        let c = PipelineConfig::default();
        assert_eq!(c.max_length, 300);
        assert_eq!(c.reply_length(), 290);
        assert_eq!(c.render.byte_budget, 950_000);
        assert_eq!(c.render.pages, vec![0, 1]);
    }

    #[test]
    fn record_url_trims_trailing_slash() {
        let c = PipelineConfig::builder()
            .library_url("https://example.org/")
            .build()
            .unwrap();
        assert_eq!(
            c.record_url("4093287"),
            "https://example.org/record/4093287?ln=en&v=pdf"
        );
    }

    #[test]
    fn build_rejects_oversized_base_length() {
        let err = PipelineConfig::builder()
            .max_length(90)
            .build()
            .unwrap_err();
        assert!(matches!(err, HarvestError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_zero_quality_floor() {
        let render = RenderConfig {
            quality_floor: 0,
            ..RenderConfig::default()
        };
        assert!(PipelineConfig::builder().render(render).build().is_err());
    }

    #[test]
    fn feed_collections() {
        assert_eq!(FeedKind::Resolutions.collection(), "Voting Data");
        assert_eq!(FeedKind::Reports.collection(), "Reports");
    }
}
