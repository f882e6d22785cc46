//! HTTP retrieval from the digital library and the document system.
//!
//! Everything here is blocking: a run handles one document per feed and the
//! rest of the pipeline is synchronous.

use crate::config::{FeedKind, PipelineConfig};
use crate::error::HarvestError;
use crate::pipeline::dedup::DraftLookup;
use crate::pipeline::extract::{clean_feed_text, extract_drafts};
use crate::record::DraftResolution;
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// The library rejects requests without a browser-like agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Source of the binary documents a thread is built from.
pub trait DocumentSource {
    /// Download a PDF.
    fn pdf(&self, url: &str) -> Result<Vec<u8>, HarvestError>;

    /// Download the Word rendition of `symbol`.
    fn summary_docx(&self, symbol: &str) -> Result<Vec<u8>, HarvestError>;
}

/// MARCXML search URL for `kind`, optionally narrowed by a catalogue query.
pub fn search_url(
    config: &PipelineConfig,
    kind: FeedKind,
    query: Option<&str>,
) -> Result<Url, HarvestError> {
    let collection = kind.collection();
    let size = config.feed_size.to_string();
    let mut params = vec![("cc", collection), ("ln", "en")];
    if let Some(q) = query {
        params.push(("p", q));
    }
    params.extend([("sf", "year"), ("rg", size.as_str()), ("c", collection), ("of", "xm")]);

    let base = format!("{}/search", config.library_url.trim_end_matches('/'));
    Url::parse_with_params(&base, &params)
        .map_err(|e| HarvestError::InvalidConfig(format!("bad library URL '{}': {}", base, e)))
}

/// Word-document download URL for `symbol`.
pub fn docx_url(config: &PipelineConfig, symbol: &str) -> Result<Url, HarvestError> {
    let base = format!(
        "{}/api/symbol/access",
        config.documents_url.trim_end_matches('/')
    );
    Url::parse_with_params(&base, &[("s", symbol), ("l", "en"), ("t", "docx")])
        .map_err(|e| HarvestError::InvalidConfig(format!("bad documents URL '{}': {}", base, e)))
}

/// Blocking client for the library and document system.
pub struct LibraryClient {
    client: Client,
    config: PipelineConfig,
}

impl LibraryClient {
    pub fn new(config: PipelineConfig) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| HarvestError::Internal(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Fetch the newest records of a feed as MARCXML text.
    pub fn fetch_feed(&self, kind: FeedKind) -> Result<String, HarvestError> {
        self.search(kind, None)
    }

    /// Fetch a PDF, checking its magic bytes.
    pub fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        info!("Downloading PDF from: {}", url);
        let bytes = self.get_bytes(url)?;
        if !bytes.starts_with(b"%PDF") {
            return Err(HarvestError::DownloadFailed {
                url: url.to_string(),
                reason: "response is not a PDF".into(),
            });
        }
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Fetch the Word rendition of a document.
    pub fn fetch_summary_docx(&self, symbol: &str) -> Result<Vec<u8>, HarvestError> {
        let url = docx_url(&self.config, symbol)?;
        self.get_bytes(url.as_str())
    }

    fn search(&self, kind: FeedKind, query: Option<&str>) -> Result<String, HarvestError> {
        let url = search_url(&self.config, kind, query)?;
        debug!("GET {}", url);
        let response = self.get(url.as_str())?;
        let text = response.text().map_err(|e| HarvestError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(clean_feed_text(&text))
    }

    fn get(&self, url: &str) -> Result<Response, HarvestError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                HarvestError::DownloadTimeout {
                    url: url.to_string(),
                    secs: self.config.download_timeout_secs,
                }
            } else {
                HarvestError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(HarvestError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(response)
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        let bytes = self
            .get(url)?
            .bytes()
            .map_err(|e| HarvestError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes.to_vec())
    }
}

impl DocumentSource for LibraryClient {
    fn pdf(&self, url: &str) -> Result<Vec<u8>, HarvestError> {
        self.fetch_pdf(url)
    }

    fn summary_docx(&self, symbol: &str) -> Result<Vec<u8>, HarvestError> {
        self.fetch_summary_docx(symbol)
    }
}

impl DraftLookup for LibraryClient {
    fn lookup(&self, symbol: &str) -> Result<Option<DraftResolution>, HarvestError> {
        let query = format!("documentsymbol:{}", symbol);
        let xml = self.search(FeedKind::Drafts, Some(&query))?;
        let mut drafts = extract_drafts(&xml, &self.config)?;
        match drafts.len() {
            0 | 1 => Ok(drafts.pop()),
            found => Err(HarvestError::AmbiguousDraft {
                symbol: symbol.to_string(),
                found,
            }),
        }
    }
}
