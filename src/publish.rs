//! Publishing: hand post units to a platform, one thread at a time.
//!
//! Platform SDKs live outside this crate. [`Publisher`] is the seam: an
//! implementation takes one unit plus the reply reference it must hang
//! under and returns a reference to the created post. [`OutboxPublisher`]
//! is the built-in sink; it writes every unit to a per-platform outbox
//! directory for an external poster to pick up.

use crate::error::HarvestError;
use crate::pipeline::compose::{FacetKind, PostUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// A target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Bluesky,
    X,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Bluesky, Platform::X];

    /// Ledger key and outbox directory name.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Bluesky => "bluesky",
            Platform::X => "x",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Reference to a created post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub id: String,
}

/// Where a reply hangs: the thread root and its immediate parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root: PostRef,
    pub parent: PostRef,
}

/// A sink for post units on one platform.
pub trait Publisher {
    fn platform(&self) -> Platform;

    /// Create one post. `reply` is `None` for the thread root.
    fn publish(&mut self, unit: &PostUnit, reply: Option<&ReplyRef>)
        -> Result<PostRef, HarvestError>;
}

/// A thread that stopped at its first failed post.
///
/// `posted` holds the posts created before the failure; they stay up.
#[derive(Debug, Error)]
#[error("thread stopped after {} post(s): {source}", .posted.len())]
pub struct ThreadError {
    pub posted: Vec<PostRef>,
    pub source: HarvestError,
}

/// Publish `units` as one thread: unit 0 is the root, unit *n* replies to
/// unit *n-1*.
///
/// Stops at the first failure.
pub fn publish_thread(
    publisher: &mut dyn Publisher,
    units: &[PostUnit],
) -> Result<Vec<PostRef>, ThreadError> {
    let mut refs: Vec<PostRef> = Vec::with_capacity(units.len());
    for unit in units {
        let reply = match (refs.first(), refs.last()) {
            (Some(root), Some(parent)) => Some(ReplyRef {
                root: root.clone(),
                parent: parent.clone(),
            }),
            _ => None,
        };
        let post = match publisher.publish(unit, reply.as_ref()) {
            Ok(post) => post,
            Err(source) => {
                return Err(ThreadError {
                    posted: refs,
                    source,
                })
            }
        };
        debug!("{}: posted {}", publisher.platform(), post.id);
        refs.push(post);
    }
    Ok(refs)
}

// ── Outbox ───────────────────────────────────────────────────────────────

const OUTBOX_FILE: &str = "posts.jsonl";

/// One line of the outbox journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: String,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
    pub unit: PostUnit,
    /// Image file names, relative to the outbox directory, in unit order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_files: Vec<String>,
}

/// Writes post units to `{root}/{platform}/`.
///
/// Each unit becomes one JSON line in `posts.jsonl`; its images are written
/// next to it as `{id}-{n}.jpg`.
pub struct OutboxPublisher {
    platform: Platform,
    dir: PathBuf,
    run: String,
    seq: usize,
    max_length: Option<usize>,
}

impl OutboxPublisher {
    pub fn new(root: impl AsRef<Path>, platform: Platform) -> Result<Self, HarvestError> {
        let dir = root.as_ref().join(platform.as_str());
        fs::create_dir_all(&dir).map_err(|e| outbox_err(platform, &dir, e))?;
        Ok(Self {
            platform,
            dir,
            run: chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string(),
            seq: 0,
            max_length: None,
        })
    }

    /// Reject units longer than `n` characters, as the platform would.
    pub fn with_max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every entry written so far, oldest first.
    pub fn entries(&self) -> Result<Vec<OutboxEntry>, HarvestError> {
        let path = self.dir.join(OUTBOX_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&path).map_err(|e| outbox_err(self.platform, &path, e))?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| outbox_err(self.platform, &path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| HarvestError::PublishFailed {
                platform: self.platform.to_string(),
                detail: format!("corrupt outbox line in {}: {}", path.display(), e),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// URLs of every link already written, for ledger reconciliation.
    pub fn links(&self) -> Result<Vec<String>, HarvestError> {
        Ok(self
            .entries()?
            .into_iter()
            .flat_map(|entry| entry.unit.facets)
            .filter_map(|facet| match facet.kind {
                FacetKind::Link { url } => Some(url),
                FacetKind::Tag { .. } => None,
            })
            .collect())
    }
}

impl Publisher for OutboxPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn publish(
        &mut self,
        unit: &PostUnit,
        reply: Option<&ReplyRef>,
    ) -> Result<PostRef, HarvestError> {
        if let Some(max) = self.max_length {
            if unit.char_len() > max {
                return Err(HarvestError::PublishFailed {
                    platform: self.platform.to_string(),
                    detail: format!("post is {} characters, limit is {}", unit.char_len(), max),
                });
            }
        }

        self.seq += 1;
        let id = format!("{}-{:03}", self.run, self.seq);

        let mut image_files = Vec::with_capacity(unit.images.len());
        for (n, image) in unit.images.iter().enumerate() {
            let name = format!("{}-{}.jpg", id, n + 1);
            let path = self.dir.join(&name);
            fs::write(&path, &image.bytes).map_err(|e| outbox_err(self.platform, &path, e))?;
            image_files.push(name);
        }

        let entry = OutboxEntry {
            id: id.clone(),
            platform: self.platform,
            reply: reply.cloned(),
            unit: unit.clone(),
            image_files,
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| HarvestError::Internal(format!("outbox serialisation: {}", e)))?;

        let path = self.dir.join(OUTBOX_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| outbox_err(self.platform, &path, e))?;
        writeln!(file, "{}", line).map_err(|e| outbox_err(self.platform, &path, e))?;

        info!("{}: queued {} in {}", self.platform, id, self.dir.display());
        Ok(PostRef { id })
    }
}

fn outbox_err(platform: Platform, path: &Path, e: std::io::Error) -> HarvestError {
    HarvestError::PublishFailed {
        platform: platform.to_string(),
        detail: format!("{}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compose::{ImageAttachment, TextBuilder};

    /// Records calls and fails on demand.
    struct Recorder {
        calls: Vec<(String, Option<ReplyRef>)>,
        fail_at: Option<usize>,
    }

    impl Publisher for Recorder {
        fn platform(&self) -> Platform {
            Platform::Bluesky
        }

        fn publish(
            &mut self,
            unit: &PostUnit,
            reply: Option<&ReplyRef>,
        ) -> Result<PostRef, HarvestError> {
            if self.fail_at == Some(self.calls.len()) {
                return Err(HarvestError::RateLimited {
                    platform: "bluesky".into(),
                    retry_after_secs: None,
                });
            }
            self.calls.push((unit.text.clone(), reply.cloned()));
            Ok(PostRef {
                id: format!("p{}", self.calls.len() - 1),
            })
        }
    }

    fn units(n: usize) -> Vec<PostUnit> {
        (0..n).map(|i| PostUnit::plain(format!("unit {i}"))).collect()
    }

    #[test]
    fn thread_chains_parent_and_root() {
        let mut rec = Recorder {
            calls: vec![],
            fail_at: None,
        };
        let refs = publish_thread(&mut rec, &units(3)).unwrap();
        assert_eq!(refs.len(), 3);
        assert!(rec.calls[0].1.is_none());
        let second = rec.calls[1].1.as_ref().unwrap();
        assert_eq!((second.root.id.as_str(), second.parent.id.as_str()), ("p0", "p0"));
        let third = rec.calls[2].1.as_ref().unwrap();
        assert_eq!((third.root.id.as_str(), third.parent.id.as_str()), ("p0", "p1"));
    }

    #[test]
    fn thread_stops_at_first_failure() {
        let mut rec = Recorder {
            calls: vec![],
            fail_at: Some(1),
        };
        let err = publish_thread(&mut rec, &units(3)).unwrap_err();
        assert!(err.source.is_tolerated());
        assert_eq!(rec.calls.len(), 1);
        assert_eq!(err.posted, vec![PostRef { id: "p0".into() }]);
    }

    #[test]
    fn outbox_writes_lines_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut outbox = OutboxPublisher::new(dir.path(), Platform::X).unwrap();

        let mut b = TextBuilder::new();
        b.text("→ ")
            .link("Read it here", "https://digitallibrary.un.org/record/42?ln=en&v=pdf");
        let mut root = b.build();
        root.images.push(ImageAttachment {
            bytes: vec![0xFF, 0xD8, 0xFF],
            alt: "Screenshot of page 1 of the report".into(),
        });
        let thread = vec![root, PostUnit::plain("reply")];

        publish_thread(&mut outbox, &thread).unwrap();

        let entries = outbox.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].image_files.len(), 1);
        let image = outbox.dir().join(&entries[0].image_files[0]);
        assert_eq!(fs::read(image).unwrap(), vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(entries[1].reply.as_ref().unwrap().root.id, entries[0].id);
        assert_eq!(
            outbox.links().unwrap(),
            vec!["https://digitallibrary.un.org/record/42?ln=en&v=pdf".to_string()]
        );
        assert!(dir.path().join("x").join("posts.jsonl").exists());
    }

    #[test]
    fn outbox_enforces_length_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut outbox = OutboxPublisher::new(dir.path(), Platform::Bluesky)
            .unwrap()
            .with_max_length(5);
        let err = outbox.publish(&PostUnit::plain("too long"), None).unwrap_err();
        assert!(matches!(err, HarvestError::PublishFailed { .. }));
        assert!(outbox.entries().unwrap().is_empty());
    }
}
