//! Versioned project-content store.
//!
//! An in-process cache (authoritative while the process lives) layered over
//! an optional durable backend (source of truth on cold start). Writes go
//! cache first, then backend; the two are deliberately not transactionally
//! linked — see the concurrency notes in `core::engine`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current state of one editable project: a single logical file's full text
/// plus a monotonic version counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: String,
    pub template_slug: String,
    pub content: String,
    pub version: u64,
}

/// Durable persistence seam. Implementations must tolerate unknown ids on
/// `load` (return `Ok(None)`) and overwrite on `store`.
pub trait DurableStore {
    fn load(&self, id: &str) -> Result<Option<ProjectRecord>>;
    fn store(&self, record: &ProjectRecord) -> Result<()>;
}

/// Recover the human-readable template slug from an id's conventional
/// `slug--suffix` shape. Ids without the delimiter are their own slug.
pub fn template_slug_of(id: &str) -> &str {
    id.split_once("--").map_or(id, |(slug, _)| slug)
}

/// Allocate a fresh project id embedding the template slug.
fn generate_project_id(template_slug: &str) -> String {
    let alphabet = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..10)
        .map(|_| {
            let idx = rng.random_range(0..alphabet.len());
            alphabet[idx] as char
        })
        .collect();
    format!("{template_slug}--{suffix}")
}

/// Write-through content store: cache over optional durable backend.
pub struct ContentStore {
    cache: IndexMap<String, ProjectRecord>,
    durable: Option<Box<dyn DurableStore>>,
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("cached", &self.cache.len())
            .field("durable", &self.durable.is_some())
            .finish()
    }
}

impl ContentStore {
    /// Cache-only store; records live for the process lifetime.
    pub fn in_memory() -> Self {
        Self {
            cache: IndexMap::new(),
            durable: None,
        }
    }

    /// Store backed by a durable backend.
    pub fn with_durable(durable: Box<dyn DurableStore>) -> Self {
        Self {
            cache: IndexMap::new(),
            durable: Some(durable),
        }
    }

    /// Allocate a fresh project for `template_slug`: empty content,
    /// version 0, written through and cached.
    pub fn create(&mut self, template_slug: &str) -> Result<ProjectRecord> {
        let record = ProjectRecord {
            id: generate_project_id(template_slug),
            template_slug: template_slug.to_string(),
            content: String::new(),
            version: 0,
        };
        self.commit(record.clone())?;
        debug!(id = %record.id, "created project");
        Ok(record)
    }

    /// Record for `id`: cache, then durable backend, then a synthesized
    /// zero-content record written through. Unknown ids self-heal into
    /// fresh projects; calling twice returns the same record.
    pub fn ensure(&mut self, id: &str) -> Result<ProjectRecord> {
        if let Some(record) = self.cache.get(id) {
            return Ok(record.clone());
        }
        if let Some(record) = self.load_durable(id)? {
            self.cache.insert(id.to_string(), record.clone());
            return Ok(record);
        }
        let record = ProjectRecord {
            id: id.to_string(),
            template_slug: template_slug_of(id).to_string(),
            content: String::new(),
            version: 0,
        };
        self.commit(record.clone())?;
        debug!(id, "materialized unknown project");
        Ok(record)
    }

    /// Current content for `id`, or `None` when no record exists anywhere.
    /// Callers substitute original unedited source for `None`.
    pub fn read(&mut self, id: &str) -> Result<Option<String>> {
        if let Some(record) = self.cache.get(id) {
            return Ok(Some(record.content.clone()));
        }
        if let Some(record) = self.load_durable(id)? {
            let content = record.content.clone();
            self.cache.insert(id.to_string(), record);
            return Ok(Some(content));
        }
        Ok(None)
    }

    /// Record `content` at `version` for `id`: cache first, then backend,
    /// so a live process never reads a stale pairing.
    pub fn write(&mut self, id: &str, content: &str, version: u64) -> Result<()> {
        let record = match self.cache.get(id) {
            Some(existing) => ProjectRecord {
                content: content.to_string(),
                version,
                ..existing.clone()
            },
            None => ProjectRecord {
                id: id.to_string(),
                template_slug: template_slug_of(id).to_string(),
                content: content.to_string(),
                version,
            },
        };
        self.commit(record)
    }

    fn commit(&mut self, record: ProjectRecord) -> Result<()> {
        self.cache.insert(record.id.clone(), record.clone());
        if let Some(durable) = &self.durable {
            durable
                .store(&record)
                .with_context(|| format!("persist project {}", record.id))?;
        }
        Ok(())
    }

    fn load_durable(&self, id: &str) -> Result<Option<ProjectRecord>> {
        match &self.durable {
            Some(durable) => durable.load(id),
            None => Ok(None),
        }
    }
}

/// Serialized durable form: the record plus integrity metadata.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    template_slug: String,
    content: String,
    version: u64,
    checksum: String, // blake3:<hex> of content
    updated_at: String, // RFC3339
}

fn content_checksum(content: &str) -> String {
    format!("blake3:{}", blake3::hash(content.as_bytes()).to_hex())
}

/// One JSON record per project under a root directory, written atomically
/// via a temp file and rename.
#[derive(Debug)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create store dir: {}", root.display()))?;
        Ok(Self { root })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        // Ids are slug--suffix by convention, but treat them as hostile.
        let safe: String = id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

impl DurableStore for JsonDirStore {
    fn load(&self, id: &str) -> Result<Option<ProjectRecord>> {
        let path = self.record_path(id);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read record: {}", path.display()));
            }
        };
        let stored: StoredRecord = serde_json::from_str(&text)
            .with_context(|| format!("parse record: {}", path.display()))?;

        if stored.checksum != content_checksum(&stored.content) {
            // Integrity signal, not a gate: the durable copy is still the
            // best content we have on cold start.
            warn!(id, path = %path.display(), "stored checksum mismatch");
        }

        Ok(Some(ProjectRecord {
            id: stored.id,
            template_slug: stored.template_slug,
            content: stored.content,
            version: stored.version,
        }))
    }

    fn store(&self, record: &ProjectRecord) -> Result<()> {
        let stored = StoredRecord {
            id: record.id.clone(),
            template_slug: record.template_slug.clone(),
            content: record.content.clone(),
            version: record.version,
            checksum: content_checksum(&record.content),
            updated_at: Utc::now().to_rfc3339(),
        };
        let text = serde_json::to_string_pretty(&stored).context("serialize record")?;

        let path = self.record_path(&record.id);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .with_context(|| format!("create temp record in {}", self.root.display()))?;
        tmp.write_all(text.as_bytes())
            .with_context(|| format!("write temp record: {}", tmp.path().display()))?;
        tmp.persist(&path)
            .with_context(|| format!("persist record: {}", path.display()))?;
        Ok(())
    }
}
