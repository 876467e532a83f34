//! Attribution provider boundary.
//!
//! The service never computes authorship itself. A [`BlameProvider`] hands it
//! finished per-line attribution; the production implementation shells out to
//! the `git-ai` CLI inside the repository, and tests substitute a scripted
//! provider. Everything above this trait treats attribution as opaque data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{AppError, ProviderError, Result};
use crate::models::{BlameResult, LineAttribution, Priority, PromptRecord};

/// Source of per-line AI attribution for documents in one repository.
#[async_trait]
pub trait BlameProvider: Send + Sync {
    /// Computes attribution for one document. `Ok(None)` means no
    /// attribution is available (untracked file, no authorship notes); the
    /// caller may retry on a later event.
    async fn request_blame(
        &self,
        document: &str,
        priority: Priority,
    ) -> std::result::Result<Option<BlameResult>, ProviderError>;

    /// Hints that any provider-side cache for the document is void.
    fn invalidate_cache(&self, document: &str);

    /// Drops provider-side work for the document, if any.
    fn cancel_for_document(&self, document: &str);

    /// Releases provider resources on shutdown.
    fn dispose(&self);
}

/// Attribution via the external `git-ai` CLI.
///
/// Each fetch runs `<program> blame --json <document>` in the repository
/// workdir and expands the range-based output into a per-line map. The CLI
/// recomputes from its authorship notes on every call, so the cache and
/// cancellation hooks have nothing to tear down.
pub struct GitAiProvider {
    program: String,
    workdir: PathBuf,
}

impl GitAiProvider {
    /// Discovers the repository containing `path` and prepares to run
    /// `program` inside its workdir.
    pub fn open<P: AsRef<Path>>(path: P, program: &str) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let repo = git2::Repository::discover(&path)
            .map_err(|_| AppError::RepoNotFound(path_str.clone()))?;
        let workdir = repo
            .workdir()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| AppError::InvalidPath(format!("{} is a bare repository", path_str)))?;

        Ok(Self {
            program: program.to_string(),
            workdir,
        })
    }

    /// Repository workdir the provider runs in.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

#[async_trait]
impl BlameProvider for GitAiProvider {
    async fn request_blame(
        &self,
        document: &str,
        priority: Priority,
    ) -> std::result::Result<Option<BlameResult>, ProviderError> {
        let output = tokio::process::Command::new(&self.program)
            .arg("blame")
            .arg("--json")
            .arg(document)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ProviderError::Exit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // No output at all means the file has no authorship notes.
        if output.stdout.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }

        let cli: CliBlame = serde_json::from_slice(&output.stdout)?;
        let result = expand_attestations(cli);
        debug!(
            document,
            ?priority,
            lines = result.line_authors.len(),
            "blame fetched"
        );
        Ok(Some(result))
    }

    fn invalidate_cache(&self, document: &str) {
        // The CLI recomputes per call; nothing to drop on our side.
        trace!(document, "provider cache invalidated");
    }

    fn cancel_for_document(&self, document: &str) {
        // In-flight commands die with their task via kill_on_drop.
        trace!(document, "provider work cancelled");
    }

    fn dispose(&self) {
        debug!("blame provider disposed");
    }
}

/// Wire shape of `git-ai blame --json`: range attestations joined against a
/// prompt table, the same layout git-ai keeps in its authorship log.
#[derive(Debug, Deserialize)]
struct CliBlame {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    attributions: Vec<CliAttribution>,
    #[serde(default)]
    prompts: HashMap<String, PromptRecord>,
}

#[derive(Debug, Deserialize)]
struct CliAttribution {
    prompt_id: String,
    start_line: u32,
    end_line: u32,
    #[serde(default)]
    author: Option<String>,
}

/// Expands range attestations into the per-line map the store serves.
fn expand_attestations(cli: CliBlame) -> BlameResult {
    let mut line_authors = HashMap::new();
    for attestation in &cli.attributions {
        let record = cli.prompts.get(&attestation.prompt_id);
        let author = attestation
            .author
            .clone()
            .or_else(|| record.map(|r| r.display_tool().to_string()))
            .unwrap_or_else(|| "AI".to_string());

        for line in attestation.start_line..=attestation.end_line {
            line_authors.insert(
                line,
                LineAttribution {
                    is_ai_authored: true,
                    author: author.clone(),
                    prompt_id: attestation.prompt_id.clone(),
                    record: record.cloned(),
                },
            );
        }
    }

    BlameResult {
        line_authors,
        subject_version: cli.subject,
    }
}
