//! Markdown note persistence

use async_trait::async_trait;
use chrono::Local;
use sdk::types::{ToolError, ToolOutcome};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

/// Longest filename stem kept from a title
const MAX_STEM_CHARS: usize = 80;

/// Writes a titled document somewhere durable and returns where
#[async_trait]
pub trait NoteWriter: Send + Sync {
    async fn save(&self, title: &str, content: &str) -> ToolOutcome<PathBuf>;
}

/// One `.md` file per note inside `directory`
#[derive(Debug, Clone)]
pub struct MarkdownNoteWriter {
    directory: PathBuf,
}

impl MarkdownNoteWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl NoteWriter for MarkdownNoteWriter {
    async fn save(&self, title: &str, content: &str) -> ToolOutcome<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let stem = format!(
            "{}_{}",
            sanitize_title(title),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let document = render_markdown(title, content);

        for attempt in 0u32.. {
            let name = if attempt == 0 {
                format!("{}.md", stem)
            } else {
                format!("{}_{}.md", stem, attempt)
            };
            let path = self.directory.join(name);

            let file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            write_or_discard(file, &path, document.as_bytes()).await?;

            info!("Saved markdown note: {}", path.display());
            return Ok(path);
        }

        Err(ToolError::Failed("no free filename for note".to_string()))
    }
}

/// Write `bytes` to a freshly created file, removing it if the write fails
async fn write_or_discard<W>(mut file: W, path: &Path, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove) = tokio::fs::remove_file(path).await {
            warn!("Could not remove partial note {}: {}", path.display(), remove);
        }
        return Err(e);
    }
    Ok(())
}

/// `# title` heading, blank line, content, trailing newline
pub fn render_markdown(title: &str, content: &str) -> String {
    let title = match title.trim() {
        "" => "Notes",
        t => t,
    };
    format!("# {}\n\n{}\n", title, content.trim())
}

/// Reduce a title to `[A-Za-z0-9_-]`, collapsing everything else into `_`
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let stem: String = out.trim_matches('_').chars().take(MAX_STEM_CHARS).collect();
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() {
        "note".to_string()
    } else {
        stem.to_string()
    }
}
