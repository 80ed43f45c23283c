//! Digest delivery.
//!
//! The sink receives the finished digest and the recipient list. A successful
//! delivery is what allows the run to commit its history.

use anyhow::{Context, Result};
use common::DeliveryConfig;
use std::path::PathBuf;
use tracing::info;

#[async_trait::async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, digest: &str, recipients: &[String]) -> Result<()>;
}

/// Prints the digest to standard output between banner lines.
pub struct StdoutSink;

#[async_trait::async_trait]
impl DeliverySink for StdoutSink {
    async fn deliver(&self, digest: &str, recipients: &[String]) -> Result<()> {
        let banner = "=".repeat(30);
        println!("\n{}", banner);
        if !recipients.is_empty() {
            println!("To: {}", recipients.join(", "));
        }
        println!("{}", digest);
        println!("{}", banner);
        Ok(())
    }
}

/// Writes the digest to a Markdown file, replacing any previous one.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DeliverySink for FileSink {
    async fn deliver(&self, digest: &str, recipients: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }

        let mut content = String::new();
        if !recipients.is_empty() {
            content.push_str(&format!("<!-- recipients: {} -->\n\n", recipients.join(", ")));
        }
        content.push_str(digest);
        content.push('\n');

        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write digest: {}", self.path.display()))?;
        info!(path = %self.path.display(), "Digest written");
        Ok(())
    }
}

/// Build the sink named in the configuration.
pub fn sink_from_config(config: &DeliveryConfig) -> Result<Box<dyn DeliverySink>> {
    match config.kind.as_str() {
        "stdout" => Ok(Box::new(StdoutSink)),
        "file" => {
            let path = config
                .path
                .as_deref()
                .context("delivery.kind = \"file\" requires delivery.path")?;
            Ok(Box::new(FileSink::new(path)))
        }
        other => anyhow::bail!("Unknown delivery kind: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_sink_writes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("digest.md");
        let sink = FileSink::new(&path);

        sink.deliver("**Deals:** None", &["ops@example.com".to_string()]).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("ops@example.com"));
        assert!(written.ends_with("**Deals:** None\n"));
    }

    #[test]
    fn test_sink_from_config() {
        let mut cfg = DeliveryConfig::default();
        assert!(sink_from_config(&cfg).is_ok());

        cfg.kind = "file".to_string();
        assert!(sink_from_config(&cfg).is_err());

        cfg.path = Some("digest.md".to_string());
        assert!(sink_from_config(&cfg).is_ok());

        cfg.kind = "smtp".to_string();
        assert!(sink_from_config(&cfg).is_err());
    }
}
