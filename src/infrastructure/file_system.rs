use crate::core::interfaces::FileSystemService;
use crate::utils::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Disk access for the command-line host, on tokio's blocking pool
pub struct TokioFileSystemService;

#[async_trait]
impl FileSystemService for TokioFileSystemService {
    async fn read_file(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path).await?)
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).await?,
            _ => {}
        }
        fs::write(path, content).await?;
        Ok(())
    }
}
