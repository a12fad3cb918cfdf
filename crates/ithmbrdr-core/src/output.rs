use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::info;

use crate::error::{ExtractError, Result};

/// Where decoded frames of one container are written.
///
/// A container `F1_1.ithmb` extracted under `root` produces `root/F1_1/F1_1_<index>.png`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
    base: String,
    extension: &'static str,
}

impl OutputLayout {
    pub fn for_container(container: &Path, root: &Path, format: ImageFormat) -> Result<Self> {
        let base = container
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.split('.').next())
            .filter(|base| !base.is_empty())
            .ok_or_else(|| ExtractError::InvalidContainerPath(container.to_path_buf()))?
            .to_string();

        let extension = format.extensions_str().first().copied().unwrap_or("img");

        Ok(Self {
            dir: root.join(&base),
            base,
            extension,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_name(&self) -> &str {
        &self.base
    }

    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{}_{}.{}", self.base, index, self.extension))
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir).map_err(|source| ExtractError::CreateOutputDir {
            path: self.dir.clone(),
            source,
        })?;
        info!(dir = ?self.dir, "created output directory");
        Ok(())
    }
}
