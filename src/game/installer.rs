//! Mod installation.
//!
//! The game loads the mod from a symlink in its mods directory. Pointing
//! that link at a different checkout selects which version gets benchmarked.

use crate::error::BenchError;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Replace the symlink at `link` so it points to `source`.
///
/// An existing symlink is removed first; anything else at `link` is left
/// alone and reported as an error.
pub fn install_mod(link: &Path, source: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            debug!("Removing existing mod link: {}", link.display());
            remove_link(link)
                .with_context(|| format!("Failed to remove mod link: {}", link.display()))?;
        }
        Ok(_) => return Err(BenchError::NotASymlink(link.to_path_buf()).into()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect mod link: {}", link.display()))
        }
    }

    symlink_dir(source, link).with_context(|| {
        format!(
            "Failed to link {} -> {}",
            link.display(),
            source.display()
        )
    })?;

    info!("Installed mod: {} -> {}", link.display(), source.display());
    Ok(())
}

#[cfg(unix)]
fn symlink_dir(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn symlink_dir(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(source, link)
}

#[cfg(unix)]
fn remove_link(link: &Path) -> std::io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_link(link: &Path) -> std::io::Result<()> {
    // Directory symlinks are removed as directories on Windows.
    fs::remove_dir(link).or_else(|_| fs::remove_file(link))
}
