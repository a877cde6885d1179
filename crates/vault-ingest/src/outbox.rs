//! Final resting place of processed deposits

use crate::deposit::DepositState;
use anyhow::{bail, Context};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const PROCESSED: &str = "processed";
pub const REJECTED: &str = "rejected";
pub const FAILED: &str = "failed";

#[derive(Debug, Clone)]
pub struct Outbox {
    root: PathBuf,
}

impl Outbox {
    /// Check or create `<root>/{processed,rejected,failed}`
    pub fn init(root: impl Into<PathBuf>, create_if_missing: bool) -> anyhow::Result<Self> {
        let root = root.into();
        for dir in [root.clone(), root.join(PROCESSED), root.join(REJECTED), root.join(FAILED)] {
            if dir.is_dir() {
                continue;
            }
            if !create_if_missing {
                bail!("Outbox directory {} does not exist", dir.display());
            }
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create outbox directory {}", dir.display()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, state: DepositState) -> PathBuf {
        let sub = match state {
            DepositState::Accepted => PROCESSED,
            DepositState::Rejected => REJECTED,
            _ => FAILED,
        };
        self.root.join(sub)
    }

    /// Move a deposit directory into the subdirectory for `state`, keeping its name
    ///
    /// An existing directory of the same name is an error; the deposit stays where it is.
    pub fn move_deposit(&self, deposit_dir: &Path, state: DepositState) -> io::Result<PathBuf> {
        let name = deposit_dir
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "deposit path has no file name"))?;
        let target = self.dir_for(state).join(name);
        if target.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists in the outbox", target.display()),
            ));
        }

        match std::fs::rename(deposit_dir, &target) {
            Ok(()) => {},
            Err(e) => {
                warn!(
                    from = %deposit_dir.display(),
                    to = %target.display(),
                    error = %e,
                    "Rename failed, falling back to copy and delete"
                );
                copy_tree(deposit_dir, &target)?;
                std::fs::remove_dir_all(deposit_dir)?;
            },
        }
        debug!(to = %target.display(), %state, "Moved deposit to outbox");
        Ok(target)
    }
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
