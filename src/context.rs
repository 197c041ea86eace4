use crate::constants::{COMMIT_MESSAGE_FILE, NO_FOLDER_OPEN};
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// the workspace folder the status view is bound to
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    /// repository working directory, `None` when no folder is open
    root: Option<PathBuf>,
}

impl Workspace {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// resolve a workspace-relative path to an absolute one
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.join(relative)),
            None => bail!("{NO_FOLDER_OPEN}"),
        }
    }

    /// true only for an existing regular file
    pub fn is_file(path: &Path) -> bool {
        fs::metadata(path).is_ok_and(|meta| meta.is_file())
    }

    /// the scratch file git uses for commit messages
    pub fn commit_message_path(&self) -> Result<PathBuf> {
        let root = self.root.as_ref().context("no folder open")?;
        Ok(root.join(".git").join(COMMIT_MESSAGE_FILE))
    }

    /// delete a stale commit message file, a missing one is fine
    pub fn remove_commit_message(&self) -> Result<()> {
        let path = self.commit_message_path()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }
}
