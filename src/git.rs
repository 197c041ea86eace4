use crate::snapshot::StatusEntry;
use anyhow::{Context, Result, anyhow, bail};
use git2::{Repository, Status, StatusOptions};
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// the version-control operations the status view consumes
pub trait Vcs {
    /// working-tree status with index and working-tree markers, in native order
    fn status(&self) -> Result<Vec<StatusEntry>>;

    /// human readable `git status` output
    fn status_text(&self) -> Result<String>;

    /// `git diff --staged`
    fn staged_diff(&self) -> Result<String>;

    /// add `path` to the index
    fn add(&self, path: &Path) -> Result<()>;

    /// reset `path` in the index to HEAD
    fn reset(&self, path: &Path) -> Result<()>;

    /// commit the index with `message`
    fn commit(&self, message: &str) -> Result<()>;
}

/// check that `path` is inside a non-bare repository and return its working directory
pub fn sanity_check(path: &Path) -> Result<PathBuf> {
    // can be anywhere within the repo
    let repo = Repository::discover(path)
        .with_context(|| format!("not in a git repository: {}", path.display()))?;

    match repo.workdir() {
        Some(workdir) => Ok(workdir.to_path_buf()),
        None => bail!("repository has no working tree (bare repository)"),
    }
}

/// reads status through libgit2, mutates through the git binary
///
/// mutations use the binary rather than git2 so hooks (pre-commit, commit-msg,
/// etc.) and commit signing behave the same as on the command line
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    timeout: Duration,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    /// run a git subcommand in the workspace root and return its stdout
    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let subcommand = subcommand_name(&args);
        debug!(?args, "running git");

        let mut child = Command::new("git")
            .args(&args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run git {subcommand}"))?;

        // drain both pipes while waiting, large diffs would otherwise fill them
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                if let Err(e) = child.kill() {
                    warn!("failed to kill git {}: {}", subcommand, e);
                }
                let _ = child.wait();
                bail!(
                    "git {subcommand} timed out after {}s",
                    self.timeout.as_secs()
                );
            }
            Err(e) => bail!("failed to wait for git {subcommand}: {e}"),
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            let detail = stderr.trim();
            if detail.is_empty() {
                bail!("git {subcommand} failed with {status}");
            }
            bail!("git {subcommand} failed: {detail}");
        }

        Ok(stdout)
    }
}

/// first argument after any leading `-c <name>=<value>` overrides
fn subcommand_name(args: &[OsString]) -> String {
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if arg == "-c" {
            args.next();
            continue;
        }
        return arg.to_string_lossy().to_string();
    }
    String::new()
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut data = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut data) {
            warn!("failed to read git output: {}", e);
        }
        String::from_utf8_lossy(&data).to_string()
    })
}

fn collect(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

impl Vcs for GitCli {
    fn status(&self) -> Result<Vec<StatusEntry>> {
        let repo = Repository::open(&self.root)
            .map_err(|e| anyhow!("failed to open git repository: {e}"))?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.recurse_untracked_dirs(true);
        opts.include_ignored(false);

        let statuses = repo
            .statuses(Some(&mut opts))
            .map_err(|e| anyhow!("failed to read git status: {e}"))?;

        let entries = statuses
            .iter()
            .filter_map(|entry| {
                let path = entry.path()?.to_string();
                let (index, working_dir) = status_markers(entry.status())?;
                Some(StatusEntry::new(path, index, working_dir))
            })
            .collect();

        Ok(entries)
    }

    fn status_text(&self) -> Result<String> {
        // the text lands in the commit template, so ignore color.ui=always
        self.run(["-c", "color.status=never", "status"])
    }

    fn staged_diff(&self) -> Result<String> {
        self.run(["diff", "--staged", "--no-color"])
    }

    fn add(&self, path: &Path) -> Result<()> {
        self.run([OsStr::new("add"), OsStr::new("--"), path.as_os_str()])
            .map(|_| ())
    }

    fn reset(&self, path: &Path) -> Result<()> {
        self.run([
            OsStr::new("reset"),
            OsStr::new("--quiet"),
            OsStr::new("--"),
            path.as_os_str(),
        ])
        .map(|_| ())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(["commit", "--message", message]).map(|_| ())
    }
}

/// map libgit2 status flags to porcelain-style (index, working tree) markers
///
/// returns None for entries that carry no change (ignored, current)
pub fn status_markers(status: Status) -> Option<(char, char)> {
    if status.is_conflicted() {
        return Some(('U', 'U'));
    }
    if status.is_wt_new() && !status.intersects(index_flags()) {
        return Some(('?', '?'));
    }

    let index = if status.is_index_new() {
        'A'
    } else if status.is_index_modified() {
        'M'
    } else if status.is_index_deleted() {
        'D'
    } else if status.is_index_renamed() {
        'R'
    } else if status.is_index_typechange() {
        'T'
    } else {
        ' '
    };

    let working_dir = if status.is_wt_modified() {
        'M'
    } else if status.is_wt_deleted() {
        'D'
    } else if status.is_wt_renamed() {
        'R'
    } else if status.is_wt_typechange() {
        'T'
    } else {
        ' '
    };

    if index == ' ' && working_dir == ' ' {
        None
    } else {
        Some((index, working_dir))
    }
}

fn index_flags() -> Status {
    Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE
}

#[cfg(test)]
mod tests;
