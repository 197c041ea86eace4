use crate::constants::DEFAULT_GIT_TIMEOUT_SECS;
use clap::Parser;
use std::path::PathBuf;

/// git-status-view: live git status with single-key stage, unstage and commit
#[derive(Parser, Debug)]
#[command(name = "git-status-view", about, long_about = None, version)]
pub struct Cli {
    /// repository to show (any path inside the working tree)
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// seconds before a git command is abandoned
    #[arg(
        long,
        default_value_t = DEFAULT_GIT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub git_timeout: u64,

    /// editor used for commit messages
    #[arg(long, env = "EDITOR")]
    pub editor: Option<String>,

    /// append diagnostics to this file
    #[arg(long, env = "GIT_STATUS_VIEW_LOG")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn explicit_flags() {
        let cli = Cli::try_parse_from([
            "git-status-view",
            "--repo",
            "/tmp/repo",
            "--git-timeout",
            "5",
            "--editor",
            "vi",
            "--log-file",
            "/tmp/view.log",
        ])
        .unwrap();

        assert_eq!(cli.repo, PathBuf::from("/tmp/repo"));
        assert_eq!(cli.git_timeout, 5);
        assert_eq!(cli.editor.as_deref(), Some("vi"));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/view.log")));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Cli::try_parse_from(["git-status-view", "--git-timeout", "soon"]).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["git-status-view", "--git-timeout", "0"]).is_err());
        let cli = Cli::try_parse_from(["git-status-view", "--git-timeout", "1"]).unwrap();
        assert_eq!(cli.git_timeout, 1);
    }

    #[test]
    fn timeout_defaults() {
        let cli = Cli::try_parse_from(["git-status-view"]).unwrap();
        assert_eq!(cli.git_timeout, DEFAULT_GIT_TIMEOUT_SECS);
    }
}
