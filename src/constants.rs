// virtual document
pub const SCHEME: &str = "git-status-view";
pub const STATUS_PATH: &str = "status";
pub const NO_FOLDER_OPEN: &str = "No folder open. Open a folder to see git status.";
pub const CLEAN_TREE: &str = "nothing to commit, working tree clean";

// status rendering
pub const STAGED_LABEL: &str = "STAGED:";
pub const UNSTAGED_LABEL: &str = "UNSTAGED:";
pub const INDENT: &str = "    ";
pub const SHORTCUT_HELP: &str = "\
SHORTCUTS:
    r  refresh
    s  stage file under cursor
    u  unstage file under cursor
    c  commit staged changes
";

// commit
pub const COMMIT_MESSAGE_FILE: &str = "COMMIT_EDITMSG";
pub const CUT_MARK: &str = "# ------------------------ >8 ------------------------";

// git
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;

// terminal
pub const PAGE_LINES: usize = 10;
