use anyhow::{Context, Result, bail};
use std::path::Path;

#[macro_export]
macro_rules! status {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!($fmt $(, $($arg)*)?).green());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!("{}", $expr).green());
    }};
}

#[macro_export]
macro_rules! warning {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).yellow());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).yellow());
    }};
}

#[macro_export]
macro_rules! error {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).red());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).red());
    }};
}

/// send diagnostics to `log_file`, the terminal itself belongs to the status view
///
/// without a log file nothing is recorded
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    use std::fs::File;
    use std::sync::Mutex;
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let Some(path) = log_file else {
        return Ok(());
    };

    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .context("failed to initialise logging")?;

    Ok(())
}

/// open `path` in `editor` and wait for it to exit
pub fn edit_file(editor: &str, path: &Path) -> Result<()> {
    use std::process::Command;

    // run the editor via shell to properly handle arguments in EDITOR
    let quoted = shlex::try_quote(&path.to_string_lossy())
        .context("commit message path cannot be quoted")?
        .into_owned();
    let editor_command = format!("{editor} {quoted}");

    let status = Command::new("sh")
        .arg("-c")
        .arg(&editor_command)
        .status()
        .with_context(|| format!("failed to run editor: {editor}"))?;

    if !status.success() {
        bail!("editor exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn edit_file_runs_editor_command_on_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("with space.txt");
        fs::write(&path, "before\n").unwrap();

        // a scripted "editor" that appends to the file it is given
        edit_file("sh -c 'echo edited >> \"$0\"'", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "before\nedited\n");
    }

    #[test]
    fn edit_file_reports_editor_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("msg");

        assert!(edit_file("false", &path).is_err());
    }
}
