mod cli;
mod commit;
mod constants;
mod context;
mod controller;
mod git;
mod provider;
mod snapshot;
mod terminal;
mod ui;

use crate::cli::Cli;
use crate::context::Workspace;
use crate::controller::ViewController;
use crate::git::GitCli;
use crate::git::Vcs;
use crate::provider::StatusContentProvider;
use crate::snapshot::StatusSnapshot;
use crate::terminal::TerminalHost;
use anyhow::{Result, bail};
use std::io::IsTerminal;
use std::rc::Rc;
use std::time::Duration;

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    ui::init_logging(cli.log_file.as_deref())?;

    // sanity checks
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        bail!("interactive terminal required");
    }
    let root = git::sanity_check(&cli.repo)?;
    if cli.editor.is_none() {
        warning!("EDITOR not set, committing is unavailable");
    }
    tracing::info!(root = %root.display(), "opening status view");

    // wiring
    let workspace = Workspace::new(Some(root.clone()));
    let vcs = Rc::new(GitCli::new(&root, Duration::from_secs(cli.git_timeout)));
    let provider = Rc::new(StatusContentProvider::new(vcs.clone(), workspace.clone()));
    let host = Rc::new(TerminalHost::new(cli.editor));
    let mut controller =
        ViewController::new(host.clone(), vcs.clone(), provider.clone(), workspace);

    terminal::run(&host, &provider, &mut controller)?;

    // final summary, printed once the alternate screen is gone
    let snapshot = StatusSnapshot::from_entries(&vcs.status()?);
    status!("{}: {}", root.display(), snapshot.summary());
    Ok(())
}
