use crate::commit;
use crate::context::Workspace;
use crate::git::Vcs;
use crate::provider::{StatusContentProvider, status_uri};
use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::mem;
use std::path::Path;
use std::rc::Rc;
use std::thread::{self, ScopedJoinHandle};
use tracing::{debug, info, warn};

/// an editor pane in the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaneId(pub u32);

/// a document opened through the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u32);

/// the editor operations the controller drives
pub trait Host {
    /// open (or reuse) the virtual document at `uri`, show it and return its pane
    fn show_virtual_document(&self, uri: &str) -> Result<PaneId>;

    fn set_line_numbers(&self, pane: PaneId, visible: bool);

    fn focused_pane(&self) -> Option<PaneId>;

    /// text of the line under the cursor in `pane`
    fn line_at_cursor(&self, pane: PaneId) -> Option<String>;

    /// open a new unsaved document backed by `path` and filled with `contents`
    fn open_untitled(&self, path: &Path, contents: &str) -> Result<DocumentId>;

    /// show `document` focused, with the cursor at the top
    fn show_document(&self, document: DocumentId) -> Result<()>;

    fn close_active_editor(&self) -> Result<()>;

    /// surface a short message to the user
    fn notify(&self, message: &str);
}

/// interception of raw keystrokes, held only while the status view has focus
pub trait KeyCapture {
    type Registration;

    fn acquire(&self) -> Self::Registration;

    fn release(&self, registration: Self::Registration);
}

/// the capture registration only exists inside `Focused`
enum ViewState<R> {
    Closed,
    Unfocused { pane: PaneId },
    Focused { pane: PaneId, capture: R },
}

/// observable state of the status view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Closed,
    Unfocused,
    Focused,
}

/// single-key shortcuts available while the status view is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Refresh,
    Stage,
    Unstage,
    Commit,
}

impl KeyAction {
    pub fn from_char(key: char) -> Option<Self> {
        match key {
            'r' => Some(Self::Refresh),
            's' => Some(Self::Stage),
            'u' => Some(Self::Unstage),
            'c' => Some(Self::Commit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum IndexChange {
    Add,
    Reset,
}

impl fmt::Display for IndexChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "stage"),
            Self::Reset => write!(f, "unstage"),
        }
    }
}

/// one-shot save observer for the commit message document
#[derive(Debug)]
struct PendingCommit {
    document: DocumentId,
}

/// owns the status view lifecycle and turns keystrokes into git actions
pub struct ViewController<H: Host + KeyCapture, V: Vcs> {
    host: Rc<H>,
    vcs: Rc<V>,
    provider: Rc<StatusContentProvider<V>>,
    workspace: Workspace,
    state: ViewState<H::Registration>,
    pending_commit: Option<PendingCommit>,
}

impl<H: Host + KeyCapture, V: Vcs + Sync> ViewController<H, V> {
    pub fn new(
        host: Rc<H>,
        vcs: Rc<V>,
        provider: Rc<StatusContentProvider<V>>,
        workspace: Workspace,
    ) -> Self {
        Self {
            host,
            vcs,
            provider,
            workspace,
            state: ViewState::Closed,
            pending_commit: None,
        }
    }

    pub fn status(&self) -> ViewStatus {
        match self.state {
            ViewState::Closed => ViewStatus::Closed,
            ViewState::Unfocused { .. } => ViewStatus::Unfocused,
            ViewState::Focused { .. } => ViewStatus::Focused,
        }
    }

    /// the pane currently showing the status view
    pub fn pane(&self) -> Option<PaneId> {
        match self.state {
            ViewState::Closed => None,
            ViewState::Unfocused { pane } | ViewState::Focused { pane, .. } => Some(pane),
        }
    }

    pub fn has_pending_commit(&self) -> bool {
        self.pending_commit.is_some()
    }

    /// open (or reuse) the status view and start tracking its pane
    pub fn open_view(&mut self) -> Result<()> {
        let pane = self.host.show_virtual_document(&status_uri())?;
        self.host.set_line_numbers(pane, false);

        // an existing capture follows the view, focus is reconciled below
        self.state = match mem::replace(&mut self.state, ViewState::Closed) {
            ViewState::Focused { capture, .. } => ViewState::Focused { pane, capture },
            _ => ViewState::Unfocused { pane },
        };
        let focused = self.host.focused_pane();
        self.on_focus_changed(focused);
        Ok(())
    }

    /// focus watcher, key capture is held iff the tracked pane is focused
    pub fn on_focus_changed(&mut self, focused: Option<PaneId>) {
        self.state = match mem::replace(&mut self.state, ViewState::Closed) {
            ViewState::Unfocused { pane } if focused == Some(pane) => {
                debug!(?pane, "status view focused, capturing keys");
                ViewState::Focused {
                    pane,
                    capture: self.host.acquire(),
                }
            }
            ViewState::Focused { pane, capture } if focused != Some(pane) => {
                debug!(?pane, ?focused, "status view lost focus, releasing keys");
                self.host.release(capture);
                ViewState::Unfocused { pane }
            }
            state => state,
        };
    }

    /// stop tracking the view, on deactivation or when its pane closes
    pub fn close_view(&mut self) {
        if let ViewState::Focused { capture, .. } = mem::replace(&mut self.state, ViewState::Closed)
        {
            self.host.release(capture);
        }
        debug!("status view closed");
    }

    pub fn on_keypress(&mut self, key: char) -> Result<()> {
        if !matches!(self.state, ViewState::Focused { .. }) {
            debug!(?key, "status view not focused, ignoring key");
            return Ok(());
        }

        match KeyAction::from_char(key) {
            Some(KeyAction::Refresh) => self.provider.request_refresh(),
            Some(KeyAction::Stage) => self.stage_current(),
            Some(KeyAction::Unstage) => self.unstage_current(),
            Some(KeyAction::Commit) => self.commit_staged()?,
            None => {}
        }
        Ok(())
    }

    /// the trimmed line under the cursor, read as a workspace-relative path
    pub fn focused_file(&self) -> Option<String> {
        let pane = self.pane()?;
        self.host
            .line_at_cursor(pane)
            .map(|line| line.trim().to_string())
    }

    pub fn stage_current(&self) {
        self.change_index(IndexChange::Add);
    }

    pub fn unstage_current(&self) {
        self.change_index(IndexChange::Reset);
    }

    /// failures are reported, never returned, and the view is refreshed either way
    fn change_index(&self, change: IndexChange) {
        if let Err(e) = self.try_change_index(change) {
            warn!("{} failed: {:#}", change, e);
            self.host.notify(&format!("{change} failed: {e:#}"));
        }
        self.provider.request_refresh();
    }

    fn try_change_index(&self, change: IndexChange) -> Result<()> {
        let file = self
            .focused_file()
            .filter(|file| !file.is_empty())
            .context("no file under cursor")?;
        let path = self.workspace.resolve(&file)?;

        // deleted files are still tracked, git decides whether the path is valid
        if !Workspace::is_file(&path) {
            debug!(path = %path.display(), "not an existing file");
        }

        match change {
            IndexChange::Add => self.vcs.add(&path),
            IndexChange::Reset => self.vcs.reset(&path),
        }?;
        info!(path = %path.display(), "{change} succeeded");
        Ok(())
    }

    /// open the commit message document for the staged changes
    pub fn commit_staged(&mut self) -> Result<()> {
        let path = self.workspace.commit_message_path()?;

        let vcs: &V = &self.vcs;
        let (status_text, diff) = thread::scope(|scope| {
            let status_text = scope.spawn(|| vcs.status_text());
            let diff = scope.spawn(|| vcs.staged_diff());
            (joined(status_text), joined(diff))
        });
        let template = commit::template(&status_text?, &diff?);

        self.workspace.remove_commit_message()?;
        let document = self.host.open_untitled(&path, &template)?;
        if let Some(previous) = self.pending_commit.replace(PendingCommit { document }) {
            debug!(?previous, "replacing pending commit");
        }
        self.host.show_document(document)?;
        Ok(())
    }

    /// save observer, commits when the pending commit document is saved
    ///
    /// a failed commit leaves the observer armed so a corrected save retries
    pub fn on_document_saved(&mut self, document: DocumentId, text: &str) -> Result<()> {
        if self
            .pending_commit
            .as_ref()
            .is_none_or(|pending| pending.document != document)
        {
            return Ok(());
        }

        let message = commit::extract_message(text);
        self.vcs.commit(&message).context("commit failed")?;
        self.pending_commit = None;
        info!("committed staged changes");

        if let Err(e) = self.host.close_active_editor() {
            warn!("failed to close commit message: {:#}", e);
        }
        self.provider.request_refresh();
        Ok(())
    }

    pub fn on_document_closed(&mut self, document: DocumentId) {
        if self
            .pending_commit
            .as_ref()
            .is_some_and(|pending| pending.document == document)
        {
            debug!(?document, "commit message closed without committing");
            self.pending_commit = None;
        }
    }
}

fn joined<T>(handle: ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("git worker panicked"))
        .and_then(|result| result)
}
