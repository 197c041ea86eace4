use crate::constants::PAGE_LINES;
use crate::controller::{DocumentId, Host, KeyCapture, PaneId, ViewController};
use crate::git::Vcs;
use crate::provider::StatusContentProvider;
use crate::ui;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use crossterm::event::{
    self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::style::Print;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{cursor, execute, queue};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

const STATUS_PANE: PaneId = PaneId(1);
const HINT: &str = "r refresh  s stage  u unstage  c commit  esc quit";

/// the full-screen status document
struct StatusPane {
    uri: String,
    lines: Vec<String>,
    cursor: usize,
    scroll: usize,
    line_numbers: bool,
}

/// an untitled document waiting for (or inside) the external editor
#[derive(Debug, Clone)]
struct ScratchDocument {
    id: DocumentId,
    pane: PaneId,
    path: PathBuf,
    initial: String,
    shown: bool,
}

/// proof that raw character keys are being routed to the controller
#[derive(Debug)]
pub struct CaptureToken(());

/// a terminal standing in for the editor host
///
/// the status view fills the screen, untitled documents are edited in `$EDITOR`
pub struct TerminalHost {
    editor: Option<String>,
    status: RefCell<Option<StatusPane>>,
    scratch: RefCell<Option<ScratchDocument>>,
    focused: Cell<Option<PaneId>>,
    capturing: Cell<bool>,
    dirty: Cell<bool>,
    message: RefCell<Option<String>>,
    next_id: Cell<u32>,
}

impl TerminalHost {
    pub fn new(editor: Option<String>) -> Self {
        Self {
            editor,
            status: RefCell::new(None),
            scratch: RefCell::new(None),
            focused: Cell::new(None),
            capturing: Cell::new(false),
            dirty: Cell::new(false),
            message: RefCell::new(None),
            next_id: Cell::new(STATUS_PANE.0 + 1),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.get()
    }

    /// the status document changed and must be re-requested before drawing
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    fn status_uri(&self) -> Option<String> {
        self.status.borrow().as_ref().map(|pane| pane.uri.clone())
    }

    fn set_status_text(&self, text: &str) {
        if let Some(pane) = self.status.borrow_mut().as_mut() {
            pane.lines = text.lines().map(str::to_string).collect();
            pane.cursor = pane.cursor.min(pane.lines.len().saturating_sub(1));
        }
    }

    fn move_cursor(&self, target: impl FnOnce(usize, usize) -> usize) {
        if let Some(pane) = self.status.borrow_mut().as_mut() {
            let last = pane.lines.len().saturating_sub(1);
            pane.cursor = target(pane.cursor, last).min(last);
        }
    }

    fn set_focus(&self, pane: Option<PaneId>) {
        self.focused.set(pane);
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// a shown scratch document whose editor has not been launched yet
    fn take_edit_request(&self) -> Option<ScratchDocument> {
        let mut scratch = self.scratch.borrow_mut();
        let document = scratch.as_mut().filter(|document| document.shown)?;
        document.shown = false;
        Some(document.clone())
    }

    fn is_document_open(&self, document: DocumentId) -> bool {
        self.scratch
            .borrow()
            .as_ref()
            .is_some_and(|scratch| scratch.id == document)
    }

    fn close_scratch(&self) {
        if self.scratch.borrow_mut().take().is_some() {
            let status_open = self.status.borrow().is_some();
            self.set_focus(status_open.then_some(STATUS_PANE));
        }
    }
}

impl Host for TerminalHost {
    fn show_virtual_document(&self, uri: &str) -> Result<PaneId> {
        let mut status = self.status.borrow_mut();
        if status.as_ref().is_none_or(|pane| pane.uri != uri) {
            *status = Some(StatusPane {
                uri: uri.to_string(),
                lines: Vec::new(),
                cursor: 0,
                scroll: 0,
                line_numbers: true,
            });
        }
        self.mark_dirty();
        self.set_focus(Some(STATUS_PANE));
        Ok(STATUS_PANE)
    }

    fn set_line_numbers(&self, pane: PaneId, visible: bool) {
        if pane == STATUS_PANE
            && let Some(status) = self.status.borrow_mut().as_mut()
        {
            status.line_numbers = visible;
        }
    }

    fn focused_pane(&self) -> Option<PaneId> {
        self.focused.get()
    }

    fn line_at_cursor(&self, pane: PaneId) -> Option<String> {
        if pane != STATUS_PANE {
            return None;
        }
        let status = self.status.borrow();
        let status = status.as_ref()?;
        status.lines.get(status.cursor).cloned()
    }

    fn open_untitled(&self, path: &Path, contents: &str) -> Result<DocumentId> {
        // the external editor needs the document on disk
        fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;

        let id = DocumentId(self.next_id());
        let pane = PaneId(self.next_id());
        *self.scratch.borrow_mut() = Some(ScratchDocument {
            id,
            pane,
            path: path.to_path_buf(),
            initial: contents.to_string(),
            shown: false,
        });
        Ok(id)
    }

    fn show_document(&self, document: DocumentId) -> Result<()> {
        let mut scratch = self.scratch.borrow_mut();
        match scratch.as_mut() {
            Some(scratch) if scratch.id == document => {
                scratch.shown = true;
                self.set_focus(Some(scratch.pane));
                Ok(())
            }
            _ => bail!("unknown document {document:?}"),
        }
    }

    fn close_active_editor(&self) -> Result<()> {
        let active_is_scratch = self
            .scratch
            .borrow()
            .as_ref()
            .is_some_and(|scratch| Some(scratch.pane) == self.focused.get());
        if active_is_scratch {
            self.close_scratch();
        }
        Ok(())
    }

    fn notify(&self, message: &str) {
        *self.message.borrow_mut() = Some(message.to_string());
    }
}

impl KeyCapture for TerminalHost {
    type Registration = CaptureToken;

    fn acquire(&self) -> CaptureToken {
        self.capturing.set(true);
        CaptureToken(())
    }

    fn release(&self, _registration: CaptureToken) {
        self.capturing.set(false);
    }
}

/// leave and re-enter full-screen mode around the external editor
trait Suspend {
    fn suspend(&self) -> Result<()>;
    fn resume(&self) -> Result<()>;
}

/// raw mode, alternate screen and focus reporting, restored on drop
struct Screen;

impl Screen {
    fn enter() -> Result<Self> {
        let screen = Self;
        screen.resume()?;
        Ok(screen)
    }
}

impl Suspend for Screen {
    fn resume(&self) -> Result<()> {
        enable_raw_mode().context("this command requires an interactive terminal")?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableFocusChange,
            cursor::Hide
        )?;
        Ok(())
    }

    fn suspend(&self) -> Result<()> {
        execute!(
            io::stdout(),
            DisableFocusChange,
            cursor::Show,
            LeaveAlternateScreen
        )?;
        disable_raw_mode()?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if let Err(e) = self.suspend() {
            warn!("failed to restore terminal: {:#}", e);
        }
    }
}

/// a plain or shifted character, modified keys never reach the shortcuts
fn shortcut_char(code: KeyCode, modifiers: KeyModifiers) -> Option<char> {
    match code {
        KeyCode::Char(key) if modifiers.difference(KeyModifiers::SHIFT).is_empty() => Some(key),
        _ => None,
    }
}

/// run the status view until the user quits
pub fn run<V: Vcs + Sync>(
    host: &Rc<TerminalHost>,
    provider: &StatusContentProvider<V>,
    controller: &mut ViewController<TerminalHost, V>,
) -> Result<()> {
    let subscription = {
        let host = Rc::clone(host);
        provider.subscribe(move |_| host.mark_dirty())
    };

    let screen = Screen::enter()?;
    controller.open_view()?;

    loop {
        if let Some(document) = host.take_edit_request() {
            edit_document(host, &screen, controller, &document)?;
            continue;
        }

        if host.take_dirty() {
            reload(host, provider);
        }
        draw(host)?;

        match event::read()? {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Esc => break,
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Up => host.move_cursor(|cursor, _| cursor.saturating_sub(1)),
                KeyCode::Down => host.move_cursor(|cursor, _| cursor + 1),
                KeyCode::PageUp => host.move_cursor(|cursor, _| cursor.saturating_sub(PAGE_LINES)),
                KeyCode::PageDown => host.move_cursor(|cursor, _| cursor + PAGE_LINES),
                KeyCode::Home => host.move_cursor(|_, _| 0),
                KeyCode::End => host.move_cursor(|_, last| last),
                _ => {
                    if let Some(key) = shortcut_char(code, modifiers)
                        && host.is_capturing()
                    {
                        // a new keystroke replaces the last message
                        host.message.borrow_mut().take();
                        if let Err(e) = controller.on_keypress(key) {
                            warn!("{:#}", e);
                            host.notify(&format!("{e:#}"));
                        }
                    }
                }
            },
            Event::FocusGained => {
                host.set_focus(Some(STATUS_PANE));
                controller.on_focus_changed(host.focused_pane());
            }
            Event::FocusLost => {
                host.set_focus(None);
                controller.on_focus_changed(None);
            }
            _ => {}
        }
    }

    debug!(status = ?controller.status(), "leaving status view");
    controller.close_view();
    subscription.dispose();
    drop(screen);
    Ok(())
}

/// hand the scratch document to the external editor, a changed file counts as a save
fn edit_document<S: Suspend, V: Vcs + Sync>(
    host: &TerminalHost,
    screen: &S,
    controller: &mut ViewController<TerminalHost, V>,
    document: &ScratchDocument,
) -> Result<()> {
    controller.on_focus_changed(host.focused_pane());

    match &host.editor {
        Some(editor) => {
            screen.suspend()?;
            let edited = ui::edit_file(editor, &document.path);
            screen.resume()?;

            match edited.and_then(|()| saved_text(document)) {
                Ok(Some(text)) => {
                    if let Err(e) = controller.on_document_saved(document.id, &text) {
                        warn!("{:#}", e);
                        host.notify(&format!("{e:#}"));
                    }
                }
                Ok(None) if controller.has_pending_commit() => {
                    host.notify("commit message not saved, nothing committed");
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{:#}", e);
                    host.notify(&format!("{e:#}"));
                }
            }
        }
        None => host.notify("no editor configured, set EDITOR or pass --editor"),
    }

    // the editor has exited, so the document is closed whatever happened
    if host.is_document_open(document.id) {
        host.close_scratch();
        controller.on_document_closed(document.id);
    }
    controller.on_focus_changed(host.focused_pane());
    Ok(())
}

fn saved_text(document: &ScratchDocument) -> Result<Option<String>> {
    let text = fs::read_to_string(&document.path)
        .with_context(|| format!("failed to read {}", document.path.display()))?;
    if text == document.initial {
        debug!("commit message unchanged");
        return Ok(None);
    }
    Ok(Some(text))
}

fn reload<V: Vcs>(host: &TerminalHost, provider: &StatusContentProvider<V>) {
    let Some(uri) = host.status_uri() else {
        return;
    };
    match provider.provide_content(&uri) {
        Ok(text) => host.set_status_text(&text),
        Err(e) => {
            warn!("{}", e);
            host.notify(&e.to_string());
        }
    }
}

fn draw(host: &TerminalHost) -> Result<()> {
    let (width, height) = terminal::size()?;
    let width = usize::from(width);
    let rows = usize::from(height.saturating_sub(1));

    let mut out = io::stdout().lock();
    queue!(out, Clear(ClearType::All))?;

    if let Some(pane) = host.status.borrow_mut().as_mut() {
        // keep the cursor line on screen
        if pane.cursor < pane.scroll {
            pane.scroll = pane.cursor;
        } else if rows > 0 && pane.cursor >= pane.scroll + rows {
            pane.scroll = pane.cursor + 1 - rows;
        }

        for (row, (number, line)) in pane
            .lines
            .iter()
            .enumerate()
            .skip(pane.scroll)
            .take(rows)
            .enumerate()
        {
            let text = if pane.line_numbers {
                format!("{:>4} {line}", number + 1)
            } else {
                line.clone()
            };
            let text = fit(&text, width);
            let styled = if number == pane.cursor {
                text.reversed().to_string()
            } else if line.starts_with("error:") {
                text.red().to_string()
            } else if line.ends_with(':') && !line.starts_with(' ') {
                text.bold().to_string()
            } else {
                text
            };
            let row = u16::try_from(row)?;
            queue!(out, cursor::MoveTo(0, row), Print(styled))?;
        }
    }

    let footer = match host.message.borrow().as_deref() {
        Some(message) => fit(message, width).yellow().to_string(),
        None => fit(HINT, width).dimmed().to_string(),
    };
    queue!(out, cursor::MoveTo(0, height.saturating_sub(1)), Print(footer))?;
    out.flush()?;
    Ok(())
}

/// truncate or pad `text` to exactly `width` characters
fn fit(text: &str, width: usize) -> String {
    let mut fitted: String = text.chars().take(width).collect();
    let len = fitted.chars().count();
    fitted.extend(std::iter::repeat_n(' ', width - len));
    fitted
}
