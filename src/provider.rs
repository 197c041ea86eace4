use crate::constants::{NO_FOLDER_OPEN, SCHEME, SHORTCUT_HELP, STATUS_PATH};
use crate::context::Workspace;
use crate::git::Vcs;
use crate::snapshot::StatusSnapshot;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("unrecognized URI: {0}")]
    UnrecognizedUri(String),
}

/// the URI of the status view document
pub fn status_uri() -> String {
    format!("{SCHEME}:{STATUS_PATH}")
}

type Listener = Rc<dyn Fn(&str)>;

/// listener slots, disposal nulls a slot so positions never shift
#[derive(Default)]
struct Listeners {
    slots: Vec<Option<Listener>>,
}

/// handle for one change listener, disposing (or dropping) it removes only that listener
#[must_use = "dropping a subscription unsubscribes the listener"]
pub struct Subscription {
    slot: usize,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            // release the borrow before the listener itself is dropped
            let removed = listeners
                .borrow_mut()
                .slots
                .get_mut(self.slot)
                .and_then(Option::take);
            drop(removed);
        }
    }
}

/// renders the status view document on demand
pub struct StatusContentProvider<V> {
    vcs: Rc<V>,
    workspace: Workspace,
    listeners: Rc<RefCell<Listeners>>,
}

impl<V: Vcs> StatusContentProvider<V> {
    pub fn new(vcs: Rc<V>, workspace: Workspace) -> Self {
        Self {
            vcs,
            workspace,
            listeners: Rc::default(),
        }
    }

    /// content for `uri`: the status section followed by the shortcut help
    ///
    /// status query failures are rendered inline so the view still shows
    pub fn provide_content(&self, uri: &str) -> Result<String, ProviderError> {
        if uri != status_uri() {
            return Err(ProviderError::UnrecognizedUri(uri.to_string()));
        }
        if self.workspace.root().is_none() {
            return Ok(NO_FOLDER_OPEN.to_string());
        }

        let status = match self.vcs.status() {
            Ok(entries) => StatusSnapshot::from_entries(&entries).render(),
            Err(e) => {
                warn!("git status failed: {:#}", e);
                format!("error: {e:#}\n")
            }
        };

        Ok(format!("{status}\n{SHORTCUT_HELP}"))
    }

    /// register a listener called with the URI of the changed document
    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        listeners.slots.push(Some(Rc::new(listener)));
        Subscription {
            slot: listeners.slots.len() - 1,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// tell every active listener the status view changed
    ///
    /// content is not recomputed here, only on the next `provide_content`
    pub fn request_refresh(&self) {
        let uri = status_uri();
        let count = self.listeners.borrow().slots.len();
        debug!(listeners = count, "status refresh requested");

        for slot in 0..count {
            // re-read each slot, a listener may dispose another mid-notification
            let listener = self.listeners.borrow().slots.get(slot).cloned().flatten();
            if let Some(listener) = listener {
                listener(&uri);
            }
        }
    }
}
