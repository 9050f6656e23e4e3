//! Navigation guard for group-scoped routes.
//!
//! In-memory session state does not survive a restart, so every navigation
//! into `/group/<name>` passes through [`RestorationGuard::check`], which
//! either confirms the session already matches or tries to restore it from
//! the saved credentials.

use std::sync::{Arc, Mutex, PoisonError};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::{debug, info};

use super::SessionContext;

const GROUP_PREFIX: &str = "/group/";

/// Characters escaped when a group name is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Group { name: String },
    Other(String),
}

impl Route {
    /// Parse an application path. Query strings, fragments and trailing
    /// slashes are ignored; the group segment is percent-decoded.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Route::Home;
        }
        match trimmed.strip_prefix(GROUP_PREFIX) {
            Some(segment) if !segment.is_empty() && !segment.contains('/') => Route::Group {
                name: percent_decode_str(segment).decode_utf8_lossy().into_owned(),
            },
            _ => Route::Other(path.to_string()),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Route::Group { name: name.into() }
    }

    /// Name of the group this route requires, if any
    pub fn group_name(&self) -> Option<&str> {
        match self {
            Route::Group { name } => Some(name),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Group { name } => {
                format!("{}{}", GROUP_PREFIX, utf8_percent_encode(name, SEGMENT))
            }
            Route::Other(path) => path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardState {
    #[default]
    Unresolved,
    Restoring,
    Resolved,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
}

/// Decides whether a group route may be entered. Clones share state.
#[derive(Clone)]
pub struct RestorationGuard {
    session: SessionContext,
    state: Arc<Mutex<GuardState>>,
}

impl RestorationGuard {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            state: Arc::new(Mutex::new(GuardState::default())),
        }
    }

    /// State reached by the most recent guarded navigation
    pub fn state(&self) -> GuardState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: GuardState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub async fn check(&self, route: &Route) -> Navigation {
        let Some(target) = route.group_name() else {
            return Navigation::Proceed;
        };
        self.transition(GuardState::Unresolved);

        if self.session.state().group_name() == Some(target) {
            debug!(name = target, "Session already on target group");
            self.transition(GuardState::Resolved);
            return Navigation::Proceed;
        }

        self.transition(GuardState::Restoring);
        let restored = self.session.restore_from_storage().await;

        if restored && self.session.state().group_name() == Some(target) {
            info!(name = target, "Group route resolved from saved credentials");
            self.transition(GuardState::Resolved);
            Navigation::Proceed
        } else {
            info!(name = target, restored, "Group route denied, redirecting home");
            self.transition(GuardState::Denied);
            Navigation::Redirect(Route::Home)
        }
    }
}
