//! Login/logout and the advisory role rules.
//!
//! Nothing here is a security boundary: the name and role are whatever the
//! caller says they are. The role only decides which views and actions the
//! core will go along with; a mismatched call is rejected without touching
//! any state.

use crate::error::{GradebookError, Result};
use crate::gradebook::Gradebook;
use crate::model::{Role, User};
use crate::store::EntityStore;
use crate::view::View;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

pub fn role_allows_view(role: Role, view: View) -> bool {
    match role {
        Role::Teacher => true,
        Role::Student => matches!(view, View::Overview | View::Subjects | View::Grades),
    }
}

pub fn require_teacher(role: Role, action: &str) -> Result<()> {
    if role == Role::Teacher {
        return Ok(());
    }
    warn!(%role, action, "rejected teacher-only action");
    Err(GradebookError::RoleDenied {
        role: role.to_string(),
        action: action.to_string(),
    })
}

/// How new sessions are set up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Start each login from the demo data set instead of an empty store.
    pub seed: bool,
    /// Fixed calendar date for form defaults; the local date when `None`.
    pub today: Option<NaiveDate>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seed: true,
            today: None,
        }
    }
}

impl SessionSettings {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn fresh_store(&self) -> EntityStore {
        if self.seed {
            EntityStore::seeded()
        } else {
            EntityStore::empty()
        }
    }
}

/// Either logged out, or one principal with its own store and view state.
#[derive(Debug, Default)]
pub struct SessionGate {
    settings: SessionSettings,
    active: Option<Gradebook>,
}

impl SessionGate {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            active: None,
        }
    }

    /// Any non-empty name is accepted. A previous session is discarded.
    pub fn login(&mut self, name: &str, role: Role) -> Result<&User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GradebookError::missing("name"));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
        };
        info!(user_id = %user.id, %role, "login");
        let book = self
            .active
            .insert(Gradebook::new(user, self.settings.fresh_store(), self.settings));
        Ok(book.user())
    }

    pub fn logout(&mut self) -> Option<User> {
        let book = self.active.take()?;
        info!(user_id = %book.user().id, "logout");
        Some(book.into_user())
    }

    pub fn user(&self) -> Option<&User> {
        self.active.as_ref().map(Gradebook::user)
    }

    pub fn current(&self) -> Result<&Gradebook> {
        self.active.as_ref().ok_or(GradebookError::NotLoggedIn)
    }

    pub fn current_mut(&mut self) -> Result<&mut Gradebook> {
        self.active.as_mut().ok_or(GradebookError::NotLoggedIn)
    }
}
