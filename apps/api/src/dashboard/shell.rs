//! The student dashboard workspace: four tabs sharing one session and one
//! notification list.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{IdentityProvider, Session};
use crate::dashboard::settings::{SettingChange, Settings};
use crate::errors::AppError;
use crate::models::notification::Notification;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Home,
    Profile,
    Settings,
    Alerts,
}

// Tab-bar indexing is driven by the client.
#[allow(dead_code)]
impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Home, Tab::Profile, Tab::Settings, Tab::Alerts];

    pub fn index(&self) -> usize {
        match self {
            Tab::Home => 0,
            Tab::Profile => 1,
            Tab::Settings => 2,
            Tab::Alerts => 3,
        }
    }

    pub fn at(index: usize) -> Option<Tab> {
        Self::ALL.get(index).copied()
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    Narrow,
    Wide,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogoutStep {
    #[default]
    Idle,
    #[allow(dead_code)]
    Confirming,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
}

#[allow(dead_code)]
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("logout was not requested")]
    LogoutNotRequested,

    #[error("dashboard session has ended")]
    SignedOut,

    #[error("sign-out failed: {0}")]
    SignOut(AppError),
}

/// Serializable view of the shell, returned by the dashboard endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub selected_tab: Tab,
    pub drawer_open: bool,
    pub settings: Settings,
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub logout: LogoutStep,
}

#[derive(Debug, Clone)]
pub struct DashboardShell {
    session: Option<Session>,
    selected_tab: Tab,
    drawer_open: bool,
    settings: Settings,
    notifications: Vec<Notification>,
    logout: LogoutStep,
}

impl DashboardShell {
    pub fn new(session: Session) -> Self {
        Self {
            session: Some(session),
            selected_tab: Tab::Home,
            drawer_open: false,
            settings: Settings::default(),
            notifications: Vec::new(),
            logout: LogoutStep::Idle,
        }
    }

    /// Loads the notification list once. A failed fetch is logged and leaves
    /// the list empty; there is no retry.
    pub async fn mount(&mut self, store: &dyn Store) {
        let Some(session) = &self.session else {
            return;
        };
        match store.list_notifications(session.profile_id).await {
            Ok(list) => self.notifications = list,
            Err(e) => {
                warn!(
                    "Could not load notifications for {}: {e}",
                    session.profile_id
                );
                self.notifications.clear();
            }
        }
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            selected_tab: self.selected_tab,
            drawer_open: self.drawer_open,
            settings: self.settings.clone(),
            notifications: self.notifications.clone(),
            unread_count: self.unread_count(),
            logout: self.logout,
        }
    }
}

// Tab, drawer, settings, alerts and logout interactions are driven by the
// client; the HTTP layer serves the mounted snapshot.
#[allow(dead_code)]
impl DashboardShell {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn selected_tab(&self) -> Tab {
        self.selected_tab
    }

    pub fn drawer_open(&self) -> bool {
        self.drawer_open
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn logout_step(&self) -> LogoutStep {
        self.logout
    }

    /// On narrow viewports the navigation drawer closes after a selection.
    pub fn select_tab(&mut self, tab: Tab, viewport: Viewport) {
        self.selected_tab = tab;
        if viewport == Viewport::Narrow {
            self.drawer_open = false;
        }
    }

    pub fn toggle_drawer(&mut self) {
        self.drawer_open = !self.drawer_open;
    }

    pub fn change_setting(&mut self, change: SettingChange) {
        self.settings.apply(change);
    }

    /// Returns `false` if no notification has that id.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn delete_notification(&mut self, id: Uuid) -> Option<Notification> {
        let index = self.notifications.iter().position(|n| n.id == id)?;
        Some(self.notifications.remove(index))
    }

    pub fn request_logout(&mut self) {
        self.logout = LogoutStep::Confirming;
    }

    pub fn cancel_logout(&mut self) {
        self.logout = LogoutStep::Idle;
    }

    /// Second logout step: signs out, clears local state and tells the caller
    /// where to navigate. On failure the shell is left exactly as it was.
    pub async fn confirm_logout(
        &mut self,
        identity: &dyn IdentityProvider,
    ) -> Result<Route, DashboardError> {
        if self.logout != LogoutStep::Confirming {
            return Err(DashboardError::LogoutNotRequested);
        }
        let session = self.session.as_ref().ok_or(DashboardError::SignedOut)?;

        identity
            .sign_out(&session.access_token)
            .await
            .map_err(|e| DashboardError::SignOut(e.into()))?;

        info!("Dashboard logout for {}", session.profile_id);
        self.session = None;
        self.notifications.clear();
        self.settings = Settings::default();
        self.selected_tab = Tab::Home;
        self.drawer_open = false;
        self.logout = LogoutStep::Idle;
        Ok(Route::Login)
    }
}
