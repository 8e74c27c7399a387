use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use crate::backend::ResumeBackend;
use crate::config::Config;
use crate::screening::session::ScreeningSession;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable backend client. Default: HttpBackend; tests use a stub.
    pub backend: Arc<dyn ResumeBackend>,
    /// Page-lifetime screening state: both batches, criteria, staged files.
    pub session: Arc<RwLock<ScreeningSession>>,
    pub in_flight: InFlight,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn ResumeBackend>) -> Self {
        Self {
            config,
            backend,
            session: Arc::new(RwLock::new(ScreeningSession::new())),
            in_flight: InFlight::default(),
        }
    }
}

/// Remote actions that may each have one request outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Process,
    ExportCsv,
    ExportFilteredCsv,
    Shortlist,
    GenerateJd,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Process => "resume processing",
            Action::ExportCsv => "CSV export",
            Action::ExportFilteredCsv => "filtered CSV export",
            Action::Shortlist => "shortlisting",
            Action::GenerateJd => "JD generation",
        }
    }
}

/// Tracks which actions have a backend request outstanding.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<Action>>>,
}

impl InFlight {
    /// Marks `action` busy. Returns `None` when it already is; the returned
    /// permit clears the mark when dropped, whatever the outcome.
    pub fn try_begin(&self, action: Action) -> Option<InFlightPermit> {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if !active.insert(action) {
            return None;
        }
        Some(InFlightPermit {
            action,
            active: Arc::clone(&self.active),
        })
    }

    #[cfg(test)]
    pub fn is_busy(&self, action: Action) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&action)
    }
}

#[derive(Debug)]
pub struct InFlightPermit {
    action: Action,
    active: Arc<Mutex<HashSet<Action>>>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.action);
    }
}
