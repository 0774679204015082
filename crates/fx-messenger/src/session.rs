//! Per-user pagination state

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::paging;

/// Where a user is in the currency list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// The user never asked for rates
    #[default]
    NoSession,
    /// 1-based page currently shown to the user
    Paginated(usize),
}

impl PageState {
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::NoSession => None,
            Self::Paginated(page) => Some(*page),
        }
    }
}

/// In-memory page store keyed by PSID (page-scoped user ID).
///
/// Entries are never removed; every update is a single read-modify-write
/// under the write lock.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, PageState>>>,
}

impl InMemorySessionStore {
    /// Create a new session store
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, psid: &str) -> PageState {
        let sessions = self.sessions.read().await;
        sessions.get(psid).copied().unwrap_or_default()
    }

    /// Go back to the first page
    pub async fn reset(&self, psid: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(psid.to_string(), PageState::Paginated(1));
    }

    /// Move to the next page of a list with `total` entries, wrapping to
    /// page 1 after the last one. Returns the new page.
    pub async fn advance(&self, psid: &str, total: usize) -> usize {
        let mut sessions = self.sessions.write().await;
        let state = sessions.entry(psid.to_string()).or_default();
        let page = paging::next_page(*state, total);
        *state = PageState::Paginated(page);
        page
    }

    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
