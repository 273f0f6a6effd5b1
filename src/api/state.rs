use std::sync::Arc;

use crate::api::cookies::CookieSettings;
use crate::application::MergeOrchestrator;
use crate::infrastructure::{MergeBackend, NoteRepository, SessionDirectory};

// =============================================================================
// AppState
// =============================================================================

/// Dependencies shared by every handler.
pub struct AppState<Store, Sessions>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    pub store: Store,

    pub orchestrator: MergeOrchestrator<Store>,

    pub sessions: Arc<Sessions>,

    pub cookies: Arc<CookieSettings>,
}

impl<Store, Sessions> AppState<Store, Sessions>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    #[must_use]
    pub fn new(store: Store, sessions: Sessions, cookies: CookieSettings) -> Self {
        Self {
            orchestrator: MergeOrchestrator::new(store.clone()),
            store,
            sessions: Arc::new(sessions),
            cookies: Arc::new(cookies),
        }
    }
}

impl<Store, Sessions> Clone for AppState<Store, Sessions>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            orchestrator: self.orchestrator.clone(),
            sessions: Arc::clone(&self.sessions),
            cookies: Arc::clone(&self.cookies),
        }
    }
}
