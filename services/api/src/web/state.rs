//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every handler.

use crate::config::Config;
use flashcards_core::ports::IdentityService;
use flashcards_core::{CurationEngine, GenerationEngine};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityService>,
    pub generations: Arc<GenerationEngine>,
    pub curation: Arc<CurationEngine>,
}
