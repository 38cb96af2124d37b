pub mod curation;
pub mod domain;
pub mod error;
pub mod generation;
pub mod pagination;
pub mod ports;
pub mod study;
pub mod validation;

pub use curation::CurationEngine;
pub use domain::{
    AuthSession, Flashcard, FlashcardChanges, FlashcardId, FlashcardPatch, FlashcardQuery,
    FlashcardSource, Generation, GenerationDetail, GenerationId, GenerationOutcome,
    NewFlashcard, NewGeneration, NewGenerationErrorLog, Page, PageRequest, Proposal, SortField,
    SortOrder, User, UserCredentials,
};
pub use error::{CoreError, CoreResult};
pub use generation::GenerationEngine;
pub use ports::{
    CompletionRequest, CompletionService, DatabaseService, IdentityService, PortError,
    PortResult, ProviderError,
};
pub use study::{StudyEvent, StudyPhase, StudySession};
