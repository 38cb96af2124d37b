//! crates/flashcards_core/src/validation.rs
//!
//! Input rules applied at the boundary before anything reaches an engine.

use crate::domain::{
    FlashcardPatch, FlashcardQuery, FlashcardSource, GenerationId, NewFlashcard, PageRequest,
};
use crate::error::{CoreError, CoreResult};
use regex::Regex;
use std::sync::OnceLock;

pub const SOURCE_TEXT_MIN_CHARS: usize = 1000;
pub const SOURCE_TEXT_MAX_CHARS: usize = 10_000;
pub const FRONT_MAX_CHARS: usize = 200;
pub const BACK_MAX_CHARS: usize = 500;
pub const MAX_BATCH_SIZE: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 72;

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::Validation(message.into())
}

pub fn validate_source_text(text: &str) -> CoreResult<()> {
    let len = text.chars().count();
    if len < SOURCE_TEXT_MIN_CHARS {
        return Err(invalid(format!(
            "Text must be at least {} characters long",
            SOURCE_TEXT_MIN_CHARS
        )));
    }
    if len > SOURCE_TEXT_MAX_CHARS {
        return Err(invalid(format!(
            "Text must not exceed {} characters",
            SOURCE_TEXT_MAX_CHARS
        )));
    }
    Ok(())
}

/// Trims `value` and checks it is non-empty and at most `max` characters.
fn card_text(field: &str, value: &str, max: usize) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max {
        return Err(invalid(format!("{} must be at most {} characters", field, max)));
    }
    Ok(trimmed.to_string())
}

fn positive_id(id: GenerationId) -> CoreResult<GenerationId> {
    if id <= 0 {
        return Err(invalid("generation_id must be a positive integer"));
    }
    Ok(id)
}

/// Manual cards never link to a generation; AI cards always do.
pub fn check_source_link(
    source: FlashcardSource,
    generation_id: Option<GenerationId>,
) -> CoreResult<()> {
    match (source.requires_generation(), generation_id) {
        (false, Some(_)) => Err(invalid("manual flashcards must not reference a generation")),
        (true, None) => Err(invalid(format!(
            "{} flashcards must reference a generation",
            source
        ))),
        _ => Ok(()),
    }
}

pub fn validate_new_flashcard(card: &NewFlashcard) -> CoreResult<NewFlashcard> {
    let front = card_text("front", &card.front, FRONT_MAX_CHARS)?;
    let back = card_text("back", &card.back, BACK_MAX_CHARS)?;
    let generation_id = card.generation_id.map(positive_id).transpose()?;
    check_source_link(card.source, generation_id)?;
    Ok(NewFlashcard {
        front,
        back,
        source: card.source,
        generation_id,
    })
}

/// Validates every item; a single bad item rejects the whole batch.
pub fn validate_batch(cards: &[NewFlashcard]) -> CoreResult<Vec<NewFlashcard>> {
    if cards.is_empty() {
        return Err(invalid("at least one flashcard is required"));
    }
    if cards.len() > MAX_BATCH_SIZE {
        return Err(invalid(format!(
            "at most {} flashcards can be created at once",
            MAX_BATCH_SIZE
        )));
    }
    cards
        .iter()
        .enumerate()
        .map(|(i, card)| {
            validate_new_flashcard(card).map_err(|e| match e {
                CoreError::Validation(msg) => invalid(format!("flashcards[{}]: {}", i, msg)),
                other => other,
            })
        })
        .collect()
}

pub fn validate_patch(patch: &FlashcardPatch) -> CoreResult<FlashcardPatch> {
    if patch.is_empty() {
        return Err(invalid("At least one field must be provided"));
    }
    Ok(FlashcardPatch {
        front: patch
            .front
            .as_deref()
            .map(|v| card_text("front", v, FRONT_MAX_CHARS))
            .transpose()?,
        back: patch
            .back
            .as_deref()
            .map(|v| card_text("back", v, BACK_MAX_CHARS))
            .transpose()?,
        source: patch.source,
        generation_id: match patch.generation_id {
            Some(Some(id)) => Some(Some(positive_id(id)?)),
            other => other,
        },
    })
}

pub fn validate_page_request(page: Option<i64>, limit: Option<i64>) -> CoreResult<PageRequest> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(i64::from(PageRequest::DEFAULT_LIMIT));
    if page < 1 || page > i64::from(u32::MAX) {
        return Err(invalid("page must be at least 1"));
    }
    if limit < 1 || limit > i64::from(PageRequest::MAX_LIMIT) {
        return Err(invalid(format!(
            "limit must be between 1 and {}",
            PageRequest::MAX_LIMIT
        )));
    }
    Ok(PageRequest {
        page: page as u32,
        limit: limit as u32,
    })
}

/// Raw listing parameters as they arrive from the query string.
#[derive(Debug, Clone, Default)]
pub struct FlashcardQueryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub source: Option<String>,
    pub generation_id: Option<i64>,
}

impl FlashcardQueryParams {
    pub fn validate(&self) -> CoreResult<FlashcardQuery> {
        let window = validate_page_request(self.page, self.limit)?;
        let sort = self
            .sort
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(invalid)?
            .unwrap_or_default();
        let order = self
            .order
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(invalid)?
            .unwrap_or_default();
        let source = self
            .source
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(invalid)?;
        let generation_id = self.generation_id.map(positive_id).transpose()?;
        Ok(FlashcardQuery {
            window,
            sort,
            order,
            source,
            generation_id,
        })
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

pub fn validate_email(email: &str) -> CoreResult<()> {
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(invalid("Email is too long"));
    }
    if !email_regex().is_match(email) {
        return Err(invalid("Invalid email format"));
    }
    Ok(())
}

/// Rules for choosing a new password at registration.
pub fn validate_new_password(password: &str) -> CoreResult<()> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_CHARS {
        return Err(invalid(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_CHARS
        )));
    }
    if len > PASSWORD_MAX_CHARS {
        return Err(invalid("Password is too long"));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("Password must contain at least one letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("Password must contain at least one digit"));
    }
    Ok(())
}
