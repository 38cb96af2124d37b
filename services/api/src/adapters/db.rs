//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashcards_core::domain::{
    Flashcard, FlashcardChanges, FlashcardId, FlashcardQuery, FlashcardSource, Generation,
    GenerationId, NewFlashcard, NewGeneration, NewGenerationErrorLog, Page, PageRequest, User,
    UserCredentials,
};
use flashcards_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const FLASHCARD_COLUMNS: &str =
    "id, user_id, front, back, source, generation_id, created_at, updated_at";

const GENERATION_COLUMNS: &str = "id, user_id, model, generated_count, accepted_unedited_count, \
     accepted_edited_count, source_text_hash, source_text_length, generation_duration, \
     created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Keeps the Postgres SQLSTATE code so callers can log it.
fn storage_error(e: sqlx::Error) -> PortError {
    match e.as_database_error() {
        Some(db_err) => PortError::Storage {
            code: db_err
                .code()
                .map(|c| c.into_owned())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            message: db_err.message().to_string(),
        },
        None => PortError::Storage {
            code: "UNKNOWN".to_string(),
            message: e.to_string(),
        },
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct GenerationRecord {
    id: i64,
    user_id: Uuid,
    model: String,
    generated_count: i32,
    accepted_unedited_count: Option<i32>,
    accepted_edited_count: Option<i32>,
    source_text_hash: String,
    source_text_length: i32,
    generation_duration: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl GenerationRecord {
    fn to_domain(self) -> Generation {
        Generation {
            id: self.id,
            user_id: self.user_id,
            model: self.model,
            generated_count: self.generated_count,
            accepted_unedited_count: self.accepted_unedited_count,
            accepted_edited_count: self.accepted_edited_count,
            source_text_hash: self.source_text_hash,
            source_text_length: self.source_text_length,
            generation_duration: self.generation_duration,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct FlashcardRecord {
    id: i64,
    user_id: Uuid,
    front: String,
    back: String,
    source: String,
    generation_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl FlashcardRecord {
    fn to_domain(self) -> PortResult<Flashcard> {
        let source: FlashcardSource = self.source.parse().map_err(PortError::Unexpected)?;
        Ok(Flashcard {
            id: self.id,
            user_id: self.user_id,
            front: self.front,
            back: self.back,
            source,
            generation_id: self.generation_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn flashcards_to_domain(records: Vec<FlashcardRecord>) -> PortResult<Vec<Flashcard>> {
    records.into_iter().map(|r| r.to_domain()).collect()
}

/// Appends the owner and optional filters of a flashcard listing.
fn push_flashcard_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    user_id: Uuid,
    query: &FlashcardQuery,
) {
    builder.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(source) = query.source {
        builder.push(" AND source = ").push_bind(source.as_str());
    }
    if let Some(generation_id) = query.generation_id {
        builder.push(" AND generation_id = ").push_bind(generation_id);
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .and_then(|d| d.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION);
            if duplicate {
                PortError::Conflict(format!("{} is already registered", email))
            } else {
                storage_error(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => storage_error(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn insert_generation(&self, generation: NewGeneration) -> PortResult<Generation> {
        let sql = format!(
            "INSERT INTO generations (user_id, model, generated_count, source_text_hash, source_text_length, generation_duration) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            GENERATION_COLUMNS
        );
        let record = sqlx::query_as::<_, GenerationRecord>(&sql)
            .bind(generation.user_id)
            .bind(&generation.model)
            .bind(generation.generated_count)
            .bind(&generation.source_text_hash)
            .bind(generation.source_text_length)
            .bind(generation.generation_duration)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(record.to_domain())
    }

    async fn list_accepted_generations(
        &self,
        user_id: Uuid,
        window: PageRequest,
    ) -> PortResult<Page<Generation>> {
        const ACCEPTED: &str = "user_id = $1 \
             AND COALESCE(accepted_unedited_count, 0) + COALESCE(accepted_edited_count, 0) > 0";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM generations WHERE {}",
            ACCEPTED
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        let records = sqlx::query_as::<_, GenerationRecord>(&format!(
            "SELECT {} FROM generations WHERE {} ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            GENERATION_COLUMNS, ACCEPTED
        ))
        .bind(user_id)
        .bind(i64::from(window.limit))
        .bind(window.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(Page {
            items: records.into_iter().map(|r| r.to_domain()).collect(),
            total: total as u64,
        })
    }

    async fn get_generation(
        &self,
        user_id: Uuid,
        generation_id: GenerationId,
    ) -> PortResult<Option<Generation>> {
        let record = sqlx::query_as::<_, GenerationRecord>(&format!(
            "SELECT {} FROM generations WHERE id = $1 AND user_id = $2",
            GENERATION_COLUMNS
        ))
        .bind(generation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn existing_generation_ids(
        &self,
        user_id: Uuid,
        ids: &[GenerationId],
    ) -> PortResult<Vec<GenerationId>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM generations WHERE user_id = $1 AND id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn increment_acceptance_counts(
        &self,
        generation_id: GenerationId,
        unedited: i32,
        edited: i32,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE generations SET \
                accepted_unedited_count = COALESCE(accepted_unedited_count, 0) + $2, \
                accepted_edited_count = COALESCE(accepted_edited_count, 0) + $3, \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(generation_id)
        .bind(unedited)
        .bind(edited)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Generation {} not found",
                generation_id
            )));
        }
        Ok(())
    }

    async fn insert_generation_error_log(&self, entry: NewGenerationErrorLog) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO generation_error_logs (user_id, error_code, error_message, model, source_text_hash, source_text_length) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.user_id)
        .bind(&entry.error_code)
        .bind(&entry.error_message)
        .bind(&entry.model)
        .bind(&entry.source_text_hash)
        .bind(entry.source_text_length)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn insert_flashcards(
        &self,
        user_id: Uuid,
        flashcards: &[NewFlashcard],
    ) -> PortResult<Vec<Flashcard>> {
        if flashcards.is_empty() {
            return Ok(Vec::new());
        }

        // A single multi-row INSERT: either every row lands or none does.
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO flashcards (user_id, front, back, source, generation_id) ");
        builder.push_values(flashcards, |mut row, card| {
            row.push_bind(user_id)
                .push_bind(card.front.clone())
                .push_bind(card.back.clone())
                .push_bind(card.source.as_str())
                .push_bind(card.generation_id);
        });
        builder.push(" RETURNING ").push(FLASHCARD_COLUMNS);

        let records = builder
            .build_query_as::<FlashcardRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        flashcards_to_domain(records)
    }

    async fn list_flashcards(
        &self,
        user_id: Uuid,
        query: &FlashcardQuery,
    ) -> PortResult<Page<Flashcard>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM flashcards");
        push_flashcard_filters(&mut count, user_id, query);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(FLASHCARD_COLUMNS).push(" FROM flashcards");
        push_flashcard_filters(&mut select, user_id, query);
        // Sort column and direction come from closed enums, never from raw input.
        select
            .push(format!(
                " ORDER BY {} {}, id {}",
                query.sort.column(),
                query.order.keyword(),
                query.order.keyword()
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(query.window.limit))
            .push(" OFFSET ")
            .push_bind(query.window.offset() as i64);

        let records = select
            .build_query_as::<FlashcardRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(Page {
            items: flashcards_to_domain(records)?,
            total: total as u64,
        })
    }

    async fn list_generation_flashcards(
        &self,
        user_id: Uuid,
        generation_id: GenerationId,
    ) -> PortResult<Vec<Flashcard>> {
        let records = sqlx::query_as::<_, FlashcardRecord>(&format!(
            "SELECT {} FROM flashcards WHERE user_id = $1 AND generation_id = $2 ORDER BY created_at ASC, id ASC",
            FLASHCARD_COLUMNS
        ))
        .bind(user_id)
        .bind(generation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        flashcards_to_domain(records)
    }

    async fn get_flashcard(
        &self,
        user_id: Uuid,
        id: FlashcardId,
    ) -> PortResult<Option<Flashcard>> {
        let record = sqlx::query_as::<_, FlashcardRecord>(&format!(
            "SELECT {} FROM flashcards WHERE id = $1 AND user_id = $2",
            FLASHCARD_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn update_flashcard(
        &self,
        user_id: Uuid,
        id: FlashcardId,
        changes: &FlashcardChanges,
    ) -> PortResult<Option<Flashcard>> {
        let record = sqlx::query_as::<_, FlashcardRecord>(&format!(
            "UPDATE flashcards SET front = $3, back = $4, source = $5, generation_id = $6, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            FLASHCARD_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(&changes.front)
        .bind(&changes.back)
        .bind(changes.source.as_str())
        .bind(changes.generation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn delete_flashcard(&self, user_id: Uuid, id: FlashcardId) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected() > 0)
    }
}
