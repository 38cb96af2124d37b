pub mod db;
pub mod flashcards_llm;
pub mod identity;

pub use db::DbAdapter;
pub use flashcards_llm::OpenAiFlashcardsAdapter;
pub use identity::PasswordIdentityAdapter;
