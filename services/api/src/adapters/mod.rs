pub mod creem;
pub mod db;
pub mod retry;
pub mod vocab_llm;

pub use creem::CreemAdapter;
pub use db::DbAdapter;
pub use vocab_llm::{OpenAiVocabularyAdapter, UnconfiguredVocabulary};
