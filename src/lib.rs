//! Security artifact copilot: generates threat models, attack trees,
//! mitigations, DREAD risk assessments and security test cases from a
//! described application, and answers follow-up questions over a
//! retrieval-augmented chat.

pub mod artifacts;
pub mod commands;
pub mod config;
pub mod engine;
pub mod prompt;
pub mod providers;
pub mod report;
pub mod retrieval;
pub mod retry;
pub mod session;
pub mod store;

pub use commands::AppState;
pub use config::Config;
pub use engine::{ModelResponse, RagPipeline, Workflows};
pub use providers::{AzureProvider, GoogleProvider, ModelProvider, OpenAiProvider, ProviderError};
pub use session::{ConversationTurn, SessionContext};
