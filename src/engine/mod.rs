//! Public façade for the pipeline layer.

pub mod rag;
pub mod workflows;

pub use rag::{ModelResponse, QueryError, RagPipeline};
pub use workflows::{WorkflowError, Workflows};
