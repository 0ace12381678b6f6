pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod i18n;
pub mod llm;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConstructionError, GraphError, InvocationError, PipelineError};
pub use generator::invoker::{EchoInvoker, InvocationRequest, Invoker};
pub use generator::result::PipelineResult;
pub use generator::workflow::{launch, run_pipeline, run_pipeline_with_cancellation};
