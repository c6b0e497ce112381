pub mod llm_client;

pub use llm_client::{DEFAULT_LLM_ENDPOINT, DEFAULT_LLM_MODEL, LlmTranslator, NetworkError};
