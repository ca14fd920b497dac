pub mod gemini;
pub mod intent;
pub mod orchestrator;
pub mod retriever;
pub mod sentiment;
pub mod streaming;
