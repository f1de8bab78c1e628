pub mod assembler;
pub mod audio;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
pub mod outline;
pub mod prompt;
pub mod retry;
pub mod setup;
pub mod speech;
pub mod synth;
pub mod workflow;
