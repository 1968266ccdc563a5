//! genstudio - generation-request orchestration for a generative-AI backend
//!
//! Turns application intents (a social post, a logo, a video) into backend
//! requests, runs them with bounded retries, validates what comes back, and
//! reports every failure as one of a small set of user-facing categories.

pub mod aggregate;
pub mod ai;
pub mod app;
pub mod aspect;
pub mod builders;
pub mod classifier;
pub mod error;
pub mod events;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod poller;
pub mod prompts;
pub mod retry;

pub use error::{Error, ErrorCategory, GenerationError, GenerationResult, Result};
