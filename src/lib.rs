//! Relay between the Micro Mandarin learning client and Gemini
//!
//! Accepts lesson-generation and pronunciation-analysis requests, wraps them in
//! structured prompts, forwards them to the model with the caller's own API key,
//! and hands the model's JSON back.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
