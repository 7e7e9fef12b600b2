//! Reasoning engine backends.
//!
//! One backend currently: [`OpenAiCompatEngine`], which speaks the
//! OpenAI-compatible streaming chat-completions protocol (OpenAI, Azure
//! OpenAI, and any compatible endpoint).

pub mod openai_compat;

pub use openai_compat::OpenAiCompatEngine;
