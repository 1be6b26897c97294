//! Vendor adapters. Four families speak the chat-completions dialect and share
//! [`chat_completions::ChatCompletionsProvider`]; Anthropic has its own wire format.

mod reply;

#[cfg(any(
    feature = "provider-openai",
    feature = "provider-perplexity",
    feature = "provider-openrouter",
    feature = "provider-custom"
))]
pub mod chat_completions;

#[cfg(feature = "provider-anthropic")]
pub mod anthropic;

#[cfg(feature = "provider-custom")]
pub mod custom;

#[cfg(feature = "provider-openai")]
pub mod openai;

#[cfg(feature = "provider-openrouter")]
pub mod openrouter;

#[cfg(feature = "provider-perplexity")]
pub mod perplexity;
