mod profile;
mod provider;
mod serde_api;

pub use profile::{ChatCompletionsProfile, ImagePolicy, ModelSource};
pub use provider::ChatCompletionsProvider;
