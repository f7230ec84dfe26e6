//! Photo-to-avatar generation through any OpenAI-style multimodal
//! chat-completion endpoint.
//!
//! The proxy side ([`relay`], [`server`]) forwards one request per user
//! action and folds whatever the provider answers into a [`GenerateResult`]
//! via the [`normalizer`]. The [`client`] side persists the model config,
//! loads images and talks to the proxy.

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logger;
pub mod models;
pub mod normalizer;
pub mod prompt;
pub mod relay;
#[cfg(feature = "server")]
pub mod server;

pub use client::{ApiClient, AvatarGenerator, ConfigStore, FileConfigStore, MemoryConfigStore};
pub use config::{ClientConfig, ServerConfig};
pub use diagnostics::Diagnostics;
pub use error::{AvatarError, Result};
pub use models::*;
pub use normalizer::{classify, normalize};
pub use prompt::build_prompt;
pub use relay::{CompletionTransport, HttpTransport, ProviderReply, Relay, RelayResponse};
