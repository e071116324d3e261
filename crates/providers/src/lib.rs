//! Provider implementations for helpdesk.
//!
//! The only production backend is the OpenAI-compatible HTTP adapter,
//! which covers OpenAI itself and every endpoint speaking the same wire
//! format. The scripted mock provider exists for orchestrator and
//! gateway tests.

pub mod mock;
pub mod openai_compat;

pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;

use helpdesk_core::provider::CompletionProvider;

/// Build the configured provider.
///
/// Fails when no API key is available — the service cannot answer
/// anything without its completion backend.
pub fn build_from_config(
    config: &helpdesk_config::AppConfig,
) -> Result<Arc<dyn CompletionProvider>, helpdesk_core::Error> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| helpdesk_core::Error::Config {
            message: "No API key configured — set HELPDESK_API_KEY or OPENAI_API_KEY".into(),
        })?;

    Ok(Arc::new(OpenAiCompatProvider::new(
        &config.provider.name,
        &config.provider.base_url,
        api_key,
        config.provider.timeout_secs,
    )))
}
