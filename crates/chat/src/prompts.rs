//! Static prompt files: system instructions and behaviour guidelines.
//!
//! Loaded once at startup. An unreadable, empty, or whitespace-only
//! file is a configuration error and stops the process before it
//! serves a single request.

use helpdesk_config::PromptsConfig;
use helpdesk_core::Error;
use tracing::info;

use crate::token::estimate_tokens;

/// The static prompt texts included in every assembled prompt.
#[derive(Debug, Clone)]
pub struct StaticPrompts {
    pub system_prompt: String,
    pub guidelines: String,
}

impl StaticPrompts {
    pub fn new(system_prompt: impl Into<String>, guidelines: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            guidelines: guidelines.into(),
        }
    }

    /// Load both prompt files, validating that neither is blank.
    pub fn load(config: &PromptsConfig) -> Result<Self, Error> {
        let system_prompt = load_prompt_file(&config.system_prompt)?;
        let guidelines = load_prompt_file(&config.guidelines)?;
        info!(
            system_chars = system_prompt.len(),
            guideline_chars = guidelines.len(),
            "Static prompts loaded"
        );
        Ok(Self {
            system_prompt,
            guidelines,
        })
    }

    /// Estimated token footprint of the static context.
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.system_prompt) + estimate_tokens(&self.guidelines)
    }
}

fn load_prompt_file(path: &std::path::Path) -> Result<String, Error> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read prompt file {}: {e}", path.display()),
    })?;

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Error::Config {
            message: format!("Prompt file is empty or whitespace-only: {}", path.display()),
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{content}").unwrap();
        path
    }

    #[test]
    fn loads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = PromptsConfig {
            system_prompt: write_file(dir.path(), "system.txt", "You are a support assistant."),
            guidelines: write_file(dir.path(), "guidelines.txt", "Be concise. Stay on topic."),
        };

        let prompts = StaticPrompts::load(&config).unwrap();
        assert_eq!(prompts.system_prompt, "You are a support assistant.");
        assert!(prompts.estimated_tokens() > 0);
    }

    #[test]
    fn whitespace_only_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PromptsConfig {
            system_prompt: write_file(dir.path(), "system.txt", "   \n\n  "),
            guidelines: write_file(dir.path(), "guidelines.txt", "Be concise."),
        };

        assert!(StaticPrompts::load(&config).is_err());
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PromptsConfig {
            system_prompt: dir.path().join("does_not_exist.txt"),
            guidelines: write_file(dir.path(), "guidelines.txt", "Be concise."),
        };

        assert!(StaticPrompts::load(&config).is_err());
    }

    #[test]
    fn content_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let config = PromptsConfig {
            system_prompt: write_file(dir.path(), "system.txt", "\n  Trimmed.  \n"),
            guidelines: write_file(dir.path(), "guidelines.txt", "Rules."),
        };

        let prompts = StaticPrompts::load(&config).unwrap();
        assert_eq!(prompts.system_prompt, "Trimmed.");
    }
}
