//! Prompt assembler — turns static prompts, retrieved knowledge, and
//! history into the message sequence sent to the provider.
//!
//! Section order is fixed: system instructions, behaviour guidelines,
//! retrieved knowledge (highest score first, each chunk tagged with its
//! source), the trailing history window, then the new user message.

use helpdesk_core::provider::PromptMessage;
use helpdesk_core::{RetrievalResult, Role, Turn};

use crate::prompts::StaticPrompts;
use crate::token::estimate_tokens;

/// The assembled prompt plus its measured size.
///
/// Token counts are reported, never enforced: the provider's own limit
/// is the backstop, ours is an observability number.
#[derive(Debug, Clone)]
pub struct PromptBundle {
    pub messages: Vec<PromptMessage>,
    /// Estimated tokens of the whole prompt
    pub estimated_tokens: usize,
    /// Estimated tokens of static + retrieved context only
    pub context_tokens: usize,
}

/// Assembles prompts under a character budget for the knowledge section.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    history_window: usize,
    max_knowledge_chars: usize,
}

impl PromptAssembler {
    pub fn new(history_window: usize, max_knowledge_chars: usize) -> Self {
        Self {
            history_window,
            max_knowledge_chars,
        }
    }

    pub fn assemble(
        &self,
        prompts: &StaticPrompts,
        retrieval: Option<&RetrievalResult>,
        history: &[Turn],
        user_text: &str,
    ) -> PromptBundle {
        let mut messages = Vec::with_capacity(history.len() + 4);

        messages.push(PromptMessage::system(&prompts.system_prompt));
        messages.push(PromptMessage::system(&prompts.guidelines));

        let knowledge_section = retrieval.and_then(|r| self.knowledge_section(r));
        let context_tokens = prompts.estimated_tokens()
            + knowledge_section
                .as_deref()
                .map(estimate_tokens)
                .unwrap_or(0);

        if let Some(section) = knowledge_section {
            messages.push(PromptMessage::system(section));
        }

        let window_start = history.len().saturating_sub(self.history_window);
        for turn in &history[window_start..] {
            messages.push(match turn.role {
                Role::User => PromptMessage::user(&turn.content),
                Role::Assistant => PromptMessage::assistant(&turn.content),
            });
        }

        messages.push(PromptMessage::user(user_text));

        let estimated_tokens = messages
            .iter()
            .map(|m| estimate_tokens(&m.content))
            .sum();

        PromptBundle {
            messages,
            estimated_tokens,
            context_tokens,
        }
    }

    /// Render ranked chunks into one system message. Chunks that would
    /// overflow the character budget are dropped whole from the tail;
    /// a chunk is never sliced mid-text. Empty retrieval → no section.
    fn knowledge_section(&self, retrieval: &RetrievalResult) -> Option<String> {
        if retrieval.is_empty() {
            return None;
        }

        let header = "Relevant knowledge base information:";
        let mut section = String::from(header);
        let mut used = 0usize;

        for chunk in &retrieval.chunks {
            let entry = format!("\n\n[{}] {}", chunk.source, chunk.content);
            let entry_chars = entry.chars().count();
            if used + entry_chars > self.max_knowledge_chars {
                break;
            }
            section.push_str(&entry);
            used += entry_chars;
        }

        if used == 0 {
            // Even the top chunk overflowed the budget
            return None;
        }

        Some(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::provider::PromptRole;
    use helpdesk_core::KnowledgeChunk;

    fn prompts() -> StaticPrompts {
        StaticPrompts::new("You are a support assistant.", "Be concise.")
    }

    fn chunk(id: &str, content: &str, score: f32) -> KnowledgeChunk {
        KnowledgeChunk {
            id: id.into(),
            document_id: "kb".into(),
            content: content.into(),
            source: "kb".into(),
            embedding: None,
            score,
        }
    }

    fn retrieval(chunks: Vec<KnowledgeChunk>) -> RetrievalResult {
        RetrievalResult {
            query: "test".into(),
            chunks,
        }
    }

    #[test]
    fn section_order_is_fixed() {
        let assembler = PromptAssembler::new(20, 4000);
        let history = vec![Turn::user("earlier question"), Turn::assistant("earlier answer")];
        let result = retrieval(vec![chunk("c1", "Returns accepted within 30 days.", 0.9)]);

        let bundle = assembler.assemble(&prompts(), Some(&result), &history, "And shipping?");

        assert_eq!(bundle.messages.len(), 6);
        assert_eq!(bundle.messages[0].role, PromptRole::System);
        assert_eq!(bundle.messages[0].content, "You are a support assistant.");
        assert_eq!(bundle.messages[1].content, "Be concise.");
        assert!(bundle.messages[2].content.contains("[kb] Returns accepted"));
        assert_eq!(bundle.messages[3].content, "earlier question");
        assert_eq!(bundle.messages[4].role, PromptRole::Assistant);
        assert_eq!(bundle.messages[5].content, "And shipping?");
    }

    #[test]
    fn empty_retrieval_omits_knowledge_section() {
        let assembler = PromptAssembler::new(20, 4000);
        let result = RetrievalResult::empty("no match");

        let bundle = assembler.assemble(&prompts(), Some(&result), &[], "hello");
        assert_eq!(bundle.messages.len(), 3);
        assert!(!bundle.messages.iter().any(|m| m.content.contains("knowledge base")));
    }

    #[test]
    fn no_retrieval_omits_knowledge_section() {
        let assembler = PromptAssembler::new(20, 4000);
        let bundle = assembler.assemble(&prompts(), None, &[], "thanks!");
        assert_eq!(bundle.messages.len(), 3);
    }

    #[test]
    fn history_window_keeps_newest_turns() {
        let assembler = PromptAssembler::new(2, 4000);
        let history = vec![
            Turn::user("one"),
            Turn::assistant("two"),
            Turn::user("three"),
            Turn::assistant("four"),
        ];

        let bundle = assembler.assemble(&prompts(), None, &history, "five");
        // system, guidelines, "three", "four", "five"
        assert_eq!(bundle.messages.len(), 5);
        assert_eq!(bundle.messages[2].content, "three");
        assert_eq!(bundle.messages[3].content, "four");
    }

    #[test]
    fn overflowing_chunk_dropped_whole_from_tail() {
        let assembler = PromptAssembler::new(20, 60);
        let result = retrieval(vec![
            chunk("c1", "Short top chunk.", 0.9),
            chunk("c2", &"x".repeat(100), 0.5),
        ]);

        let bundle = assembler.assemble(&prompts(), Some(&result), &[], "q");
        let section = &bundle.messages[2].content;
        assert!(section.contains("Short top chunk."));
        assert!(!section.contains("xxxx"));
    }

    #[test]
    fn budget_too_small_for_any_chunk_omits_section() {
        let assembler = PromptAssembler::new(20, 10);
        let result = retrieval(vec![chunk("c1", &"y".repeat(50), 0.9)]);

        let bundle = assembler.assemble(&prompts(), Some(&result), &[], "q");
        assert_eq!(bundle.messages.len(), 3);
    }

    #[test]
    fn chunks_are_source_tagged() {
        let assembler = PromptAssembler::new(20, 4000);
        let mut c = chunk("c1", "Warranty is two years.", 0.8);
        c.source = "warranty_faq".into();

        let bundle = assembler.assemble(&prompts(), Some(&retrieval(vec![c])), &[], "q");
        assert!(bundle.messages[2].content.contains("[warranty_faq] Warranty is two years."));
    }

    #[test]
    fn token_estimates_are_reported() {
        let assembler = PromptAssembler::new(20, 4000);
        let result = retrieval(vec![chunk("c1", "Some retrieved context here.", 0.9)]);

        let bundle = assembler.assemble(&prompts(), Some(&result), &[], "a question");
        assert!(bundle.estimated_tokens > 0);
        assert!(bundle.context_tokens > 0);
        assert!(bundle.context_tokens <= bundle.estimated_tokens);
    }
}
