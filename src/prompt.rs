//! Grounded prompt assembly.

use index::ScoredChunk;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CORPUS_DESCRIPTION: &str =
    "Air India, its operations, policies, and other related topics";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// What the indexed documents are about. Slotted into the instruction.
    pub corpus_description: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            corpus_description: DEFAULT_CORPUS_DESCRIPTION.to_string(),
        }
    }
}

/// Renders retrieved chunks and a question into the text sent to the chat model.
///
/// Output depends only on the inputs: same chunks, same question, same bytes.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    cfg: PromptConfig,
}

impl PromptAssembler {
    pub fn new(cfg: PromptConfig) -> Self {
        Self { cfg }
    }

    pub fn build_prompt(&self, chunks: &[ScoredChunk], question: &str) -> String {
        let context = render_context(chunks);
        let mut prompt = String::with_capacity(context.len() + question.len() + 256);
        prompt.push_str(concat!(
            "You are a helpful assistant. ",
            "Use the following context to answer the user's question.\n",
        ));
        prompt.push_str(concat!(
            "The context is a collection of documents ",
            "that may contain relevant information about ",
        ));
        prompt.push_str(&self.cfg.corpus_description);
        prompt.push_str(".\n\nContext:\n");
        prompt.push_str(&context);
        prompt.push_str("\n\nUser's Question:\n");
        prompt.push_str(question);
        prompt.push('\n');
        prompt
    }
}

fn render_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut header = format!("[{}]", i + 1);
            match (chunk.source(), chunk.page()) {
                (Some(source), Some(page)) => {
                    header.push_str(&format!(" (source: {source}, page {page})"))
                }
                (Some(source), None) => header.push_str(&format!(" (source: {source})")),
                (None, Some(page)) => header.push_str(&format!(" (page {page})")),
                (None, None) => {}
            }
            format!("{header}\n{}", chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn chunk(text: &str, meta: &[(&str, &str)]) -> ScoredChunk {
        ScoredChunk {
            id: text.to_lowercase(),
            text: text.to_string(),
            metadata: meta
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            score: 0.5,
        }
    }

    #[test]
    fn empty_context_is_deterministic() {
        let assembler = PromptAssembler::default();
        let a = assembler.build_prompt(&[], "Q");
        let b = assembler.build_prompt(&[], "Q");
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert!(a.ends_with("User's Question:\nQ\n"));
    }

    #[test]
    fn chunks_render_in_order_with_metadata() {
        let assembler = PromptAssembler::default();
        let chunks = [
            chunk("Policy A", &[("source", "refunds.pdf"), ("page", "3")]),
            chunk("Policy B", &[("source", "baggage.pdf")]),
            chunk("Policy C", &[]),
        ];
        let prompt = assembler.build_prompt(&chunks, "What is the refund policy?");

        let a = prompt.find("[1] (source: refunds.pdf, page 3)\nPolicy A").unwrap();
        let b = prompt.find("[2] (source: baggage.pdf)\nPolicy B").unwrap();
        let c = prompt.find("[3]\nPolicy C").unwrap();
        assert!(a < b && b < c);
        assert!(prompt.contains("Policy A\n\n[2]"));
        assert!(prompt.contains("What is the refund policy?"));
    }

    #[test]
    fn instruction_names_corpus() {
        let prompt = PromptAssembler::default().build_prompt(&[], "Q");
        assert!(prompt.contains(DEFAULT_CORPUS_DESCRIPTION));
        assert!(prompt.starts_with("You are a helpful assistant."));

        let custom = PromptAssembler::new(PromptConfig {
            corpus_description: "the fleet maintenance manuals".into(),
        });
        assert!(custom
            .build_prompt(&[], "Q")
            .contains("information about the fleet maintenance manuals."));
    }

    #[test]
    fn question_is_kept_verbatim() {
        let question = "  Can I bring <pets> & \"service animals\"?  ";
        let prompt = PromptAssembler::default().build_prompt(&[], question);
        assert!(prompt.contains(question));
    }
}
