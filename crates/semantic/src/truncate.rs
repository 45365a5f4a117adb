//! Token-budget truncation.
//!
//! Embedding services reject inputs above their context size, so text is
//! cut to a token budget before it is sent. Cutting always happens on a token
//! boundary and the result is a decode of the kept token prefix.

use std::borrow::Cow;
use std::path::Path;

use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer;

use crate::config::TokenizerSpec;
use crate::SemanticError;

enum Backend {
    Bpe(CoreBPE),
    HuggingFace(Box<Tokenizer>),
}

/// Counts tokens and cuts text to a token budget.
///
/// Building one loads the full vocabulary, so create it once and share it.
pub struct Truncator {
    backend: Backend,
}

impl std::fmt::Debug for Truncator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.backend {
            Backend::Bpe(_) => "cl100k_base",
            Backend::HuggingFace(_) => "hugging_face",
        };
        f.debug_struct("Truncator").field("tokenizer", &kind).finish()
    }
}

impl Truncator {
    /// `cl100k_base`, the vocabulary shared by most hosted embedding models.
    pub fn cl100k() -> Result<Self, SemanticError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| SemanticError::Tokenizer(e.to_string()))?;
        Ok(Self {
            backend: Backend::Bpe(bpe),
        })
    }

    /// Load a HuggingFace `tokenizer.json`.
    pub fn from_tokenizer_file<P: AsRef<Path>>(path: P) -> Result<Self, SemanticError> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| SemanticError::Tokenizer(format!("{}: {e}", path.display())))?;
        Ok(Self {
            backend: Backend::HuggingFace(Box::new(tokenizer)),
        })
    }

    pub fn from_spec(spec: &TokenizerSpec) -> Result<Self, SemanticError> {
        match spec {
            TokenizerSpec::Cl100kBase => Self::cl100k(),
            TokenizerSpec::HuggingFace { path } => Self::from_tokenizer_file(path),
        }
    }

    /// Number of tokens `text` encodes to.
    pub fn count_tokens(&self, text: &str) -> usize {
        match &self.backend {
            Backend::Bpe(bpe) => bpe.encode_ordinary(text).len(),
            Backend::HuggingFace(tokenizer) => match tokenizer.encode(text, false) {
                Ok(encoding) => encoding.get_ids().len(),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "tokenizer failed to encode text; counting zero tokens"
                    );
                    0
                }
            },
        }
    }

    /// Cut `text` to at most `max_tokens` tokens, dropping trailing tokens.
    ///
    /// Text that already fits comes back borrowed and unchanged.
    pub fn truncate<'a>(&self, text: &'a str, max_tokens: usize) -> Cow<'a, str> {
        match &self.backend {
            Backend::Bpe(bpe) => truncate_bpe(bpe, text, max_tokens),
            Backend::HuggingFace(tokenizer) => truncate_hf(tokenizer, text, max_tokens),
        }
    }
}

fn truncate_bpe<'a>(bpe: &CoreBPE, text: &'a str, max_tokens: usize) -> Cow<'a, str> {
    let tokens = bpe.encode_ordinary(text);
    if tokens.len() <= max_tokens {
        return Cow::Borrowed(text);
    }

    // A cut can land inside a multi-byte character; back off until the prefix
    // decodes to valid UTF-8.
    let mut keep = max_tokens;
    while keep > 0 {
        if let Ok(decoded) = bpe.decode(tokens[..keep].to_vec()) {
            tracing::debug!(
                original_tokens = tokens.len(),
                kept_tokens = keep,
                "truncated text to token budget"
            );
            return Cow::Owned(decoded);
        }
        keep -= 1;
    }
    Cow::Owned(String::new())
}

fn truncate_hf<'a>(tokenizer: &Tokenizer, text: &'a str, max_tokens: usize) -> Cow<'a, str> {
    let encoding = match tokenizer.encode(text, false) {
        Ok(encoding) => encoding,
        Err(err) => {
            tracing::warn!(error = %err, "tokenizer failed to encode text; leaving it untruncated");
            return Cow::Borrowed(text);
        }
    };
    let ids = encoding.get_ids();
    if ids.len() <= max_tokens {
        return Cow::Borrowed(text);
    }
    if max_tokens == 0 {
        return Cow::Owned(String::new());
    }

    // Offsets point back into the original text, which keeps whitespace and
    // casing that a decode would normalize away.
    let end = encoding.get_offsets()[max_tokens - 1].1;
    if end <= text.len() && text.is_char_boundary(end) {
        return Cow::Owned(text[..end].to_string());
    }

    match tokenizer.decode(&ids[..max_tokens], false) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(err) => {
            tracing::warn!(error = %err, "tokenizer failed to decode prefix");
            Cow::Owned(String::new())
        }
    }
}
