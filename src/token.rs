use serde::Serialize;
use std::fmt;

const SIMPLE_CHARS_PER_TOKEN: usize = 4;

/// Trait for estimating token counts in text.
pub trait TokenEstimator: Send + Sync {
    /// Estimates the number of tokens in the given text.
    fn estimate(&self, text: &str) -> usize;
}

/// Simple character-based tokenizer.
///
/// Uses a heuristic of approximately 4 characters per token, close enough
/// for mixed source code and prose to pick a context window.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTokenizer;

impl TokenEstimator for SimpleTokenizer {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        text.chars()
            .count()
            .saturating_add(SIMPLE_CHARS_PER_TOKEN - 1)
            .saturating_div(SIMPLE_CHARS_PER_TOKEN)
            .max(1)
    }
}

/// Smallest common context window a token count fits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContextFit {
    /// Under 4k tokens
    Gpt35,
    /// Under 8k tokens
    Gpt4,
    /// Under 32k tokens
    Gpt4_32k,
    /// Under 128k tokens
    Gpt4Turbo,
    /// 128k tokens or more
    ExceedsAll,
}

impl ContextFit {
    /// Classifies a token count.
    #[must_use]
    pub const fn for_tokens(tokens: usize) -> Self {
        match tokens {
            0..4_000 => Self::Gpt35,
            4_000..8_000 => Self::Gpt4,
            8_000..32_000 => Self::Gpt4_32k,
            32_000..128_000 => Self::Gpt4Turbo,
            _ => Self::ExceedsAll,
        }
    }

    /// Returns true if some listed model accepts the count.
    #[must_use]
    pub const fn fits(self) -> bool {
        !matches!(self, Self::ExceedsAll)
    }
}

impl fmt::Display for ContextFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gpt35 => "fits in GPT-3.5 (4k context)",
            Self::Gpt4 => "fits in GPT-4 (8k context)",
            Self::Gpt4_32k => "fits in GPT-4-32k (32k context)",
            Self::Gpt4Turbo => "fits in GPT-4-turbo (128k context)",
            Self::ExceedsAll => "exceeds most LLM context windows (>128k tokens)",
        })
    }
}
