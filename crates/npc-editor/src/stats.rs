//! Size statistics for prompt text shown next to the editor.

use serde::Serialize;

/// Average characters per token used for the rough token estimate.
pub const CHARS_PER_TOKEN: f64 = 3.5;

/// Character, line and approximate token counts for a prompt.
///
/// Absent text reports all zeros, while an empty string already counts as
/// one line. The difference tells "nothing loaded" apart from "loaded and
/// empty".
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PromptStats {
    pub chars: usize,
    pub lines: usize,
    pub approx_tokens: usize,
}

impl PromptStats {
    pub fn of(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Self::default();
        };
        let chars = text.chars().count();
        Self {
            chars,
            lines: text.split('\n').count(),
            approx_tokens: (chars as f64 / CHARS_PER_TOKEN).round() as usize,
        }
    }

    /// Compact one-line summary, e.g. `120 chars · 3 lines · ~34 tokens`.
    pub fn summary(&self) -> String {
        format!(
            "{} chars \u{b7} {} lines \u{b7} ~{} tokens",
            self.chars, self.lines, self.approx_tokens
        )
    }
}
