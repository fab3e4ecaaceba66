//! Character counting for length-limited text inputs.

use unicode_segmentation::UnicodeSegmentation;

/// Length in user-perceived characters (grapheme clusters).
///
/// Both the textarea length rule and [`CharacterCount`] measure with this.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.graphemes(true).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterLevel {
    Normal,
    /// Above 90% of the limit.
    Warning,
    Over,
}

/// `current/max` counter shown under a textarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterCount {
    pub current: usize,
    pub max: usize,
}

impl CharacterCount {
    #[must_use]
    pub fn measure(text: &str, max: usize) -> Self {
        Self {
            current: char_len(text),
            max,
        }
    }

    #[must_use]
    pub fn level(&self) -> CounterLevel {
        if self.current > self.max {
            CounterLevel::Over
        } else if self.current * 10 > self.max * 9 {
            CounterLevel::Warning
        } else {
            CounterLevel::Normal
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.current, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(CharacterCount::measure("abc", 100).level(), CounterLevel::Normal);
        assert_eq!(CharacterCount::measure(&"a".repeat(90), 100).level(), CounterLevel::Normal);
        assert_eq!(CharacterCount::measure(&"a".repeat(91), 100).level(), CounterLevel::Warning);
        assert_eq!(CharacterCount::measure(&"a".repeat(100), 100).level(), CounterLevel::Warning);
        assert_eq!(CharacterCount::measure(&"a".repeat(101), 100).level(), CounterLevel::Over);
    }

    #[test]
    fn counts_graphemes() {
        let count = CharacterCount::measure("héllo 👋🏽", 2000);
        assert_eq!(count.current, 7);
        assert_eq!(count.label(), "7/2000");
    }
}
