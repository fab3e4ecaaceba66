//! Regional phone number rules.
//!
//! Phone validation depends on a country calling code and a national trunk
//! prefix, so it is a pluggable rule rather than part of the validator.

use std::fmt;

/// Accepted digit count once separators and the international prefix are removed.
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

/// A region-specific phone number policy.
pub trait PhoneRule: fmt::Debug + Send + Sync {
    /// Whether `raw` (already trimmed) is an acceptable phone number.
    fn is_valid(&self, raw: &str) -> bool;

    /// Reformat user input for display while typing.
    fn format(&self, raw: &str) -> String;

    /// Example number appended to the validation message, if any.
    fn example(&self) -> Option<&str> {
        None
    }
}

/// Calling-code based rule.
///
/// Accepts numbers written with spaces or dashes, optionally starting with
/// `+<calling_code>`. National numbers may keep their trunk prefix; it counts
/// as a digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallingCodeRule {
    calling_code: String,
    trunk_prefix: Option<char>,
    example: Option<String>,
}

impl CallingCodeRule {
    #[must_use]
    pub fn new(calling_code: impl Into<String>, trunk_prefix: Option<char>) -> Self {
        Self {
            calling_code: calling_code.into(),
            trunk_prefix,
            example: None,
        }
    }

    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Pakistan: `+92`, trunk prefix `0`.
    #[must_use]
    pub fn pakistan() -> Self {
        Self::new("92", Some('0')).with_example("+92 300 1234567")
    }

    #[must_use]
    pub fn calling_code(&self) -> &str {
        &self.calling_code
    }

    fn national_digits<'a>(&self, compact: &'a str) -> &'a str {
        compact
            .strip_prefix('+')
            .and_then(|rest| rest.strip_prefix(self.calling_code.as_str()))
            .unwrap_or(compact)
    }
}

impl Default for CallingCodeRule {
    fn default() -> Self {
        Self::pakistan()
    }
}

impl PhoneRule for CallingCodeRule {
    fn is_valid(&self, raw: &str) -> bool {
        let compact: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        let digits = self.national_digits(&compact);
        (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len())
            && digits.bytes().all(|b| b.is_ascii_digit())
    }

    fn format(&self, raw: &str) -> String {
        let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return digits;
        }

        if !digits.starts_with(self.calling_code.as_str()) {
            let national = match self.trunk_prefix {
                Some(trunk) if digits.starts_with(trunk) => &digits[trunk.len_utf8()..],
                _ => digits.as_str(),
            };
            digits = format!("{}{national}", self.calling_code);
        }

        let rest = &digits[self.calling_code.len()..];
        let (area, subscriber) = rest.split_at(rest.len().min(3));
        let mut out = format!("+{}", self.calling_code);
        for part in [area, subscriber] {
            if !part.is_empty() {
                out.push(' ');
                out.push_str(part);
            }
        }
        out
    }

    fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_pakistani_formats() {
        let rule = CallingCodeRule::pakistan();
        for number in [
            "03001234567",
            "+923001234567",
            "+92 300 1234567",
            "0300-1234567",
            "3001234567",
        ] {
            assert!(rule.is_valid(number), "{number} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_numbers() {
        let rule = CallingCodeRule::pakistan();
        for number in [
            "12345",
            "0300 12345a7",
            "+1 555 123 4567",
            "++923001234567",
            "0300123456789012345",
            "",
        ] {
            assert!(!rule.is_valid(number), "{number} should be invalid");
        }
    }

    #[test]
    fn formats_with_calling_code() {
        let rule = CallingCodeRule::pakistan();
        assert_eq!(rule.format("03001234567"), "+92 300 1234567");
        assert_eq!(rule.format("3001234567"), "+92 300 1234567");
        assert_eq!(rule.format("+92-300-1234567"), "+92 300 1234567");
        assert_eq!(rule.format("030"), "+92 30");
        assert_eq!(rule.format("abc"), "");
    }

    #[test]
    fn other_regions_plug_in() {
        let rule = CallingCodeRule::new("44", Some('0'));
        assert!(rule.is_valid("+44 7911 123456"));
        assert_eq!(rule.format("07911123456"), "+44 791 1123456");
        assert_eq!(rule.example(), None);
    }
}
