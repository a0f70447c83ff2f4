//! Content-level spam heuristics for validated submissions.
//!
//! Honeypot and submit-timing checks live in the handler; this module owns
//! the pattern scan over the free-text fields. Matches are answered with a
//! normal success response upstream so automated senders get no signal that
//! they were detected.

use crate::models::ContactSubmission;
use regex::Regex;

/// Compiled deny patterns, applied to the concatenation of name, company and
/// vision.
pub struct SpamScanner {
    rules: Vec<(&'static str, Regex)>,
}

impl SpamScanner {
    pub fn new() -> Self {
        // Classic crawler-bait vocabulary, embedded links, and markup that
        // only shows up in injection attempts. Plain-prose inquiries about
        // automation never contain any of these.
        let patterns: &[(&'static str, &str)] = &[
            (
                "keyword",
                r"(?i)\b(viagra|casino|payday loans?|backlinks?|guest posts?|seo (?:services?|packages?|ranking)|adult traffic|crypto giveaway|make money fast)\b",
            ),
            ("url", r"(?i)\bhttps?://|\bwww\."),
            (
                "markup",
                r"(?i)<\s*script|\bon(?:click|error|load|mouseover)\s*=|javascript:",
            ),
        ];

        let rules = patterns
            .iter()
            .map(|(label, pattern)| (*label, Regex::new(pattern).unwrap()))
            .collect();

        Self { rules }
    }

    /// Scan a submission's free-text fields. Returns the label of the first
    /// matching rule, for the operational log.
    pub fn scan(&self, submission: &ContactSubmission) -> Option<&'static str> {
        let haystack = format!(
            "{} {} {}",
            submission.full_name,
            submission.company.as_deref().unwrap_or_default(),
            submission.vision
        );
        self.scan_text(&haystack)
    }

    pub fn scan_text(&self, haystack: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(haystack))
            .map(|(label, _)| *label)
    }
}

impl Default for SpamScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_spam_flagged() {
        let scanner = SpamScanner::new();
        assert_eq!(
            scanner.scan_text("we sell cheap backlinks for your site"),
            Some("keyword")
        );
        assert_eq!(
            scanner.scan_text("Best SEO services to rank #1"),
            Some("keyword")
        );
    }

    #[test]
    fn test_embedded_urls_flagged() {
        let scanner = SpamScanner::new();
        assert_eq!(
            scanner.scan_text("check out https://spam.example.com now"),
            Some("url")
        );
        assert_eq!(scanner.scan_text("visit www.example.com"), Some("url"));
    }

    #[test]
    fn test_markup_injection_flagged() {
        let scanner = SpamScanner::new();
        assert_eq!(
            scanner.scan_text("<script>alert(1)</script>"),
            Some("markup")
        );
        assert_eq!(scanner.scan_text("<img onerror=alert(1)>"), Some("markup"));
    }

    #[test]
    fn test_ordinary_inquiries_pass() {
        let scanner = SpamScanner::new();
        assert_eq!(
            scanner.scan_text("We want to automate invoicing and save time weekly."),
            None
        );
        assert_eq!(
            scanner.scan_text("Looking to roll out an internal assistant for support tickets"),
            None
        );
    }
}
