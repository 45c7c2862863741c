//! Prefix Matcher - tracks how much of a scanner prefix has been typed
//!
//! A character advances the match when it is the next expected prefix
//! character. Anything else typed before the prefix is complete is noise:
//! it is skipped and never resets progress, so a prefix still matches after
//! stray leading keystrokes. Once complete the matcher stays saturated until
//! `reset`.
//!
//! Repeated characters are matched one position at a time, so `AA` and
//! `ABA` are valid prefixes that need each character typed in order.

/// Result of feeding one character to the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixStep {
    /// Character matched the next prefix character.
    Advanced,
    /// Character matched the last prefix character.
    Completed,
    /// Prefix was already complete; the character belongs to the payload.
    Saturated,
    /// Character did not match and was skipped.
    Skipped,
}

/// Incremental matcher for one barcode prefix.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: Vec<char>,
    matched: usize,
}

impl PrefixMatcher {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.chars().collect(),
            matched: 0,
        }
    }

    /// Number of prefix characters matched so far.
    pub fn matched_len(&self) -> usize {
        self.matched
    }

    /// Prefix length in characters.
    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.matched == self.prefix.len()
    }

    pub fn feed(&mut self, c: char) -> PrefixStep {
        if self.is_complete() {
            return PrefixStep::Saturated;
        }
        if self.prefix[self.matched] != c {
            return PrefixStep::Skipped;
        }

        self.matched += 1;
        if self.is_complete() {
            PrefixStep::Completed
        } else {
            PrefixStep::Advanced
        }
    }

    pub fn reset(&mut self) {
        self.matched = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(matcher: &mut PrefixMatcher, input: &str) -> Vec<PrefixStep> {
        input.chars().map(|c| matcher.feed(c)).collect()
    }

    #[test]
    fn test_matches_prefix() {
        let mut matcher = PrefixMatcher::new("L%");
        assert_eq!(
            feed_all(&mut matcher, "L%1"),
            vec![PrefixStep::Advanced, PrefixStep::Completed, PrefixStep::Saturated]
        );
        assert!(matcher.is_complete());
    }

    #[test]
    fn test_wrong_prefix_never_completes() {
        let mut matcher = PrefixMatcher::new("L%");
        feed_all(&mut matcher, "C%123abc");
        assert_eq!(matcher.matched_len(), 0);
        assert!(!matcher.is_complete());
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let mut matcher = PrefixMatcher::new("L%");
        feed_all(&mut matcher, "xyL");
        assert_eq!(matcher.matched_len(), 1);

        // Noise between prefix characters doesn't reset either
        assert_eq!(matcher.feed('q'), PrefixStep::Skipped);
        assert_eq!(matcher.feed('%'), PrefixStep::Completed);
    }

    #[test]
    fn test_repeated_prefix_characters() {
        let mut matcher = PrefixMatcher::new("AA");
        assert_eq!(matcher.feed('A'), PrefixStep::Advanced);
        assert_eq!(matcher.feed('A'), PrefixStep::Completed);
    }

    #[test]
    fn test_reset() {
        let mut matcher = PrefixMatcher::new("L%");
        feed_all(&mut matcher, "L%");
        matcher.reset();
        assert_eq!(matcher.matched_len(), 0);
        assert_eq!(matcher.len(), 2);
        assert!(!matcher.is_empty());
    }
}
