//! File-name pattern matching for fragment discovery
//!
//! Supports a single wildcard:
//! - `*` - Matches any run of characters (including none) within one file name
//!
//! Patterns never cross directory boundaries; they are applied to bare file
//! names returned by a directory listing.

/// Glob pattern over a single file name (e.g., `slot-*.rom`, `*.boot.rom`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamePattern {
    pattern: String,
}

impl FileNamePattern {
    /// Create a pattern
    ///
    /// # Examples
    /// ```
    /// use cartridge_import::core::pattern::FileNamePattern;
    ///
    /// let boot = FileNamePattern::new("*.boot.rom");
    /// assert!(boot.matches("sgb.boot.rom"));
    /// assert!(!boot.matches("program.rom"));
    /// ```
    pub fn new(pattern: impl Into<String>) -> Self {
        FileNamePattern {
            pattern: pattern.into(),
        }
    }

    /// Pattern text as given
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check if a file name matches this pattern
    pub fn matches(&self, name: &str) -> bool {
        if !self.pattern.contains('*') {
            return self.pattern == name;
        }

        let parts: Vec<&str> = self.pattern.split('*').collect();
        let last = parts.len() - 1;
        let mut pos = 0;

        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }

            // First part must match at beginning
            if i == 0 {
                if !name.starts_with(part) {
                    return false;
                }
                pos = part.len();
            }
            // Last part must match at end, without overlapping what came before
            else if i == last {
                if !name.ends_with(part) || name.len() < pos + part.len() {
                    return false;
                }
            }
            // Middle parts must exist in order
            else if let Some(found) = name[pos..].find(part) {
                pos += found + part.len();
            } else {
                return false;
            }
        }

        true
    }

    /// Names from `names` that match, in their original order
    pub fn filter<'a, I>(&self, names: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().filter(|name| self.matches(name)).collect()
    }
}

impl std::fmt::Display for FileNamePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let pattern = FileNamePattern::new("program.rom");
        assert!(pattern.matches("program.rom"));
        assert!(!pattern.matches("data.rom"));
    }

    #[test]
    fn test_prefix_and_suffix() {
        let slot = FileNamePattern::new("slot-*.rom");
        assert!(slot.matches("slot-a.rom"));
        assert!(slot.matches("slot-.rom"));
        assert!(!slot.matches("slot.rom"));
        assert!(!slot.matches("slot-a.ram"));
        assert!(!slot.matches("xslot-a.rom"));
    }

    #[test]
    fn test_suffix_does_not_match_bare_name() {
        let program = FileNamePattern::new("*.program.rom");
        assert!(program.matches("dsp1b.program.rom"));
        assert!(!program.matches("program.rom"));
        assert!(!program.matches("dsp1b.data.rom"));
    }

    #[test]
    fn test_overlap_rejected() {
        // "ab*ba" must not accept "aba" by sharing the middle character
        let pattern = FileNamePattern::new("ab*ba");
        assert!(!pattern.matches("aba"));
        assert!(pattern.matches("abba"));
    }

    #[test]
    fn test_middle_parts() {
        let pattern = FileNamePattern::new("st*.*.rom");
        assert!(pattern.matches("st010.program.rom"));
        assert!(!pattern.matches("st010.rom"));
    }

    #[test]
    fn test_filter_keeps_order() {
        let names = ["b.boot.rom", "program.rom", "a.boot.rom"];
        let boot = FileNamePattern::new("*.boot.rom");
        assert_eq!(boot.filter(names), vec!["b.boot.rom", "a.boot.rom"]);
    }
}
