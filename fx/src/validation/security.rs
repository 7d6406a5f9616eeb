//! Adversarial pattern detection for currency fields.

use serde::Serialize;
use std::fmt;

/// Category of hostile input, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    HtmlTags,
    SqlInjection,
    ShellMetacharacters,
    PathTraversal,
    TemplateInjection,
    ScriptUri,
}

impl ThreatCategory {
    /// All categories in the order they are checked.
    pub const ALL: [ThreatCategory; 6] = [
        ThreatCategory::HtmlTags,
        ThreatCategory::SqlInjection,
        ThreatCategory::ShellMetacharacters,
        ThreatCategory::PathTraversal,
        ThreatCategory::TemplateInjection,
        ThreatCategory::ScriptUri,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::HtmlTags => "html_tags",
            ThreatCategory::SqlInjection => "sql_injection",
            ThreatCategory::ShellMetacharacters => "shell_metacharacters",
            ThreatCategory::PathTraversal => "path_traversal",
            ThreatCategory::TemplateInjection => "template_injection",
            ThreatCategory::ScriptUri => "script_uri",
        }
    }

    /// Human-readable description used in failure messages.
    pub fn description(&self) -> &'static str {
        match self {
            ThreatCategory::HtmlTags => "HTML/XML markup",
            ThreatCategory::SqlInjection => "SQL injection characters",
            ThreatCategory::ShellMetacharacters => "shell metacharacters",
            ThreatCategory::PathTraversal => "path traversal sequence",
            ThreatCategory::TemplateInjection => "template injection sequence",
            ThreatCategory::ScriptUri => "script URI scheme",
        }
    }

    /// Substrings that trigger this category. Script URIs are matched
    /// case-insensitively.
    fn patterns(&self) -> &'static [&'static str] {
        match self {
            ThreatCategory::HtmlTags => &["<", ">"],
            ThreatCategory::SqlInjection => &["'", "\"", ";", "--"],
            ThreatCategory::ShellMetacharacters => &["&", "|", "`"],
            ThreatCategory::PathTraversal => &[".."],
            ThreatCategory::TemplateInjection => &["${", "{{"],
            ThreatCategory::ScriptUri => &["javascript:", "data:", "vbscript:"],
        }
    }

    fn matches(&self, input: &str) -> bool {
        match self {
            ThreatCategory::ScriptUri => {
                let lowered = input.to_ascii_lowercase();
                self.patterns().iter().any(|p| lowered.contains(p))
            }
            _ => self.patterns().iter().any(|p| input.contains(p)),
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First threat category found in `input`, if any.
pub fn scan(input: &str) -> Option<ThreatCategory> {
    ThreatCategory::ALL.into_iter().find(|c| c.matches(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_codes_pass() {
        for code in ["USD", "eur", "XYZ", "US", "", "U.S"] {
            assert_eq!(scan(code), None, "{code}");
        }
    }

    #[test]
    fn test_each_category() {
        assert_eq!(scan("<b>"), Some(ThreatCategory::HtmlTags));
        assert_eq!(scan("US'"), Some(ThreatCategory::SqlInjection));
        assert_eq!(scan("1--"), Some(ThreatCategory::SqlInjection));
        assert_eq!(scan("a|b"), Some(ThreatCategory::ShellMetacharacters));
        assert_eq!(scan("`ls`"), Some(ThreatCategory::ShellMetacharacters));
        assert_eq!(scan("../etc"), Some(ThreatCategory::PathTraversal));
        assert_eq!(scan("${x}"), Some(ThreatCategory::TemplateInjection));
        assert_eq!(scan("{{7*7}}"), Some(ThreatCategory::TemplateInjection));
        assert_eq!(scan("JavaScript:alert"), Some(ThreatCategory::ScriptUri));
        assert_eq!(scan("data:text"), Some(ThreatCategory::ScriptUri));
    }

    #[test]
    fn test_scan_order_prefers_earlier_category() {
        // ';' is both SQL and shell; SQL is checked first.
        assert_eq!(scan(";"), Some(ThreatCategory::SqlInjection));
        assert_eq!(scan("<script>javascript:</script>"), Some(ThreatCategory::HtmlTags));
    }
}
