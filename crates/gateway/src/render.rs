//! Report rendering for the dashboard
//!
//! Splits the markdown report into display blocks and tags lines that carry a
//! severity marker such as `(HIGH)` or `[CRITICAL]`. The `**Q:**` and `**A:**`
//! lines and the italic closing line get their own block kinds.

use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Title { text: String },
    Section { text: String },
    Question { text: String },
    Answer { text: String },
    Item {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    Rule,
    Attribution { text: String },
}

static SEVERITY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\(\[](LOW|MEDIUM|HIGH|CRITICAL)[\)\]]").expect("severity tag pattern")
});

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s+").expect("list item pattern"));

/// Highest severity tagged on a line
pub fn severity_of(line: &str) -> Option<Severity> {
    SEVERITY_TAG
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).and_then(|m| Severity::parse(m.as_str())))
        .max_by_key(|s| *s as u8)
}

/// Text of a line wrapped in single asterisks
fn italic(line: &str) -> Option<&str> {
    if line.starts_with("**") {
        return None;
    }
    line.strip_prefix('*')
        .and_then(|rest| rest.strip_suffix('*'))
        .filter(|text| !text.is_empty())
}

/// Parse a report into display blocks; blank lines are dropped
pub fn render_blocks(report: &str) -> Vec<Block> {
    report
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if let Some(text) = line.strip_prefix("# ") {
                Block::Title { text: text.to_string() }
            } else if let Some(text) = line.strip_prefix("## ") {
                Block::Section { text: text.to_string() }
            } else if let Some(text) = line.strip_prefix("**Q:**") {
                Block::Question { text: text.trim().to_string() }
            } else if let Some(text) = line.strip_prefix("**A:**") {
                Block::Answer { text: text.trim().to_string() }
            } else if line == "---" {
                Block::Rule
            } else if LIST_ITEM.is_match(line) {
                Block::Item {
                    text: line.to_string(),
                    severity: severity_of(line),
                }
            } else if let Some(text) = italic(line) {
                Block::Attribution { text: text.to_string() }
            } else {
                Block::Text {
                    text: line.to_string(),
                    severity: severity_of(line),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintel_common::workflow::{compose_report, ATTRIBUTION};
    use docintel_common::WorkRecord;

    #[test]
    fn test_severity_tags() {
        assert_eq!(severity_of("1. Unlimited liability (HIGH)"), Some(Severity::High));
        assert_eq!(severity_of("- Auto-renewal [MEDIUM]"), Some(Severity::Medium));
        assert_eq!(severity_of("Low and high risk, no tag"), None);
        assert_eq!(severity_of("(LOW) then (CRITICAL)"), Some(Severity::Critical));
    }

    #[test]
    fn test_render_report() {
        let report = "\n# DOCUMENT INTELLIGENCE REPORT\n\n## Question & Answer\n**Q:** Riskiest?\n**A:** Contract B\n\n## Risk Analysis\n1. Liability (HIGH)\n- Renewal\nPlain text\n\n---\n*footer*\n";
        let blocks = render_blocks(report);

        assert_eq!(
            blocks,
            vec![
                Block::Title { text: "DOCUMENT INTELLIGENCE REPORT".into() },
                Block::Section { text: "Question & Answer".into() },
                Block::Question { text: "Riskiest?".into() },
                Block::Answer { text: "Contract B".into() },
                Block::Section { text: "Risk Analysis".into() },
                Block::Item { text: "1. Liability (HIGH)".into(), severity: Some(Severity::High) },
                Block::Item { text: "- Renewal".into(), severity: None },
                Block::Text { text: "Plain text".into(), severity: None },
                Block::Rule,
                Block::Attribution { text: "footer".into() },
            ]
        );
    }

    #[test]
    fn test_composed_report_blocks() {
        let blocks = render_blocks(&compose_report(&WorkRecord::new(None, "excerpt")));

        assert_eq!(blocks[0], Block::Title { text: "DOCUMENT INTELLIGENCE REPORT".into() });
        assert!(blocks.contains(&Block::Question { text: String::new() }));
        assert!(blocks.contains(&Block::Answer { text: "N/A".into() }));
        assert!(!blocks.contains(&Block::Text { text: "**A:** N/A".into(), severity: None }));
        assert_eq!(
            blocks.last(),
            Some(&Block::Attribution {
                text: ATTRIBUTION.trim_matches('*').to_string()
            })
        );
    }

    #[test]
    fn test_block_json_shape() {
        let json = serde_json::to_value(Block::Item {
            text: "1. Risk (LOW)".into(),
            severity: Some(Severity::Low),
        })
        .unwrap();
        assert_eq!(json["kind"], "item");
        assert_eq!(json["severity"], "low");
    }
}
