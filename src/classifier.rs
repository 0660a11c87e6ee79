//! Keyword classification of user messages
//!
//! Rules are evaluated top-down and the first rule with a matching keyword
//! wins. A message mentioning both a chart and the news is therefore a
//! chart request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of reply a message calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Chart,
    News,
    Plain,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Chart => "chart",
            Category::News => "news",
            Category::Plain => "plain",
        })
    }
}

/// One classification rule: any keyword contained in the text selects
/// `category`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub keywords: Vec<&'static str>,
    pub category: Category,
}

impl Rule {
    pub fn new(keywords: &[&'static str], category: Category) -> Self {
        Self {
            keywords: keywords.to_vec(),
            category,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Ordered rule table with a fallback category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    rules: Vec<Rule>,
    fallback: Category,
}

impl Default for Classifier {
    /// Chart rules first, then news, then plain text
    fn default() -> Self {
        Self::new(vec![
            Rule::new(&["chart", "price", "stock"], Category::Chart),
            Rule::new(&["news", "latest"], Category::News),
        ])
    }
}

impl Classifier {
    /// Classifier over `rules` in priority order, falling back to plain
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            fallback: Category::Plain,
        }
    }

    /// Classifier that only recognises news requests
    pub fn news_only() -> Self {
        Self::new(vec![Rule::new(&["news", "latest"], Category::News)])
    }

    /// Classify raw user text. Matching is case-insensitive.
    pub fn classify(&self, text: &str) -> Category {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map_or(self.fallback, |rule| rule.category)
    }
}
