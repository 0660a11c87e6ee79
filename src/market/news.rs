//! News items and bundles

use serde::{Deserialize, Serialize};

/// Market mood of a news item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Label shown on the news card
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Bullish",
            Sentiment::Negative => "Bearish",
            Sentiment::Neutral => "Neutral",
        }
    }
}

/// Expected market effect of a news item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn label(self) -> &'static str {
        match self {
            Impact::High => "High Impact",
            Impact::Medium => "Medium Impact",
            Impact::Low => "Low Impact",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub source: String,
    pub timestamp: String,
    pub sentiment: Sentiment,
    pub impact: Impact,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// News for one ticker, in display order (most relevant first)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsBundle {
    pub ticker: String,
    pub items: Vec<NewsItem>,
}

impl NewsBundle {
    pub fn new(ticker: impl Into<String>, items: Vec<NewsItem>) -> Self {
        Self {
            ticker: ticker.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
