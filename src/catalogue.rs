//! Canned response catalogue
//!
//! Reply texts and news items live in an embedded JSON document so a real
//! data source can replace them without touching the dispatcher.

use crate::market::{NewsBundle, NewsItem};
use serde::Deserialize;
use thiserror::Error;

const BUILTIN_CATALOGUE: &str = include_str!("catalogue/catalogue.json");

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("catalogue is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalogue field `{0}` must not be empty")]
    Empty(&'static str),
}

/// Fixed texts and news used to build assistant replies
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Catalogue {
    /// First message of every conversation
    pub greeting: String,
    /// Reply when the message asks for neither a chart nor news
    pub plain_reply: String,
    /// Text accompanying a chart reply
    pub chart_reply: String,
    /// Text accompanying a news reply
    pub news_reply: String,
    /// Ticker every chart and news reply is about
    pub ticker: String,
    pub news: Vec<NewsItem>,
}

impl Catalogue {
    /// The catalogue compiled into the crate
    pub fn builtin() -> Result<Self, CatalogueError> {
        Self::from_json(BUILTIN_CATALOGUE)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogueError> {
        let catalogue: Catalogue = serde_json::from_str(json)?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    fn validate(&self) -> Result<(), CatalogueError> {
        let required = [
            ("greeting", &self.greeting),
            ("plain_reply", &self.plain_reply),
            ("chart_reply", &self.chart_reply),
            ("news_reply", &self.news_reply),
            ("ticker", &self.ticker),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogueError::Empty(name));
            }
        }
        Ok(())
    }

    /// News for the catalogue ticker, in catalogue order
    pub fn news_bundle(&self) -> NewsBundle {
        NewsBundle::new(&self.ticker, self.news.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{Impact, Sentiment};

    #[test]
    fn test_builtin_catalogue_parses() {
        let catalogue = Catalogue::builtin().unwrap();
        assert_eq!(catalogue.ticker, "TSLA");
        assert_eq!(catalogue.news.len(), 4);
        assert!(catalogue.greeting.starts_with("Hello!"));
    }

    #[test]
    fn test_news_bundle_keeps_order() {
        let catalogue = Catalogue::builtin().unwrap();
        let bundle = catalogue.news_bundle();
        assert_eq!(bundle.ticker, "TSLA");
        let ids: Vec<&str> = bundle.items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["tsla-1", "tsla-2", "tsla-3", "tsla-4"]);
        assert_eq!(bundle.items[0].sentiment, Sentiment::Positive);
        assert_eq!(bundle.items[0].impact, Impact::High);
        assert!(bundle.items[2].url.is_none());
    }

    #[test]
    fn test_empty_field_rejected() {
        let json = r#"{
            "greeting": "hi",
            "plain_reply": "plain",
            "chart_reply": "chart",
            "news_reply": "news",
            "ticker": "  ",
            "news": []
        }"#;
        assert!(matches!(
            Catalogue::from_json(json),
            Err(CatalogueError::Empty("ticker"))
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Catalogue::from_json("{"),
            Err(CatalogueError::Parse(_))
        ));
    }
}
