//! Assistant reply composition
//!
//! Turns a classified turn into the assistant message that will be
//! delivered: catalogue text plus a chart or news payload.

use crate::catalogue::Catalogue;
use crate::classifier::Category;
use crate::conversation::{Message, MessageId};
use crate::market::SeriesGenerator;
use chrono::NaiveDate;
use rand::rngs::StdRng;

pub struct ReplyComposer {
    catalogue: Catalogue,
    series: SeriesGenerator<StdRng>,
}

impl ReplyComposer {
    pub fn new(catalogue: Catalogue, series: SeriesGenerator<StdRng>) -> Self {
        Self { catalogue, series }
    }

    /// Composer seeded for reproducible charts, or from entropy
    pub fn from_seed(catalogue: Catalogue, seed: Option<u64>) -> Self {
        let series = seed.map_or_else(SeriesGenerator::from_entropy, SeriesGenerator::seeded);
        Self::new(catalogue, series)
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Build the reply for `category`. Charts are dated relative to `today`.
    pub fn compose(&mut self, category: Category, today: NaiveDate) -> Message {
        let id = MessageId::next();
        match category {
            Category::Chart => match self.series.generate(&self.catalogue.ticker, today) {
                Ok(chart) => {
                    Message::assistant(id, &self.catalogue.chart_reply).with_chart(chart)
                }
                Err(e) => {
                    tracing::warn!(error = %e, ticker = %self.catalogue.ticker, "Synthetic series anomaly, replying without chart");
                    Message::assistant(id, &self.catalogue.plain_reply)
                }
            },
            Category::News => Message::assistant(id, &self.catalogue.news_reply)
                .with_news(self.catalogue.news_bundle()),
            Category::Plain => Message::assistant(id, &self.catalogue.plain_reply),
        }
    }
}
