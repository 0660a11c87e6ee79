//! Market payloads attached to assistant replies

mod news;
pub mod series;

pub use news::{Impact, NewsBundle, NewsItem, Sentiment};
pub use series::{ChartSeries, PricePoint, SeriesError, SeriesGenerator};
