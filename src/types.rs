//! Input rows and scraped course records.

use serde::Serialize;

/// One URL read from the input spreadsheet, tagged with its row position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub index: usize,
    pub url: String,
}

impl InputRow {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }
}

/// Scraped Udemy course. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UdemyCourse {
    pub id: usize,
    pub url: String,
    pub price: String,
    pub with_discount: String,
    /// Hours of video; empty in the CSV when the length text was unparseable
    pub content_length: Option<f64>,
}

impl UdemyCourse {
    /// Price or discount came back empty and the page should be checked by hand.
    pub fn needs_follow_up(&self) -> bool {
        self.price.is_empty() || self.with_discount.is_empty()
    }
}

/// Scraped Coursera course. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseraCourse {
    pub id: usize,
    pub url: String,
    /// Phrase between "Approx" and "to complete", e.g. "13 hours"
    pub duration: String,
    pub content_length: Option<f64>,
    pub price: String,
}

impl CourseraCourse {
    /// Record with nothing but identity filled in.
    pub fn empty(row: &InputRow) -> Self {
        Self {
            id: row.index,
            url: row.url.clone(),
            duration: String::new(),
            content_length: None,
            price: String::new(),
        }
    }
}
