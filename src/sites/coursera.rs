//! Coursera course page extractor.
//!
//! Per course: read the "Approx ... to complete" duration from the detail
//! list, click enroll, work out which pricing modal opened, and read the
//! price from it (going through the subscription "next" step if needed).
//!
//! Unlike the Udemy loop, an unexpected browser error here ends the whole
//! batch.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::browser::{Driver, DriverError, Session};
use crate::config::CourseraSelectors;
use crate::duration;
use crate::types::{CourseraCourse, InputRow};

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)approx(?:imately)?\.?\s*(.*?)\s*to complete").expect("duration regex is valid")
});

/// Pricing modal shown after clicking enroll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    FreeTrial,
    SubscriptionChoice,
    EnrollChoice,
}

impl ModalKind {
    /// Match order; the first kind whose fragment is found wins
    pub const ALL: [ModalKind; 3] = [
        ModalKind::FreeTrial,
        ModalKind::SubscriptionChoice,
        ModalKind::EnrollChoice,
    ];

    fn class_fragment(self, selectors: &CourseraSelectors) -> &str {
        match self {
            ModalKind::FreeTrial => &selectors.free_trial_modal,
            ModalKind::SubscriptionChoice => &selectors.subscription_modal,
            ModalKind::EnrollChoice => &selectors.enroll_modal,
        }
    }

    /// Identify a modal from its class attribute
    pub fn classify(class_attr: &str, selectors: &CourseraSelectors) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| class_attr.contains(kind.class_fragment(selectors)))
    }
}

/// Phrase between "Approx[imately]" and "to complete", if present
pub fn extract_duration(text: &str) -> Option<String> {
    DURATION_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|phrase| !phrase.is_empty())
}

/// Scrape every row in order, stopping at the first unexpected error.
pub async fn scrape_courses<D: Driver>(
    session: &Session<D>,
    selectors: &CourseraSelectors,
    rows: &[InputRow],
) -> Result<Vec<CourseraCourse>, DriverError> {
    let mut courses = Vec::with_capacity(rows.len());
    for row in rows {
        courses.push(scrape_course(session, selectors, row).await?);
    }
    info!("Scraped {}/{} Coursera courses", courses.len(), rows.len());
    Ok(courses)
}

/// Scrape one course page.
pub async fn scrape_course<D: Driver>(
    session: &Session<D>,
    selectors: &CourseraSelectors,
    row: &InputRow,
) -> Result<CourseraCourse, DriverError> {
    let mut course = CourseraCourse::empty(row);

    session.goto(&row.url).await?;

    course.duration = read_duration(session, selectors).await?;
    course.content_length = duration::to_hours(&course.duration);

    course.price = read_price(session, selectors).await?.unwrap_or_default();
    if course.price.is_empty() {
        warn!("No price found for {}", row.url);
    }

    Ok(course)
}

async fn read_duration<D: Driver>(
    session: &Session<D>,
    selectors: &CourseraSelectors,
) -> Result<String, DriverError> {
    for element in session.find_visible_elements(&selectors.course_details).await? {
        let text = session.text(Some(&element)).await?;
        if text.starts_with(selectors.approx_prefix.as_str()) {
            return Ok(extract_duration(&text).unwrap_or_default());
        }
    }
    Ok(String::new())
}

/// Click through enrollment to the price; `None` when any step is missing
async fn read_price<D: Driver>(
    session: &Session<D>,
    selectors: &CourseraSelectors,
) -> Result<Option<String>, DriverError> {
    let timeout = session.timeout();

    let Some(enroll) = session
        .wait_for_element(&selectors.enroll_button, timeout)
        .await?
    else {
        return Ok(None);
    };
    session.click(&enroll).await?;

    let Some(kind) = wait_for_modal(session, selectors).await? else {
        return Ok(None);
    };
    info!("Enroll opened {:?} modal", kind);

    if kind == ModalKind::SubscriptionChoice {
        let Some(next) = session
            .wait_until_clickable(&selectors.next_button, timeout)
            .await?
        else {
            return Ok(None);
        };
        session.click(&next).await?;
    }

    let price = session
        .wait_for_text_containing(&selectors.price, &selectors.currency, timeout)
        .await?;
    Ok(price.map(|text| text.replace(selectors.currency.as_str(), "").trim().to_string()))
}

async fn wait_for_modal<D: Driver>(
    session: &Session<D>,
    selectors: &CourseraSelectors,
) -> Result<Option<ModalKind>, DriverError> {
    let timeout = session.timeout();
    let kind = session
        .poll(timeout, move || async move {
            for modal in session.find_elements(&selectors.modal).await? {
                match session.attribute(&modal, "class").await {
                    Ok(class_attr) => {
                        if let Some(kind) = ModalKind::classify(&class_attr, selectors) {
                            return Ok(Some(kind));
                        }
                    }
                    Err(DriverError::StaleElement) => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(None)
        })
        .await?;

    if kind.is_none() {
        warn!("Timed out after {:?} waiting for enroll modal", timeout);
    }
    Ok(kind)
}
