//! Udemy course page extractor.

use tracing::{error, info, warn};

use crate::browser::{Driver, DriverError, Session};
use crate::config::UdemySelectors;
use crate::duration;
use crate::types::{InputRow, UdemyCourse};

/// Scrape every row in order.
///
/// A row that fails with an unexpected browser error is logged and dropped;
/// the loop moves on to the next URL.
pub async fn scrape_courses<D: Driver>(
    session: &Session<D>,
    selectors: &UdemySelectors,
    rows: &[InputRow],
) -> Vec<UdemyCourse> {
    let mut courses = Vec::with_capacity(rows.len());
    let mut follow_up = Vec::new();

    for row in rows {
        match scrape_course(session, selectors, row).await {
            Ok(course) => {
                if course.needs_follow_up() {
                    warn!("Missing price, check manually: {}", row.url);
                    follow_up.push(row.url.as_str());
                }
                courses.push(course);
            }
            Err(e) => error!("Skipping {}: {}", row.url, e),
        }
    }

    info!("Scraped {}/{} Udemy courses", courses.len(), rows.len());
    if !follow_up.is_empty() {
        warn!("{} courses need manual follow-up: {}", follow_up.len(), follow_up.join(", "));
    }
    courses
}

/// Scrape one course page.
pub async fn scrape_course<D: Driver>(
    session: &Session<D>,
    selectors: &UdemySelectors,
    row: &InputRow,
) -> Result<UdemyCourse, DriverError> {
    session.goto(&row.url).await?;

    let price = session
        .wait_for_element(&selectors.price, session.timeout())
        .await?;
    let price = session.text(price.as_ref()).await?;

    // Rendered together with the price
    let with_discount = session.find_element(&selectors.with_discount).await?;
    let with_discount = session.text(with_discount.as_ref()).await?;

    let length = session.find_element(&selectors.content_length).await?;
    let length = session.text(length.as_ref()).await?;
    let length = length
        .strip_suffix(selectors.length_suffix.as_str())
        .unwrap_or(&length);

    Ok(UdemyCourse {
        id: row.index,
        url: row.url.clone(),
        price: strip_currency(&price, &selectors.currency),
        with_discount: strip_currency(&with_discount, &selectors.currency),
        content_length: duration::to_hours(length),
    })
}

fn strip_currency(text: &str, currency: &str) -> String {
    text.trim_start_matches(currency).trim().to_string()
}
