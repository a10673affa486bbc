//! HTML parser for Kijiji search-results and listing pages.
//!
//! Parsing never fails: a missing marker degrades the affected field to `None`
//! (or the page to zero cards) and the caller decides what that means.

use crate::site::models::{ListingDetails, ListingSummary};
use crate::site::selectors::{detail, results};
use scraper::{ElementRef, Html};
use tracing::{debug, trace};
use url::Url;

/// Extracts every listing card from a search-results page.
///
/// Relative links are resolved against `page_url`. Cards without a title link
/// are skipped.
pub fn parse_summaries(html: &str, page_url: &str) -> Vec<ListingSummary> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let summaries: Vec<ListingSummary> = document
        .select(&results::CARD)
        .filter_map(|card| parse_card(card, base.as_ref()))
        .collect();

    debug!("Parsed {} listing cards from {}", summaries.len(), page_url);
    summaries
}

fn parse_card(card: ElementRef, base: Option<&Url>) -> Option<ListingSummary> {
    let Some(title_el) = card.select(&results::TITLE_LINK).next() else {
        trace!("Skipping card without a title link");
        return None;
    };

    let title = element_text(title_el);
    let href = title_el.value().attr("href")?.trim();
    let link = absolutize(href, base);

    let description =
        card.select(&results::DESCRIPTION).next().map(element_text).unwrap_or_default();

    trace!("Parsed card: {} - {}", title, link);
    Some(ListingSummary { title, link, description })
}

fn absolutize(href: &str, base: Option<&Url>) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    match base.and_then(|b| b.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}

/// Extracts price, address and posting date from a listing page.
pub fn parse_details(html: &str) -> ListingDetails {
    let document = Html::parse_document(html);

    let price = document.select(&detail::PRICE).next().and_then(|el| {
        let raw = el
            .value()
            .attr(detail::PRICE_ATTR)
            .map(String::from)
            .unwrap_or_else(|| el.text().collect::<String>());
        let price = parse_price(&raw);
        if price.is_none() {
            debug!("Unparseable price text: {:?}", raw);
        }
        price
    });

    let address = document.select(&detail::ADDRESS).next().and_then(|el| {
        let text = el.text().collect::<String>();
        text.lines().map(str::trim).find(|line| !line.is_empty()).map(String::from)
    });

    let posted_date = document
        .select(&detail::DATE_POSTED)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty());

    ListingDetails { price, address, posted_date }
}

/// Parses a displayed price such as `"1,234"` or `"$1,234.00"`.
///
/// Surrounding whitespace, a leading `$` and `,` thousands separators are
/// dropped. Whatever remains must be a plain decimal (digits and at most one
/// `.`), otherwise the text is not a price and this returns `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let amount = trimmed.strip_prefix('$').unwrap_or(trimmed).trim_start();
    let cleaned = amount.replace(',', "");

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    cleaned.parse().ok()
}

/// Returns the highest page number advertised by the pagination control.
///
/// A page without a pagination block, or with one that holds no page numbers,
/// counts as a single page.
pub fn parse_page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);

    let highest = document
        .select(&results::PAGINATION_ITEM)
        .filter_map(|item| {
            let from_text = element_text(item).parse::<u32>().ok();
            let from_href = item.value().attr("href").and_then(page_number_in_href);
            from_text.max(from_href)
        })
        .max();

    match highest {
        Some(n) if n > 0 => n,
        _ => {
            debug!("No usable pagination control, assuming a single page");
            1
        }
    }
}

/// Extracts `N` from a `.../page-N/...` link segment.
fn page_number_in_href(href: &str) -> Option<u32> {
    href.split('/')
        .filter_map(|segment| segment.strip_prefix("page-"))
        .find_map(|n| n.parse().ok())
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://www.kijiji.ca/b-apartments-condos/ottawa/c37l1700185";

    // Price parsing tests

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("1,234"), Some(1234.0));
        assert_eq!(parse_price("950.00"), Some(950.0));
        assert_eq!(parse_price("$1,234.50"), Some(1234.5));
        assert_eq!(parse_price(" 800 "), Some(800.0));
    }

    #[test]
    fn test_parse_price_invalid() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("Please Contact"), None);
        assert_eq!(parse_price("Swap / Trade"), None);
        assert_eq!(parse_price("1.2.3"), None);
        assert_eq!(parse_price("."), None);
    }

    #[test]
    fn test_parse_price_rejects_text_with_stray_digits() {
        assert_eq!(parse_price("2 bedrooms"), None);
        assert_eq!(parse_price("2 bedrooms, call for price"), None);
        assert_eq!(parse_price("Please contact - 3 bed"), None);
        assert_eq!(parse_price("$1,234 - $1,500"), None);
    }

    #[test]
    fn test_parse_price_rejects_french_canadian_format() {
        // "1 200,00 $" would read as 120000 if spaces and commas were both dropped
        assert_eq!(parse_price("1 200,00 $"), None);
        assert_eq!(parse_price("950 $"), None);
    }

    #[test]
    fn test_parse_price_rejects_float_spellings() {
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price("inf"), None);
        assert_eq!(parse_price("1e3"), None);
        assert_eq!(parse_price("-800"), None);
    }

    // Summary parsing tests

    #[test]
    fn test_parse_summaries_resolves_relative_links() {
        let html = r#"
            <div class="search-item regular-ad">
                <a class="title" href="/v-apartments-condos/ottawa/studio/100">  Studio  </a>
                <div class="description">  Utilities included </div>
            </div>
        "#;
        let summaries = parse_summaries(html, PAGE_URL);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Studio");
        assert_eq!(summaries[0].link, "https://www.kijiji.ca/v-apartments-condos/ottawa/studio/100");
        assert_eq!(summaries[0].description, "Utilities included");
    }

    #[test]
    fn test_parse_summaries_keeps_absolute_links() {
        let html = r#"<div class="regular-ad"><a class="title" href="https://other.example/v/1">A</a></div>"#;
        let summaries = parse_summaries(html, PAGE_URL);
        assert_eq!(summaries[0].link, "https://other.example/v/1");
    }

    #[test]
    fn test_parse_summaries_skips_cards_without_title() {
        let html = r#"
            <div class="regular-ad"><div class="description">No title here</div></div>
            <div class="regular-ad"><a class="title" href="/v/2">Has title</a></div>
        "#;
        let summaries = parse_summaries(html, PAGE_URL);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Has title");
        assert_eq!(summaries[0].description, "");
    }

    #[test]
    fn test_parse_summaries_empty_page() {
        let summaries = parse_summaries("<html><body></body></html>", PAGE_URL);
        assert!(summaries.is_empty());
    }

    // Detail parsing tests

    #[test]
    fn test_parse_details_full() {
        let html = r#"
            <div class="priceWrapper-1165431705"><span content="1,234">$1,234.00</span></div>
            <span class="address-3617944557">45 Elgin St, Ottawa, ON K1P 5K6
View map</span>
            <div class="datePosted-383942873">  Posted 3 hours ago </div>
        "#;
        let details = parse_details(html);
        assert_eq!(details.price, Some(1234.0));
        assert_eq!(details.address.as_deref(), Some("45 Elgin St, Ottawa, ON K1P 5K6"));
        assert_eq!(details.posted_date.as_deref(), Some("Posted 3 hours ago"));
    }

    #[test]
    fn test_parse_details_price_from_text_without_attr() {
        let html = r#"<div class="priceWrapper-1"><span>$875.00</span></div>"#;
        assert_eq!(parse_details(html).price, Some(875.0));
    }

    #[test]
    fn test_parse_details_unparseable_price() {
        let html = r#"<div class="priceWrapper-1"><span>Please Contact</span></div>"#;
        let details = parse_details(html);
        assert!(details.price.is_none());
    }

    #[test]
    fn test_parse_details_missing_everything() {
        let details = parse_details("<html><body><h1>Listing</h1></body></html>");
        assert_eq!(details, ListingDetails::default());
    }

    #[test]
    fn test_parse_details_fields_degrade_independently() {
        let html = r#"<span class="address-1">12 Rideau St</span>"#;
        let details = parse_details(html);
        assert!(details.price.is_none());
        assert_eq!(details.address.as_deref(), Some("12 Rideau St"));
        assert!(details.posted_date.is_none());
    }

    // Pagination parsing tests

    #[test]
    fn test_parse_page_count_from_numbers() {
        let html = r#"
            <div class="pagination">
                <span class="selected">1</span>
                <a href="/b-apartments-condos/ottawa/page-2/c37l1700185">2</a>
                <a href="/b-apartments-condos/ottawa/page-3/c37l1700185">3</a>
                <a title="Next" href="/b-apartments-condos/ottawa/page-2/c37l1700185">Next</a>
            </div>
        "#;
        assert_eq!(parse_page_count(html), 3);
    }

    #[test]
    fn test_parse_page_count_from_href_only() {
        let html = r#"
            <div class="pagination">
                <a title="Last" href="/b-apartments-condos/ottawa/page-17/c37l1700185">Last</a>
            </div>
        "#;
        assert_eq!(parse_page_count(html), 17);
    }

    #[test]
    fn test_parse_page_count_missing_block() {
        assert_eq!(parse_page_count("<html><body>no pages</body></html>"), 1);
    }

    #[test]
    fn test_parse_page_count_malformed_block() {
        let html = r#"<div class="pagination"><a href="/page-x/">abc</a><span>…</span></div>"#;
        assert_eq!(parse_page_count(html), 1);
    }

    #[test]
    fn test_page_number_in_href() {
        assert_eq!(page_number_in_href("/b-apt/ottawa/page-4/c37"), Some(4));
        assert_eq!(page_number_in_href("/b-apt/ottawa/c37"), None);
        assert_eq!(page_number_in_href("/page-/c37"), None);
    }
}
