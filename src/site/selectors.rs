//! CSS selectors for Kijiji HTML parsing.
//!
//! Every structural marker the scraper depends on lives here. Kijiji suffixes
//! many class names with a build hash (`priceWrapper-1165431705`), so detail
//! selectors match on the stable prefix.
//!
//! **Update process**: When parsing fails, save the page to
//! `tests/fixtures/`, update selectors, and extend the fixture tests.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for search-results pages.
pub mod results {
    use super::*;

    /// Listing card container.
    pub static CARD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.regular-ad").unwrap());

    /// Title anchor inside a card; carries the relative link.
    pub static TITLE_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a.title").unwrap());

    /// Short description inside a card.
    pub static DESCRIPTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.description").unwrap());

    /// Entries of the pagination control (page numbers, current page, next).
    pub static PAGINATION_ITEM: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "div.pagination a, \
             div.pagination span, \
             [data-testid='pagination-list-item'] a, \
             [data-testid='pagination-list-item'] span",
        )
        .unwrap()
    });
}

/// Selectors for individual listing pages.
pub mod detail {
    use super::*;

    /// Price wrapper; the amount sits on a child span.
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[class*='priceWrapper'] span").unwrap());

    /// Attribute holding the machine-readable price.
    pub const PRICE_ATTR: &str = "content";

    /// Address block.
    pub static ADDRESS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[class*='address']").unwrap());

    /// Posting date.
    pub static DATE_POSTED: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[class*='datePosted']").unwrap());
}
