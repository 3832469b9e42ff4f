use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use url::Url;

use crate::scrapers::Selectors;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Invalid anchor selector")
});

static TABLE_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Invalid table row selector")
});

const LINK_KEYWORDS: &[&str] = &["profile", "details", "student"];

/// Find detail-page links in a document, resolved against `base_url`.
///
/// A configured link selector is used as-is. Otherwise anchors are kept when their text
/// mentions a profile/details/student, when their parent element has a "student" class,
/// or when they are the first anchor of a table row. Only http(s) links are returned,
/// without fragments and without duplicates.
pub fn discover_links(html: &str, base_url: &Url, selectors: &Selectors) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();

    if let Some(link_selector) = &selectors.link {
        for element in document.select(link_selector) {
            let href = element.value().attr("href").or_else(|| {
                element
                    .select(&ANCHOR_SELECTOR)
                    .next()
                    .and_then(|anchor| anchor.value().attr("href"))
            });
            if let Some(url) = href.and_then(|href| resolve(base_url, href)) {
                links.insert(url);
            }
        }
        return links.into_iter().collect();
    }

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let text = anchor.text().collect::<String>().to_lowercase();
        let keyword_match = LINK_KEYWORDS.iter().any(|keyword| text.contains(keyword));

        if keyword_match || parent_has_student_class(anchor) {
            if let Some(url) = anchor_url(anchor, base_url) {
                links.insert(url);
            }
        }
    }

    for row in document.select(&TABLE_ROW_SELECTOR) {
        if let Some(url) = row
            .select(&ANCHOR_SELECTOR)
            .next()
            .and_then(|anchor| anchor_url(anchor, base_url))
        {
            links.insert(url);
        }
    }

    links.into_iter().collect()
}

fn parent_has_student_class(anchor: ElementRef) -> bool {
    anchor
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|parent| parent.value().attr("class"))
        .map_or(false, |class| class.to_lowercase().contains("student"))
}

fn anchor_url(anchor: ElementRef, base_url: &Url) -> Option<Url> {
    anchor
        .value()
        .attr("href")
        .and_then(|href| resolve(base_url, href))
}

fn resolve(base_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
