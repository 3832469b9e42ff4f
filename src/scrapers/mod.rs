use scraper::Selector;

use crate::config::SelectorConfig;
use crate::error::{IngestError, Result};

mod links;
mod records;

pub use links::discover_links;
pub use records::extract_records;

/// Class-name patterns tried when no table and no configured row selector match.
pub const DEFAULT_BLOCK_SELECTOR: &str =
    "div.student, li.student, article.student, .student-row, .student-item, .student-card, .student-record";
pub const DEFAULT_LIST_ITEM_SELECTOR: &str = "li";

const DEFAULT_NAME_SELECTOR: &str = ".name, .student-name, [itemprop=name]";
const DEFAULT_CLASS_SELECTOR: &str = ".class, .classes, .class-name, .course, .courses, .subject";
const DEFAULT_GRADE_SELECTOR: &str = ".grade, .grades, .score, .scores";
const DEFAULT_EMAIL_SELECTOR: &str = ".email, a[href^='mailto:']";
const DEFAULT_AGE_SELECTOR: &str = ".age";

/// Selector set used by the extractor and link discoverer, compiled once per run.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub row: Option<Selector>,
    pub blocks: Selector,
    pub list_items: Selector,
    pub name: Selector,
    pub class: Selector,
    pub grade: Selector,
    pub email: Selector,
    pub age: Selector,
    pub link: Option<Selector>,
}

impl Selectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self> {
        let or_default = |configured: &Option<String>, fallback: &str| {
            parse_selector(configured.as_deref().unwrap_or(fallback))
        };

        Ok(Self {
            row: config.row.as_deref().map(parse_selector).transpose()?,
            blocks: parse_selector(DEFAULT_BLOCK_SELECTOR)?,
            list_items: parse_selector(DEFAULT_LIST_ITEM_SELECTOR)?,
            name: or_default(&config.name, DEFAULT_NAME_SELECTOR)?,
            class: or_default(&config.class, DEFAULT_CLASS_SELECTOR)?,
            grade: or_default(&config.grade, DEFAULT_GRADE_SELECTOR)?,
            email: or_default(&config.email, DEFAULT_EMAIL_SELECTOR)?,
            age: or_default(&config.age, DEFAULT_AGE_SELECTOR)?,
            link: config.link.as_deref().map(parse_selector).transpose()?,
        })
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self::compile(&SelectorConfig::default()).expect("built-in selectors are valid")
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| IngestError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
