use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{FieldValue, RawRecord};
use crate::parsers::clean_text;
use crate::scrapers::Selectors;

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Invalid table selector")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Invalid row selector")
});

static HEADER_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("thead tr").expect("Invalid header row selector")
});

// Separators for unstructured blocks: text-node boundaries (joined as "|") or a spaced dash/colon.
static FALLBACK_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\|\s*|\s+[-–:]\s+").expect("Invalid fallback separator regex")
});

/// Field names assigned, in order, to the tokens of an unstructured block.
const FALLBACK_FIELDS: [&str; 3] = ["name", "class", "grade"];

/// Locate the repeating record structure of one document and return its raw records.
///
/// Preference order: the first `<table>`, then the configured row selector, then
/// common student block classes, then plain `<li>` elements. Records with no
/// fields are dropped.
pub fn extract_records(html: &str, selectors: &Selectors) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    if let Some(table) = document.select(&TABLE_SELECTOR).next() {
        let records = extract_table(table);
        debug!("Extracted {} records from table", records.len());
        return records;
    }

    let candidates = [
        ("row selector", selectors.row.as_ref()),
        ("student blocks", Some(&selectors.blocks)),
        ("list items", Some(&selectors.list_items)),
    ];

    for (strategy, selector) in candidates {
        let Some(selector) = selector else {
            continue;
        };

        let elements: Vec<ElementRef> = document.select(selector).collect();
        if elements.is_empty() {
            continue;
        }

        let records: Vec<RawRecord> = elements
            .into_iter()
            .map(|element| extract_block(element, selectors))
            .filter(|record| !record.is_empty())
            .collect();

        debug!("Extracted {} records using {}", records.len(), strategy);
        return records;
    }

    debug!("No record structure found in document");
    Vec::new()
}

fn extract_table(table: ElementRef) -> Vec<RawRecord> {
    let rows: Vec<ElementRef> = table.select(&ROW_SELECTOR).collect();
    let Some(first_row) = rows.first() else {
        return Vec::new();
    };

    // A <thead> supplies the headers and none of its rows are data; otherwise the first row does.
    let (header_row, data_rows): (ElementRef, Vec<ElementRef>) =
        match table.select(&HEADER_ROW_SELECTOR).next() {
            Some(head) => (
                head,
                rows.iter().copied().filter(|row| !in_thead(*row)).collect(),
            ),
            None => (*first_row, rows.iter().skip(1).copied().collect()),
        };

    let headers = column_names(
        row_cells(header_row)
            .map(|cell| header_name(&element_text(cell)))
            .collect(),
    );

    data_rows
        .into_iter()
        .map(|row| {
            let mut record = RawRecord::new();
            for (index, cell) in row_cells(row).enumerate() {
                let value = element_text(cell);
                if value.is_empty() {
                    continue;
                }

                let field = headers
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| format!("col_{}", index + 1));
                record.insert(&field, FieldValue::Text(value));
            }
            record
        })
        .filter(|record| !record.is_empty())
        .collect()
}

/// Blank and repeated headers fall back to their positional `col_<n>` name.
fn column_names(headers: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (index, header) in headers.into_iter().enumerate() {
        if header.is_empty() || names.contains(&header) {
            names.push(format!("col_{}", index + 1));
        } else {
            names.push(header);
        }
    }
    names
}

fn in_thead(row: ElementRef) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "thead")
}

fn row_cells<'a>(row: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
}

fn header_name(text: &str) -> String {
    text.trim().to_lowercase()
}

fn extract_block(element: ElementRef, selectors: &Selectors) -> RawRecord {
    let mut record = RawRecord::new();

    let sub_fields = [
        ("name", &selectors.name),
        ("class", &selectors.class),
        ("grade", &selectors.grade),
        ("email", &selectors.email),
        ("age", &selectors.age),
    ];

    for (field, selector) in sub_fields {
        // Containers such as `.classes` around `.class` items only count when they hold no match.
        let values: Vec<String> = element
            .select(selector)
            .filter(|sub| sub.select(selector).next().is_none())
            .map(|sub| sub_field_text(sub, field))
            .filter(|text| !text.is_empty())
            .collect();

        if !values.is_empty() {
            record.insert(field, FieldValue::from(values));
        }
    }

    if record.is_empty() {
        let flattened = element
            .text()
            .map(clean_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");

        let tokens = FALLBACK_SEPARATOR
            .split(&flattened)
            .map(str::trim)
            .filter(|token| !token.is_empty());

        for (field, token) in FALLBACK_FIELDS.iter().zip(tokens) {
            record.insert(field, FieldValue::Text(token.to_string()));
        }
    }

    record
}

fn sub_field_text(element: ElementRef, field: &str) -> String {
    if field == "email" {
        if let Some(address) = mailto_address(element) {
            return address;
        }
    }
    element_text(element)
}

fn mailto_address(element: ElementRef) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    let address = href.strip_prefix("mailto:")?;
    let address = address.split('?').next().unwrap_or_default();
    let address = clean_text(address);
    (!address.is_empty()).then_some(address)
}

fn element_text(element: ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    #[test]
    fn table_rows_become_records_with_synthetic_columns() {
        let html = r#"
        <table>
          <tr><th>Name</th><th>Class</th></tr>
          <tr><td>Alice</td><td>Math</td><td>extra-a</td></tr>
          <tr><td>Bob</td><td>Art</td><td>extra-b</td></tr>
        </table>
        "#;

        let records = extract_records(html, &Selectors::default());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&text("Alice")));
        assert_eq!(records[0].get("class"), Some(&text("Math")));
        assert_eq!(records[0].get("col_3"), Some(&text("extra-a")));
        assert_eq!(records[1].get("col_3"), Some(&text("extra-b")));
    }

    #[test]
    fn thead_supplies_headers() {
        let html = r#"
        <table>
          <thead><tr><th> Full Name </th><th>Score</th></tr></thead>
          <tbody>
            <tr><td>Carol   King</td><td>[9]</td></tr>
            <tr><td></td><td></td></tr>
          </tbody>
        </table>
        "#;

        let records = extract_records(html, &Selectors::default());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("full name"), Some(&text("Carol King")));
        assert_eq!(records[0].get("score"), Some(&text("[9]")));
    }

    #[test]
    fn configured_row_selector_with_sub_fields() {
        let html = r#"
        <div class="card">
          <span class="name">Dana</span>
          <span class="course">Math</span><span class="course">Art</span>
          <span class="score">91</span>
          <a href="mailto:dana@example.com"></a>
          <span class="age">14</span>
        </div>
        "#;
        let selectors = crate::config::SelectorConfig {
            row: Some("div.card".to_string()),
            ..Default::default()
        }
        .compile()
        .unwrap();

        let records = extract_records(html, &selectors);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.get("name"), Some(&text("Dana")));
        assert_eq!(
            record.get("class"),
            Some(&FieldValue::List(vec!["Math".to_string(), "Art".to_string()]))
        );
        assert_eq!(record.get("grade"), Some(&text("91")));
        assert_eq!(record.get("email"), Some(&text("dana@example.com")));
        assert_eq!(record.get("age"), Some(&text("14")));
    }

    #[test]
    fn student_blocks_are_found_without_configuration() {
        let html = r#"
        <section>
          <div class="student"><p class="student-name">Eve</p><p class="grade">77%</p></div>
          <div class="student"><p class="student-name">Finn</p></div>
        </section>
        "#;

        let records = extract_records(html, &Selectors::default());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&text("Eve")));
        assert_eq!(records[0].get("grade"), Some(&text("77%")));
        assert_eq!(records[1].get("name"), Some(&text("Finn")));
    }

    #[test]
    fn unstructured_list_items_are_split_positionally() {
        let html = r#"
        <ul>
          <li>Gina - History - 82</li>
          <li><b>Hank</b> | Art</li>
          <li>   </li>
        </ul>
        "#;

        let records = extract_records(html, &Selectors::default());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&text("Gina")));
        assert_eq!(records[0].get("class"), Some(&text("History")));
        assert_eq!(records[0].get("grade"), Some(&text("82")));
        assert_eq!(records[1].get("name"), Some(&text("Hank")));
        assert_eq!(records[1].get("class"), Some(&text("Art")));
        assert_eq!(records[1].get("grade"), None);
    }

    #[test]
    fn nested_sub_field_containers_are_not_values() {
        let html = r#"
        <div class="student">
          <span class="name">Ann</span>
          <div class="classes"><span class="class">Math</span><span class="class">Art</span></div>
          <div class="grades"><span class="grade">90</span><span class="grade">85</span></div>
        </div>
        "#;

        let records = extract_records(html, &Selectors::default());

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].get("class"),
            Some(&FieldValue::List(vec!["Math".to_string(), "Art".to_string()]))
        );
        assert_eq!(
            records[0].get("grade"),
            Some(&FieldValue::List(vec!["90".to_string(), "85".to_string()]))
        );
    }

    #[test]
    fn mailto_address_wins_over_link_text() {
        let html = r#"
        <div class="student">
          <span class="name">Alice</span>
          <a href="mailto:alice@example.com?subject=Hi">Email</a>
        </div>
        <div class="student">
          <span class="name">Bob</span>
          <span class="email">bob@example.com</span>
        </div>
        "#;

        let records = extract_records(html, &Selectors::default());

        assert_eq!(records[0].get("email"), Some(&text("alice@example.com")));
        assert_eq!(records[1].get("email"), Some(&text("bob@example.com")));
    }

    #[test]
    fn repeated_headers_keep_both_columns() {
        let html = r#"
        <table>
          <thead>
            <tr><th>Name</th><th>Class</th><th>Class</th><th></th></tr>
            <tr><th>student</th><th>first</th><th>second</th><th></th></tr>
          </thead>
          <tbody>
            <tr><td>Alice</td><td>Math</td><td>Art</td><td>note</td></tr>
          </tbody>
        </table>
        "#;

        let records = extract_records(html, &Selectors::default());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("class"), Some(&text("Math")));
        assert_eq!(records[0].get("col_3"), Some(&text("Art")));
        assert_eq!(records[0].get("col_4"), Some(&text("note")));
    }

    #[test]
    fn documents_without_structure_yield_nothing() {
        let records = extract_records("<html><body><p>Nothing here</p></body></html>", &Selectors::default());
        assert!(records.is_empty());
    }
}
