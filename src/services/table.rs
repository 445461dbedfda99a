// src/services/table.rs

//! HTML parsing for upstream pages: the year range control and data tables.

use std::ops::RangeInclusive;

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Dataset, Value};
use crate::utils::text::normalize_whitespace;

/// Position of the data table among all `<table>` elements of a page.
pub const DATA_TABLE_INDEX: usize = 3;

const YEAR_INPUT_SELECTOR: &str = "input.text_pesq";
const RANGE_INPUT_SELECTOR: &str = "input[min][max]";

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Read the inclusive year range declared by the page's numeric input.
pub fn parse_year_range(html: &str) -> Result<RangeInclusive<i32>> {
    let document = Html::parse_document(html);
    let input = [YEAR_INPUT_SELECTOR, RANGE_INPUT_SELECTOR]
        .into_iter()
        .map(parse_selector)
        .collect::<Result<Vec<_>>>()?
        .iter()
        .find_map(|sel| {
            document
                .select(sel)
                .find(|e| e.value().attr("min").is_some() && e.value().attr("max").is_some())
        })
        .ok_or_else(|| AppError::upstream("year range", "no input with min/max found"))?;

    let bound = |name: &str| -> Result<i32> {
        let raw = input.value().attr(name).unwrap_or_default().trim();
        raw.parse()
            .map_err(|e| AppError::upstream("year range", format!("{name}='{raw}': {e}")))
    };
    let (min, max) = (bound("min")?, bound("max")?);
    if min > max {
        return Err(AppError::upstream(
            "year range",
            format!("min {min} is greater than max {max}"),
        ));
    }
    Ok(min..=max)
}

/// Extract the table at `index` (document order, nested tables included).
pub fn extract_table(html: &str, index: usize) -> Result<Dataset> {
    let document = Html::parse_document(html);
    let table_sel = parse_selector("table")?;
    let tables: Vec<ElementRef> = document.select(&table_sel).collect();
    let table = tables.get(index).ok_or_else(|| {
        AppError::upstream(
            "data table",
            format!("page has {} tables, expected at least {}", tables.len(), index + 1),
        )
    })?;
    parse_table(*table)
}

/// Rows that belong to `table` itself, not to tables nested inside it.
fn own_rows<'a>(table: ElementRef<'a>, section: Option<&str>) -> Vec<ElementRef<'a>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        let name = child.value().name();
        match (name, section) {
            ("tr", None) => rows.push(child),
            (n, Some(s)) if n == s => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn cells(row: ElementRef) -> Vec<Value> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .map(|cell| {
            let text = normalize_whitespace(&cell.text().collect::<String>());
            if text.is_empty() {
                Value::Null
            } else {
                Value::Text(text)
            }
        })
        .collect()
}

fn parse_table(table: ElementRef) -> Result<Dataset> {
    let head = own_rows(table, Some("thead"));
    let mut body = own_rows(table, Some("tbody"));
    body.extend(own_rows(table, None));
    body.extend(own_rows(table, Some("tfoot")));

    let (header_row, body) = match head.last() {
        Some(h) => (*h, body),
        None if !body.is_empty() => {
            let first = body.remove(0);
            (first, body)
        }
        None => return Err(AppError::upstream("data table", "table has no rows")),
    };

    let body_rows: Vec<Vec<Value>> = body.into_iter().map(cells).collect();
    let width = body_rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(cells(header_row).len()))
        .max()
        .unwrap_or(0);

    let header = cells(header_row);
    let columns = (0..width)
        .map(|i| match header.get(i) {
            Some(Value::Text(name)) => name.clone(),
            _ => format!("Unnamed: {i}"),
        })
        .collect();

    let mut dataset = Dataset::new(columns);
    for row in body_rows {
        dataset.push_row(row);
    }
    Ok(dataset)
}
