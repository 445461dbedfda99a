// src/services/normalizer.rs

//! Row normalizer.
//!
//! Turns an extracted table into the cached shape. Step order matters:
//! categorization reads the header rows that header removal later drops.

use crate::error::{AppError, Result};
use crate::models::{COL_CATEGORY, COL_SUBOPTION, Category, CategoryDescriptor, Dataset, Value};
use crate::utils::text::{is_upper, repair_latin1};

/// Literal that marks the summary row of every table.
const TOTAL: &str = "Total";

/// Text of a missing value after a string round-trip upstream.
const NAN: &str = "NAN";

/// Parse an upstream quantity (`"1.234.567"`, `"-"`, ...) into a number.
///
/// A lone dash means zero; dots are thousands separators. Anything left that
/// is not a finite number is `None`.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let raw = if raw.trim() == "-" { "0" } else { raw };
    let cleaned = raw.replace(['.', '-'], "");
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Normalizes extracted tables of one category.
pub struct RowNormalizer {
    category: Category,
    descriptor: &'static CategoryDescriptor,
}

impl RowNormalizer {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            descriptor: category.descriptor(),
        }
    }

    fn column(&self, table: &Dataset, name: &str) -> Result<usize> {
        table.column_index(name).ok_or_else(|| {
            AppError::normalization(self.category.as_str(), format!("missing column '{name}'"))
        })
    }

    /// Run every step and project to the cached columns.
    pub fn normalize(&self, mut table: Dataset) -> Result<Dataset> {
        let primary = self.column(&table, self.descriptor.primary_column)?;

        self.repair_encoding(&mut table, primary);
        self.clean_numeric(&mut table)?;
        if self.descriptor.categorized {
            self.categorize(&mut table, primary);
        }
        self.remove_headers(&mut table, primary);

        let mut table = self.project(table)?;
        let primary = self.column(&table, self.descriptor.columns[0].cached)?;

        Self::remove_incomplete(&mut table);
        Self::remove_total(&mut table, primary);
        if self.descriptor.has_suboptions() {
            self.label_suboptions(&mut table)?;
        }
        Ok(table)
    }

    /// Step 1: fix Latin-1/UTF-8 mojibake in the primary column.
    fn repair_encoding(&self, table: &mut Dataset, primary: usize) {
        for row in &mut table.rows {
            if let Value::Text(s) = &row[primary] {
                row[primary] = Value::Text(repair_latin1(s));
            }
        }
    }

    /// Step 2: parse quantity/value columns; unparseable cells become null.
    fn clean_numeric(&self, table: &mut Dataset) -> Result<()> {
        for name in self.descriptor.numeric_columns {
            let idx = self.column(table, name)?;
            for row in &mut table.rows {
                row[idx] = match &row[idx] {
                    Value::Text(s) => parse_quantity(s).map_or(Value::Null, Value::Number),
                    Value::Integer(i) => Value::Number(*i as f64),
                    other => other.clone(),
                };
            }
        }
        Ok(())
    }

    fn is_exception(&self, value: &str) -> bool {
        self.descriptor.is_exception(value)
    }

    /// Step 3: carry the last upper-case header down as `Categoria`.
    fn categorize(&self, table: &mut Dataset, primary: usize) {
        let mut current: Option<String> = None;
        let mut categories = Vec::with_capacity(table.len());

        for row in &table.rows {
            if let Some(value) = row[primary].as_text().map(str::trim) {
                if is_upper(value) && value != NAN && !self.is_exception(value) {
                    current = Some(value.to_string());
                }
            }
            categories.push(current.clone().map_or(Value::Null, Value::Text));
        }

        table.set_column(COL_CATEGORY, categories);
    }

    /// Step 4: drop section header rows, keeping upper-case product names.
    fn remove_headers(&self, table: &mut Dataset, primary: usize) {
        table.rows.retain(|row| match row[primary].as_text().map(str::trim) {
            Some(value) => !is_upper(value) || self.is_exception(value),
            None => false,
        });
    }

    /// Keep only the cached columns, renamed and in output order.
    fn project(&self, table: Dataset) -> Result<Dataset> {
        let positions = self
            .descriptor
            .columns
            .iter()
            .map(|c| self.column(&table, c.raw))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Dataset::new(
            self.descriptor
                .cached_columns()
                .into_iter()
                .map(String::from)
                .collect(),
        );
        for row in table.rows {
            out.rows
                .push(positions.iter().map(|&idx| row[idx].clone()).collect());
        }
        Ok(out)
    }

    /// Step 5: drop rows with a null in any column.
    fn remove_incomplete(table: &mut Dataset) {
        table.rows.retain(|row| row.iter().all(|v| !v.is_null()));
    }

    /// Step 6: drop the summary row.
    fn remove_total(table: &mut Dataset, primary: usize) {
        table
            .rows
            .retain(|row| row[primary].as_text() != Some(TOTAL));
    }

    /// Step 7: replace `subopt_0N` codes with their labels.
    fn label_suboptions(&self, table: &mut Dataset) -> Result<()> {
        let idx = self.column(table, COL_SUBOPTION)?;
        let before = table.len();
        for row in &mut table.rows {
            row[idx] = row[idx]
                .as_text()
                .and_then(|code| self.descriptor.suboption_label(code))
                .map_or(Value::Null, Value::text);
        }
        table.rows.retain(|row| !row[idx].is_null());

        let dropped = before - table.len();
        if dropped > 0 {
            log::warn!(
                "Dropped {} {} rows with an unknown sub-option code",
                dropped,
                self.category
            );
        }
        Ok(())
    }
}
