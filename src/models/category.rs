// src/models/category.rs

//! The five upstream categories and their scraping descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A data domain exposed by the upstream site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Exportation,
    Importation,
    Processing,
    Production,
    Trade,
}

impl Category {
    /// All categories, in the order the periodic sync visits them.
    pub const ALL: [Category; 5] = [
        Category::Exportation,
        Category::Importation,
        Category::Processing,
        Category::Production,
        Category::Trade,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Exportation => "exportation",
            Category::Importation => "importation",
            Category::Processing => "processing",
            Category::Production => "production",
            Category::Trade => "trade",
        }
    }

    /// Base file name of the cache entry (without extension).
    pub fn cache_name(&self) -> String {
        format!("table_{}", self.as_str())
    }

    /// Static scraping descriptor for this category.
    pub fn descriptor(&self) -> &'static CategoryDescriptor {
        match self {
            Category::Exportation => &EXPORTATION,
            Category::Importation => &IMPORTATION,
            Category::Processing => &PROCESSING,
            Category::Production => &PRODUCTION,
            Category::Trade => &TRADE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or(AppError::UnsupportedCategory(lowered))
    }
}

/// A raw upstream column and the name it is cached under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub raw: &'static str,
    pub cached: &'static str,
}

const fn column(raw: &'static str, cached: &'static str) -> ColumnMapping {
    ColumnMapping { raw, cached }
}

/// Everything that differs between the per-category scrapers.
#[derive(Debug)]
pub struct CategoryDescriptor {
    /// Value of the `opcao` query parameter
    pub option_code: &'static str,

    /// Number of `subopt_0N` pages per year (0 when there is no sub-option axis)
    pub suboption_count: u8,

    /// Human-readable label per sub-option code
    pub suboption_labels: &'static [(&'static str, &'static str)],

    /// Column holding the product/cultivar/country name
    pub primary_column: &'static str,

    /// Columns parsed as numbers
    pub numeric_columns: &'static [&'static str],

    /// Whether upper-case rows are folded into a `Categoria` column
    pub categorized: bool,

    /// Upper-case values that are products, not section headers
    pub category_exceptions: &'static [&'static str],

    /// Cached columns, in output order
    pub columns: &'static [ColumnMapping],
}

impl CategoryDescriptor {
    pub fn has_suboptions(&self) -> bool {
        self.suboption_count > 0
    }

    /// Sub-option codes in request order (`subopt_01`, `subopt_02`, ...).
    pub fn suboption_codes(&self) -> Vec<String> {
        (1..=self.suboption_count)
            .map(|i| format!("subopt_{i:02}"))
            .collect()
    }

    pub fn suboption_label(&self, code: &str) -> Option<&'static str> {
        self.suboption_labels
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    pub fn is_exception(&self, value: &str) -> bool {
        self.category_exceptions.contains(&value)
    }

    /// Cached column names, in output order.
    pub fn cached_columns(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.cached).collect()
    }
}

pub const COL_YEAR: &str = "ano";
pub const COL_SUBOPTION: &str = "subopcao";
pub const COL_CATEGORY: &str = "Categoria";

const WINE_LABELS: &[(&str, &str)] = &[
    ("subopt_01", "Vinhos de mesa"),
    ("subopt_02", "Espumantes"),
    ("subopt_03", "Uvas frescas"),
    ("subopt_04", "Uvas passas"),
    ("subopt_05", "Suco de uva"),
];

const GRAPE_CLASS_LABELS: &[(&str, &str)] = &[
    ("subopt_01", "Viníferas"),
    ("subopt_02", "Americanas e híbridas"),
    ("subopt_03", "Uvas de mesa"),
    ("subopt_04", "Sem classificação"),
];

const TRADE_EXCEPTIONS: &[&str] = &[
    "VINHO FRIZANTE",
    "VINHO ORGÂNICO",
    "SUCO DE UVAS CONCENTRADO",
];

static PRODUCTION: CategoryDescriptor = CategoryDescriptor {
    option_code: "opt_02",
    suboption_count: 0,
    suboption_labels: &[],
    primary_column: "Produto",
    numeric_columns: &["Quantidade (L.)"],
    categorized: true,
    category_exceptions: &[],
    columns: &[
        column("Produto", "produto"),
        column("Quantidade (L.)", "quantidade_l"),
        column(COL_YEAR, "ano"),
        column(COL_CATEGORY, "categoria"),
    ],
};

static PROCESSING: CategoryDescriptor = CategoryDescriptor {
    option_code: "opt_03",
    suboption_count: 4,
    suboption_labels: GRAPE_CLASS_LABELS,
    primary_column: "Cultivar",
    numeric_columns: &["Quantidade (Kg)"],
    categorized: true,
    category_exceptions: &[],
    columns: &[
        column("Cultivar", "cultivar"),
        column("Quantidade (Kg)", "quantidade_kg"),
        column(COL_YEAR, "ano"),
        column(COL_SUBOPTION, "subopcao"),
        column(COL_CATEGORY, "categoria"),
    ],
};

static TRADE: CategoryDescriptor = CategoryDescriptor {
    option_code: "opt_04",
    suboption_count: 0,
    suboption_labels: &[],
    primary_column: "Produto",
    numeric_columns: &["Quantidade (L.)"],
    categorized: true,
    category_exceptions: TRADE_EXCEPTIONS,
    columns: &[
        column("Produto", "produto"),
        column("Quantidade (L.)", "quantidade_l"),
        column(COL_YEAR, "ano"),
        column(COL_CATEGORY, "categoria"),
    ],
};

static IMPORTATION: CategoryDescriptor = CategoryDescriptor {
    option_code: "opt_05",
    suboption_count: 5,
    suboption_labels: WINE_LABELS,
    primary_column: "Países",
    numeric_columns: &["Quantidade (Kg)", "Valor (US$)"],
    categorized: false,
    category_exceptions: &[],
    columns: &[
        column("Países", "pais"),
        column("Quantidade (Kg)", "quantidade_kg"),
        column("Valor (US$)", "valor_usd"),
        column(COL_YEAR, "ano"),
        column(COL_SUBOPTION, "subopcao"),
    ],
};

static EXPORTATION: CategoryDescriptor = CategoryDescriptor {
    option_code: "opt_06",
    suboption_count: 4,
    suboption_labels: WINE_LABELS,
    primary_column: "Países",
    numeric_columns: &["Quantidade (Kg)", "Valor (US$)"],
    categorized: false,
    category_exceptions: &[],
    columns: &[
        column("Países", "pais"),
        column("Quantidade (Kg)", "quantidade_kg"),
        column("Valor (US$)", "valor_usd"),
        column(COL_YEAR, "ano"),
        column(COL_SUBOPTION, "subopcao"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_case_insensitive() {
        assert_eq!("Production".parse::<Category>().unwrap(), Category::Production);
        assert_eq!(" trade ".parse::<Category>().unwrap(), Category::Trade);
    }

    #[test]
    fn test_parse_unknown_category() {
        let err = "unknown".parse::<Category>().unwrap_err();
        assert!(matches!(err, AppError::UnsupportedCategory(ref c) if c == "unknown"));
    }

    #[test]
    fn test_suboption_codes() {
        assert_eq!(
            Category::Exportation.descriptor().suboption_codes(),
            vec!["subopt_01", "subopt_02", "subopt_03", "subopt_04"]
        );
        assert_eq!(Category::Importation.descriptor().suboption_codes().len(), 5);
        assert!(Category::Production.descriptor().suboption_codes().is_empty());
        assert!(!Category::Trade.descriptor().has_suboptions());
    }

    #[test]
    fn test_every_suboption_has_a_label() {
        for category in Category::ALL {
            let descriptor = category.descriptor();
            for code in descriptor.suboption_codes() {
                assert!(
                    descriptor.suboption_label(&code).is_some(),
                    "{category} has no label for {code}"
                );
            }
        }
    }

    #[test]
    fn test_cached_columns() {
        assert_eq!(
            Category::Processing.descriptor().cached_columns(),
            vec!["cultivar", "quantidade_kg", "ano", "subopcao", "categoria"]
        );
        assert_eq!(
            Category::Exportation.descriptor().cached_columns(),
            vec!["pais", "quantidade_kg", "valor_usd", "ano", "subopcao"]
        );
        assert_eq!(Category::Trade.cache_name(), "table_trade");
    }
}
