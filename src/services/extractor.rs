// src/services/extractor.rs

//! Category extractor.
//!
//! Discovers a category's year range, fetches the data table for every
//! year (and sub-option, where the category has them) and stacks the results
//! into one raw dataset.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{COL_SUBOPTION, COL_YEAR, Category, CrawlerConfig, Dataset, Value};
use crate::services::table::{DATA_TABLE_INDEX, extract_table, parse_year_range};
use crate::utils::http::PageSource;
use crate::utils::upstream_url;

/// Columns the upstream table sometimes carries and that hold no data.
const STRAY_COLUMNS: [&str; 2] = ["Unnamed: 2", "Sem definiÃ§Ã£o"];

/// Header names that arrive mis-decoded, with their repaired form.
const HEADER_REPAIRS: [(&str, &str); 1] = [("PaÃ\u{ad}ses", "Países")];

/// One page request of an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub year: i32,
    pub suboption: Option<String>,
}

impl Combination {
    fn label(&self) -> String {
        match &self.suboption {
            Some(s) => format!("year {}, suboption {}", self.year, s),
            None => format!("year {}", self.year),
        }
    }
}

/// Raw rows of one category plus per-request bookkeeping.
#[derive(Debug, Default)]
pub struct Extraction {
    pub table: Dataset,
    pub attempted: usize,
    pub failed: usize,
}

/// Descriptor-driven extractor shared by all categories.
pub struct CategoryExtractor {
    source: Arc<dyn PageSource>,
    base_url: String,
    max_concurrent: usize,
    delay: Duration,
}

impl CategoryExtractor {
    pub fn new(source: Arc<dyn PageSource>, config: &CrawlerConfig) -> Self {
        Self {
            source,
            base_url: config.base_url.clone(),
            max_concurrent: config.max_concurrent.max(1),
            delay: Duration::from_millis(config.request_delay_ms),
        }
    }

    /// Fetch the landing page of `category` and read its year range.
    pub async fn discover_years(&self, category: Category) -> Result<Vec<i32>> {
        let descriptor = category.descriptor();
        let url = upstream_url(&self.base_url, &[("opcao", descriptor.option_code)])?;
        let html = self
            .source
            .fetch(&url)
            .await
            .map_err(|e| AppError::upstream(format!("{category} landing page"), e))?;
        let years = parse_year_range(&html)
            .map_err(|e| AppError::upstream(format!("{category} landing page"), e))?;
        Ok(years.collect())
    }

    /// Requests to issue, outer by year and inner by sub-option.
    pub fn combinations(category: Category, years: &[i32]) -> Vec<Combination> {
        let codes = category.descriptor().suboption_codes();
        years
            .iter()
            .flat_map(|&year| {
                if codes.is_empty() {
                    vec![Combination {
                        year,
                        suboption: None,
                    }]
                } else {
                    codes
                        .iter()
                        .map(|code| Combination {
                            year,
                            suboption: Some(code.clone()),
                        })
                        .collect()
                }
            })
            .collect()
    }

    fn combination_url(&self, category: Category, combo: &Combination) -> Result<String> {
        let option = category.descriptor().option_code;
        let year = combo.year.to_string();
        match &combo.suboption {
            Some(sub) => upstream_url(
                &self.base_url,
                &[("subopcao", sub.as_str()), ("opcao", option), ("ano", year.as_str())],
            ),
            None => upstream_url(&self.base_url, &[("opcao", option), ("ano", year.as_str())]),
        }
    }

    async fn fetch_combination(&self, category: Category, combo: &Combination) -> Result<Dataset> {
        let url = self.combination_url(category, combo)?;
        let html = self.source.fetch(&url).await?;
        let mut table = extract_table(&html, DATA_TABLE_INDEX)?;
        table.set_constant(COL_YEAR, Value::Integer(i64::from(combo.year)));
        if let Some(sub) = &combo.suboption {
            table.set_constant(COL_SUBOPTION, Value::text(sub.as_str()));
        }
        Ok(table)
    }

    async fn fetch_owned(
        &self,
        category: Category,
        combo: Combination,
    ) -> (Combination, Result<Dataset>) {
        let result = self.fetch_combination(category, &combo).await;
        (combo, result)
    }

    /// Run a full extraction for `category`.
    ///
    /// Fails only when the year range cannot be discovered; individual page
    /// failures are logged and skipped. An empty table means every page failed.
    pub async fn extract(&self, category: Category) -> Result<Extraction> {
        let years = self.discover_years(category).await?;
        let combos = Self::combinations(category, &years);
        log::info!(
            "Extracting {}: {} years, {} requests",
            category,
            years.len(),
            combos.len()
        );

        let mut outcome = Extraction {
            attempted: combos.len(),
            ..Extraction::default()
        };

        // `buffered` keeps results in request order regardless of completion order.
        let mut results = stream::iter(combos)
            .map(|combo| self.fetch_owned(category, combo))
            .buffered(self.max_concurrent);

        let mut tables = Vec::new();
        while let Some((combo, result)) = results.next().await {
            match result {
                Ok(table) => tables.push(table),
                Err(error) => {
                    outcome.failed += 1;
                    log::warn!("Failed {} for {}: {}", category, combo.label(), error);
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        let mut table = Dataset::concat(tables);
        for column in STRAY_COLUMNS {
            if table.drop_column(column) {
                log::debug!("Dropped stray column '{column}' from {category}");
            }
        }
        for (broken, fixed) in HEADER_REPAIRS {
            table.rename_column(broken, fixed);
        }

        outcome.table = table;
        Ok(outcome)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn extractor(source: Arc<FixtureSource>) -> CategoryExtractor {
        let config = CrawlerConfig {
            base_url: BASE_URL.to_string(),
            max_concurrent: 3,
            ..CrawlerConfig::default()
        };
        CategoryExtractor::new(source, &config)
    }

    #[test]
    fn test_combinations_order() {
        let combos = CategoryExtractor::combinations(Category::Exportation, &[2020, 2021]);
        assert_eq!(combos.len(), 8);
        assert_eq!(combos[0], Combination { year: 2020, suboption: Some("subopt_01".into()) });
        assert_eq!(combos[3], Combination { year: 2020, suboption: Some("subopt_04".into()) });
        assert_eq!(combos[4], Combination { year: 2021, suboption: Some("subopt_01".into()) });

        let combos = CategoryExtractor::combinations(Category::Trade, &[2020, 2021]);
        assert_eq!(combos, vec![
            Combination { year: 2020, suboption: None },
            Combination { year: 2021, suboption: None },
        ]);
    }

    #[tokio::test]
    async fn test_extract_production_attaches_year() {
        let source = Arc::new(
            FixtureSource::new()
                .page("opcao=opt_02", landing(2020, 2021))
                .page(
                    "opcao=opt_02&ano=2020",
                    data_page(&["Produto", "Quantidade (L.)"], &[&["VINHO DE MESA", "10"]]),
                )
                .page(
                    "opcao=opt_02&ano=2021",
                    data_page(&["Produto", "Quantidade (L.)"], &[&["Tinto", "20"]]),
                ),
        );

        let extraction = extractor(Arc::clone(&source)).extract(Category::Production).await.unwrap();

        assert_eq!(extraction.attempted, 2);
        assert_eq!(extraction.failed, 0);
        let table = extraction.table;
        assert_eq!(table.columns, vec!["Produto", "Quantidade (L.)", "ano"]);
        assert_eq!(table.rows[0][2], Value::Integer(2020));
        assert_eq!(table.rows[1][0], Value::text("Tinto"));
        assert_eq!(table.rows[1][2], Value::Integer(2021));
        assert_eq!(source.requested()[0], format!("{BASE_URL}?opcao=opt_02"));
    }

    #[tokio::test]
    async fn test_extract_skips_failed_combinations_and_repairs_headers() {
        let header = ["PaÃ\u{ad}ses", "Quantidade (Kg)", "Unnamed: 2", "Valor (US$)"];
        let source = Arc::new(
            FixtureSource::new()
                .page("opcao=opt_06", landing(2020, 2020))
                .page(
                    "subopcao=subopt_01&opcao=opt_06&ano=2020",
                    data_page(&header, &[&["Chile", "1.000", "", "2.000"]]),
                )
                .page(
                    "subopcao=subopt_03&opcao=opt_06&ano=2020",
                    data_page(&header, &[&["Peru", "5", "", "7"]]),
                ),
        );

        let extraction = extractor(source).extract(Category::Exportation).await.unwrap();

        assert_eq!(extraction.attempted, 4);
        assert_eq!(extraction.failed, 2);
        let table = extraction.table;
        assert_eq!(
            table.columns,
            vec!["Países", "Quantidade (Kg)", "Valor (US$)", "ano", "subopcao"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][4], Value::text("subopt_01"));
        assert_eq!(table.rows[1][0], Value::text("Peru"));
        assert_eq!(table.rows[1][4], Value::text("subopt_03"));
    }

    #[tokio::test]
    async fn test_extract_drops_sem_definicao_column() {
        let page = |header: &[&str], row: &[&str]| data_page(header, &[row]);
        let mut source = FixtureSource::new().page("opcao=opt_03", landing(2020, 2020));
        for code in ["subopt_01", "subopt_02", "subopt_03"] {
            source = source.page(
                &format!("subopcao={code}&opcao=opt_03&ano=2020"),
                page(&["Cultivar", "Quantidade (Kg)"], &["Isabel", "10"]),
            );
        }
        source = source.page(
            "subopcao=subopt_04&opcao=opt_03&ano=2020",
            page(&["Sem definiÃ§Ã£o", "Quantidade (Kg)"], &["Sem definiÃ§Ã£o", "5"]),
        );

        let extraction = extractor(Arc::new(source)).extract(Category::Processing).await.unwrap();

        assert_eq!(extraction.failed, 0);
        let table = extraction.table;
        assert_eq!(table.columns, vec!["Cultivar", "Quantidade (Kg)", "ano", "subopcao"]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[3][0], Value::Null);
        assert_eq!(table.rows[3][1], Value::text("5"));
    }

    #[tokio::test]
    async fn test_extract_all_failed_yields_empty_table() {
        let source = Arc::new(FixtureSource::new().page("opcao=opt_04", landing(2020, 2021)));

        let extraction = extractor(source).extract(Category::Trade).await.unwrap();

        assert!(extraction.table.is_empty());
        assert_eq!(extraction.failed, 2);
    }

    #[tokio::test]
    async fn test_extract_over_http() {
        use crate::utils::http::HttpPageSource;
        use wiremock::matchers::{method, path, query_param, query_param_is_missing};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.php"))
            .and(query_param("opcao", "opt_04"))
            .and(query_param_is_missing("ano"))
            .respond_with(ResponseTemplate::new(200).set_body_string(landing(2022, 2023)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("opcao", "opt_04"))
            .and(query_param("ano", "2022"))
            .respond_with(ResponseTemplate::new(200).set_body_string(data_page(
                &["Produto", "Quantidade (L.)"],
                &[&["VINHO DE MESA", "187.016.848"], &["Tinto", "165.097.539"]],
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("ano", "2023"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = CrawlerConfig {
            base_url: format!("{}/index.php", server.uri()),
            ..CrawlerConfig::default()
        };
        let source = Arc::new(HttpPageSource::from_config(&config).unwrap());
        let extraction = CategoryExtractor::new(source, &config)
            .extract(Category::Trade)
            .await
            .unwrap();

        assert_eq!(extraction.attempted, 2);
        assert_eq!(extraction.failed, 1);
        assert_eq!(extraction.table.len(), 2);
        assert_eq!(extraction.table.rows[1][1], Value::text("165.097.539"));
        assert_eq!(extraction.table.rows[1][2], Value::Integer(2022));
    }

    #[tokio::test]
    async fn test_extract_fails_without_year_range() {
        let source = Arc::new(FixtureSource::new());
        let err = extractor(source).extract(Category::Trade).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable { .. }));
    }
}
