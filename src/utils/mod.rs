//! Utility functions and helpers.

pub mod http;
pub mod text;

use url::Url;

/// Build an upstream URL from the base page and ordered query parameters.
pub fn upstream_url(base_url: &str, params: &[(&str, &str)]) -> crate::error::Result<String> {
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url_keeps_param_order() {
        let url = upstream_url(
            "http://vitibrasil.cnpuv.embrapa.br/index.php",
            &[("subopcao", "subopt_01"), ("opcao", "opt_06"), ("ano", "2020")],
        )
        .unwrap();
        assert_eq!(
            url,
            "http://vitibrasil.cnpuv.embrapa.br/index.php?subopcao=subopt_01&opcao=opt_06&ano=2020"
        );
    }

    #[test]
    fn test_upstream_url_rejects_relative_base() {
        assert!(upstream_url("index.php", &[("opcao", "opt_02")]).is_err());
    }
}
