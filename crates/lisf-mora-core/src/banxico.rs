//! Banxico SIE REST client.
//!
//! Fetches the UDI value series (`SP68257`) and the monthly CCP-UDIS series
//! (`SF3368`) from Banco de México's Sistema de Información Económica.
//!
//! Endpoint: `GET {base_url}/series/{id}/datos/{YYYY-MM-DD}/{YYYY-MM-DD}` with
//! the consultation token in the `Bmx-Token` header. Observations come back as
//! `{"fecha": "dd/mm/yyyy", "dato": "7.646804"}`; unpublished points are
//! reported as `"N/E"` and skipped.

use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MoraError;
use crate::provider::MarketDataProvider;
use crate::rates::RateTable;
use crate::types::{Rate, YearMonth};
use crate::MoraResult;

pub const DEFAULT_BASE_URL: &str = "https://www.banxico.org.mx/SieAPIRest/service/v1";
pub const SERIES_UDIS: &str = "SP68257";
pub const SERIES_CCP_UDIS: &str = "SF3368";

const PROVIDER_NAME: &str = "banxico";
const TOKEN_HEADER: &str = "Bmx-Token";
const DATE_FORMAT: &str = "%d/%m/%Y";
const NOT_AVAILABLE: &str = "N/E";

/// Connection settings for the SIE API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BanxicoConfig {
    pub base_url: String,
    /// Consultation token issued by Banxico
    pub token: String,
    pub timeout_secs: u64,
}

impl Default for BanxicoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// A dated point of a SIE series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Decimal,
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SieResponse {
    bmx: SieBody,
}

#[derive(Debug, Deserialize)]
struct SieBody {
    #[serde(default)]
    series: Vec<SieSeries>,
}

#[derive(Debug, Deserialize)]
struct SieSeries {
    #[serde(rename = "idSerie")]
    id: String,
    #[serde(default)]
    datos: Vec<SieDatum>,
}

#[derive(Debug, Deserialize)]
struct SieDatum {
    fecha: String,
    dato: String,
}

fn malformed(reason: impl Into<String>) -> MoraError {
    MoraError::ProviderUnavailable {
        provider: PROVIDER_NAME.into(),
        reason: reason.into(),
    }
}

fn parse_datum(datum: &SieDatum) -> MoraResult<Option<Observation>> {
    let raw = datum.dato.trim();
    if raw.eq_ignore_ascii_case(NOT_AVAILABLE) || raw.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(datum.fecha.trim(), DATE_FORMAT)
        .map_err(|e| malformed(format!("bad observation date '{}': {e}", datum.fecha)))?;
    let value = Decimal::from_str(&raw.replace(',', ""))
        .map_err(|e| malformed(format!("bad observation value '{}' for {date}: {e}", datum.dato)))?;
    Ok(Some(Observation { date, value }))
}

/// Parse a SIE response body into chronologically sorted observations of `series`.
pub fn parse_observations(body: &str, series: &str) -> MoraResult<Vec<Observation>> {
    let response: SieResponse =
        serde_json::from_str(body).map_err(|e| malformed(format!("unexpected response: {e}")))?;

    let mut observations = Vec::new();
    for datum in response
        .bmx
        .series
        .iter()
        .filter(|s| s.id == series)
        .flat_map(|s| s.datos.iter())
    {
        if let Some(obs) = parse_datum(datum)? {
            observations.push(obs);
        }
    }
    observations.sort_by_key(|o| o.date);
    Ok(observations)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking SIE client, constructed once and passed to the engine.
#[derive(Debug, Clone)]
pub struct BanxicoClient {
    http: reqwest::blocking::Client,
    config: BanxicoConfig,
}

impl BanxicoClient {
    pub fn new(config: BanxicoConfig) -> MoraResult<Self> {
        if config.token.trim().is_empty() {
            return Err(MoraError::InvalidInput {
                field: "banxico.token".into(),
                reason: "A Banxico SIE consultation token is required".into(),
            });
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| malformed(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BanxicoConfig {
        &self.config
    }

    fn series_url(&self, series: &str, from: NaiveDate, to: NaiveDate) -> String {
        format!(
            "{}/series/{}/datos/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            series,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        )
    }

    /// Observations of `series` between two dates, both inclusive.
    pub fn fetch_series(&self, series: &str, from: NaiveDate, to: NaiveDate) -> MoraResult<Vec<Observation>> {
        let url = self.series_url(series, from, to);
        debug!(%series, %from, %to, "requesting Banxico series");

        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.config.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| malformed(format!("request for {series} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(malformed(format!("{series} request returned HTTP {status}")));
        }

        let body = response
            .text()
            .map_err(|e| malformed(format!("cannot read {series} response: {e}")))?;
        let observations = parse_observations(&body, series)?;
        debug!(%series, count = observations.len(), "received Banxico observations");
        Ok(observations)
    }
}

impl MarketDataProvider for BanxicoClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn udi_value(&self, date: NaiveDate) -> MoraResult<Decimal> {
        self.fetch_series(SERIES_UDIS, date, date)?
            .last()
            .map(|o| o.value)
            .ok_or(MoraError::MissingUdiValue { date })
    }

    fn ccp_udis_rate(&self, month: YearMonth) -> MoraResult<Option<Rate>> {
        let observations = self.fetch_series(SERIES_CCP_UDIS, month.first_day()?, month.last_day()?)?;
        Ok(observations.last().map(|o| o.value))
    }

    /// One ranged request; each observation is keyed by its calendar month.
    fn ccp_udis_rates(&self, from: YearMonth, to: YearMonth) -> MoraResult<RateTable> {
        if to < from {
            return Ok(RateTable::new());
        }
        let observations = self.fetch_series(SERIES_CCP_UDIS, from.first_day()?, to.last_day()?)?;
        Ok(observations
            .into_iter()
            .map(|o| (YearMonth::from_date(o.date), o.value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CCP_BODY: &str = r#"{
        "bmx": {
            "series": [{
                "idSerie": "SF3368",
                "titulo": "Costo de captación a plazo de pasivos denominados en UDIS",
                "datos": [
                    { "fecha": "01/02/2023", "dato": "5.20" },
                    { "fecha": "01/01/2023", "dato": "5.12" },
                    { "fecha": "01/03/2023", "dato": "N/E" }
                ]
            }]
        }
    }"#;

    #[test]
    fn test_parse_observations_sorts_and_skips_unpublished() {
        let obs = parse_observations(CCP_BODY, SERIES_CCP_UDIS).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(obs[0].value, dec!(5.12));
        assert_eq!(obs[1].value, dec!(5.20));
    }

    #[test]
    fn test_parse_observations_strips_thousands_separator() {
        let body = r#"{"bmx":{"series":[{"idSerie":"SP68257","datos":[
            {"fecha":"15/03/2023","dato":"1,007.788775"}
        ]}]}}"#;
        let obs = parse_observations(body, SERIES_UDIS).unwrap();
        assert_eq!(obs[0].value, dec!(1007.788775));
    }

    #[test]
    fn test_parse_observations_ignores_other_series() {
        let obs = parse_observations(CCP_BODY, SERIES_UDIS).unwrap();
        assert!(obs.is_empty());
    }

    #[test]
    fn test_series_without_data_is_empty() {
        let body = r#"{"bmx":{"series":[{"idSerie":"SP68257"}]}}"#;
        assert!(parse_observations(body, SERIES_UDIS).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_is_provider_error() {
        let err = parse_observations(r#"{"error":"token invalido"}"#, SERIES_UDIS).unwrap_err();
        assert!(matches!(err, MoraError::ProviderUnavailable { .. }));

        let bad_date = r#"{"bmx":{"series":[{"idSerie":"SP68257","datos":[
            {"fecha":"2023-03-15","dato":"7.78"}
        ]}]}}"#;
        assert!(parse_observations(bad_date, SERIES_UDIS).is_err());
    }

    #[test]
    fn test_client_requires_token() {
        let err = BanxicoClient::new(BanxicoConfig::default()).unwrap_err();
        assert!(matches!(err, MoraError::InvalidInput { .. }));
    }

    #[test]
    fn test_series_url_format() {
        let client = BanxicoClient::new(BanxicoConfig {
            base_url: "https://example.test/sie/".into(),
            token: "t".into(),
            timeout_secs: 5,
        })
        .unwrap();
        let url = client.series_url(
            SERIES_UDIS,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
        );
        assert_eq!(url, "https://example.test/sie/series/SP68257/datos/2023-01-01/2023-03-15");
    }
}
