use crate::{Error, Result, SHEETS_READONLY_SCOPE, ServiceAccountKey, TokenProvider};
use async_trait::async_trait;
use linkpost_core::LinkSource;
use linkpost_core::config::SourceSettings;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Body of `spreadsheets.values.get`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub major_dimension: Option<String>,
    /// Omitted entirely by the API when the range is empty
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// Pick the newest candidate: the first cell of the last row.
///
/// Earlier rows are ignored even if they were never processed.
pub fn latest_link(range: &ValueRange) -> Option<String> {
    let cell = range.values.last()?.first()?;
    let cell = cell.trim();
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Read-only client for one range of one spreadsheet
pub struct SheetsClient {
    client: reqwest::Client,
    values_url: Url,
    tokens: TokenProvider,
}

impl SheetsClient {
    pub fn new(
        api_base: &str,
        spreadsheet_id: &str,
        range: &str,
        key: ServiceAccountKey,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            values_url: values_url(api_base, spreadsheet_id, range)?,
            tokens: TokenProvider::new(key, SHEETS_READONLY_SCOPE, client.clone()),
            client,
        })
    }

    /// Build a client from the `[source]` settings, reading the key file
    pub fn from_settings(settings: &SourceSettings) -> Result<Self> {
        let spreadsheet_id = settings
            .spreadsheet_id
            .as_deref()
            .ok_or_else(|| Error::Credentials("no spreadsheet id configured".to_string()))?;
        let credentials = settings
            .credentials
            .as_deref()
            .ok_or_else(|| Error::Credentials("no credentials file configured".to_string()))?;

        let key = ServiceAccountKey::from_file(credentials)?;
        Self::new(&settings.api_base, spreadsheet_id, &settings.range, key)
    }

    pub fn values_url(&self) -> &Url {
        &self.values_url
    }

    /// Fetch the configured range
    pub async fn fetch_values(&self) -> Result<ValueRange> {
        let token = self.tokens.access_token().await?;

        tracing::debug!("Fetching {}", self.values_url);
        let resp = self
            .client
            .get(self.values_url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        let range: ValueRange = read_json(resp).await?;
        tracing::debug!("Sheet returned {} rows", range.values.len());
        Ok(range)
    }
}

#[async_trait]
impl LinkSource for SheetsClient {
    async fn fetch_latest_link(&self) -> linkpost_core::Result<Option<String>> {
        let range = self.fetch_values().await?;
        Ok(latest_link(&range))
    }
}

/// Decode a JSON body, turning non-2xx responses into [`Error::Api`]
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp.json().await?)
}

/// `{base}/v4/spreadsheets/{id}/values/{range}`, with the range escaped as one segment
fn values_url(api_base: &str, spreadsheet_id: &str, range: &str) -> Result<Url> {
    let mut url = Url::parse(api_base)
        .map_err(|e| Error::InvalidUrl(format!("'{}': {}", api_base, e)))?;
    url.path_segments_mut()
        .map_err(|_| Error::InvalidUrl(format!("'{}' cannot take a path", api_base)))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[&[&str]]) -> ValueRange {
        ValueRange {
            values: values
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_latest_link_is_last_row() {
        let range = rows(&[&["https://example.com/a"], &["https://example.com/b"]]);
        assert_eq!(latest_link(&range).as_deref(), Some("https://example.com/b"));
    }

    #[test]
    fn test_latest_link_absent_without_rows() {
        assert_eq!(latest_link(&ValueRange::default()), None);
        assert_eq!(latest_link(&rows(&[&["https://example.com/a"], &[]])), None);
        assert_eq!(latest_link(&rows(&[&["   "]])), None);
    }

    #[test]
    fn test_latest_link_trims_cell() {
        let range = rows(&[&["  https://example.com/a \n"]]);
        assert_eq!(latest_link(&range).as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_parses_api_body_without_values() {
        let body = r#"{"range": "'Form Responses 1'!A2:A1000", "majorDimension": "ROWS"}"#;
        let range: ValueRange = serde_json::from_str(body).unwrap();
        assert!(range.values.is_empty());
        assert_eq!(range.major_dimension.as_deref(), Some("ROWS"));
    }

    #[test]
    fn test_parses_api_body_with_values() {
        let body = r#"{
            "range": "'Form Responses 1'!A2:A1000",
            "majorDimension": "ROWS",
            "values": [["https://example.com/a"], ["not a url"]]
        }"#;
        let range: ValueRange = serde_json::from_str(body).unwrap();
        assert_eq!(latest_link(&range).as_deref(), Some("not a url"));
    }

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            http::Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_read_json_decodes_values_body() {
        let resp = response(
            200,
            r#"{"range": "A2:A3", "values": [["https://example.com/a"], ["https://example.com/b"]]}"#,
        );

        let range: ValueRange = read_json(resp).await.unwrap();
        assert_eq!(latest_link(&range).as_deref(), Some("https://example.com/b"));
    }

    #[tokio::test]
    async fn test_read_json_reports_api_errors() {
        let resp = response(403, r#"{"error": {"message": "The caller does not have permission"}}"#);

        match read_json::<ValueRange>(resp).await.unwrap_err() {
            Error::Api { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("does not have permission"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_json_rejects_malformed_body() {
        let resp = response(200, "<html>captive portal</html>");
        let err = read_json::<ValueRange>(resp).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_values_url_escapes_range() {
        let url = values_url(
            "https://sheets.googleapis.com",
            "13bcuDvY6uVA005BUwFCU1Vucns-NIxBLX2VTCv7fotc",
            "Form Responses 1!A2:A",
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/13bcuDvY6uVA005BUwFCU1Vucns-NIxBLX2VTCv7fotc/values/Form%20Responses%201!A2:A"
        );
    }

    #[test]
    fn test_values_url_keeps_base_path() {
        let url = values_url("http://127.0.0.1:8080/sheets/", "id", "A:A").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/sheets/v4/spreadsheets/id/values/A:A"
        );
    }

    #[test]
    fn test_values_url_rejects_bad_base() {
        assert!(values_url("not a url", "id", "A:A").is_err());
    }
}
