use crate::error::NexusError;
use crate::types::sheets::{
    AppendValuesResponse, CellValue, GoogleApiError, UpdateValuesResponse, ValueRange,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Values written verbatim; nothing is parsed as a formula or date.
const VALUE_INPUT_OPTION: &str = "RAW";

#[derive(Serialize)]
struct ValuesBody<'a, R: Serialize> {
    values: &'a [R],
}

/// Thin wrapper over the Sheets v4 `spreadsheets.values` endpoints.
///
/// Holds no credentials; every call is made with the caller's access token.
#[derive(Clone)]
pub struct SheetsApi {
    client: reqwest::Client,
    base: Url,
}

impl SheetsApi {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    /// `GET .../values/{range}`
    pub async fn get_values(
        &self,
        token: impl AsRef<str>,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, NexusError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(token.as_ref())
            .send()
            .await?;
        let body: ValueRange = ensure_success(resp).await?.json().await?;
        debug!(spreadsheet_id, range = ?body.range, rows = body.values.len(), "values read");
        Ok(body.values)
    }

    /// `PUT .../values/{range}`: overwrites the addressed cells.
    pub async fn update_values(
        &self,
        token: impl AsRef<str>,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<UpdateValuesResponse, NexusError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let resp = self
            .client
            .put(url)
            .bearer_auth(token.as_ref())
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .json(&ValuesBody { values })
            .send()
            .await?;
        let body = ensure_success(resp).await?.json().await?;
        Ok(body)
    }

    /// `POST .../values/{range}:append`: always inserts a new row after the table
    /// Google detects at `range`.
    pub async fn append_values(
        &self,
        token: impl AsRef<str>,
        spreadsheet_id: &str,
        range: &str,
        row: &[CellValue],
    ) -> Result<AppendValuesResponse, NexusError> {
        let url = self.values_url(spreadsheet_id, &format!("{range}:append"))?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(token.as_ref())
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValuesBody {
                values: std::slice::from_ref(&row),
            })
            .send()
            .await?;
        let body = ensure_success(resp).await?.json().await?;
        Ok(body)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, NexusError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| NexusError::Config(format!("invalid sheets_api_base: {}", self.base)))?
            .pop_if_empty()
            .push(spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, NexusError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let raw = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoogleApiError>(&raw)
        .map(|e| e.error.message)
        .unwrap_or(raw);
    warn!(status = %status, "Sheets API call failed");
    Err(NexusError::UpstreamStatus { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> SheetsApi {
        SheetsApi::new(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn values_url_escapes_range_as_one_segment() {
        let url = api("https://sheets.googleapis.com/v4/spreadsheets")
            .values_url("S1", "My Sheet!A1:B2")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/S1/values/My%20Sheet!A1:B2"
        );
    }

    #[test]
    fn values_url_tolerates_trailing_slash() {
        let url = api("http://127.0.0.1:9/v4/spreadsheets/")
            .values_url("S1", "A1:append")
            .unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/S1/values/A1:append");
    }

    #[test]
    fn append_body_wraps_row_once() {
        let row = vec![CellValue::Text("a".into()), CellValue::Bool(true)];
        let row_ref: &[CellValue] = &row;
        let body = serde_json::to_value(ValuesBody {
            values: std::slice::from_ref(&row_ref),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "values": [["a", true]] }));
    }
}
