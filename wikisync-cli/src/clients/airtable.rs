//! Airtable REST client.
//!
//! `GET {api}/{base}/{table}` pages through records with the `offset`
//! cursor; linked records are fetched one at a time with
//! `GET {api}/{base}/{table}/{id}`; acknowledgments are single-record `PATCH`es.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use wikisync_core::{ContainerId, DirtyMarker, Fields, Record, RecordId, RecordStoreConfig};
use wikisync_sync::{RecordStore, StoreError};

use super::{agent, http_err, ClientError};

pub struct AirtableClient {
    agent: ureq::Agent,
    api_url: String,
    api_key: String,
    marker: DirtyMarker,
}

#[derive(Debug, Deserialize)]
struct Page {
    records: Vec<RemoteRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRecord {
    id: String,
    #[serde(default)]
    fields: Fields,
    #[serde(default)]
    created_time: Option<DateTime<Utc>>,
}

impl RemoteRecord {
    fn into_record(self, marker: &DirtyMarker) -> Record {
        let record = Record::from_remote(self.id, self.fields, marker);
        match self.created_time {
            Some(at) => record.with_created_time(at),
            None => record,
        }
    }
}

impl AirtableClient {
    pub fn new(config: &RecordStoreConfig, api_key: String, marker: DirtyMarker) -> Self {
        AirtableClient {
            agent: agent(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            marker,
        }
    }

    fn table_url(&self, container: &ContainerId, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_url,
            container,
            urlencoding::encode(table)
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

/// Records of one response page plus the cursor of the next one.
fn parse_page(
    url: &str,
    body: &str,
    marker: &DirtyMarker,
) -> Result<(Vec<Record>, Option<String>), ClientError> {
    let page: Page = serde_json::from_str(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let records = page
        .records
        .into_iter()
        .map(|r| r.into_record(marker))
        .collect();
    Ok((records, page.offset))
}

/// A single-record response, as returned for linked-record lookups.
fn parse_record(url: &str, body: &str, marker: &DirtyMarker) -> Result<Record, ClientError> {
    let record: RemoteRecord = serde_json::from_str(body).map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(record.into_record(marker))
}

impl RecordStore for AirtableClient {
    fn fetch_records(&self, container: &ContainerId, table: &str) -> Result<Vec<Record>, StoreError> {
        let url = self.table_url(container, table);
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut request = self.agent.get(&url).set("Authorization", &self.bearer());
            if let Some(cursor) = offset.as_deref() {
                request = request.query("offset", cursor);
            }
            let body = request
                .call()
                .map_err(|e| http_err("GET", &url, e))?
                .into_string()
                .map_err(|e| ClientError::Decode {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
            let (page, next) = parse_page(&url, &body, &self.marker)?;
            tracing::debug!(table, page = page.len(), "fetched records");
            records.extend(page);
            match next {
                Some(cursor) => offset = Some(cursor),
                None => break,
            }
        }
        Ok(records)
    }

    fn fetch_record(
        &self,
        container: &ContainerId,
        table: &str,
        record: &RecordId,
    ) -> Result<Record, StoreError> {
        let url = format!("{}/{}", self.table_url(container, table), record);
        let body = self
            .agent
            .get(&url)
            .set("Authorization", &self.bearer())
            .call()
            .map_err(|e| http_err("GET", &url, e))?
            .into_string()
            .map_err(|e| ClientError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?;
        Ok(parse_record(&url, &body, &self.marker)?)
    }

    fn update_field(
        &self,
        container: &ContainerId,
        table: &str,
        record: &RecordId,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.table_url(container, table), record);
        let mut fields = serde_json::Map::new();
        fields.insert(field.to_string(), value);
        self.agent
            .request("PATCH", &url)
            .set("Authorization", &self.bearer())
            .send_json(json!({ "fields": fields }))
            .map_err(|e| http_err("PATCH", &url, e))?;
        Ok(())
    }
}
