//! Request and response bodies of the filters API

use mpsiem_core::{Error, FilterDetail, FilterDetailPdql, FilterQuery, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFolderRequest<'a> {
    pub name: &'a str,
    pub parent_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFolderResponse {
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFilterRequest<'a> {
    pub folder_id: &'a str,
    pub name: &'a str,
    pub pdql_query: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateFilterResponse {
    pub id: Option<String>,
}

/// `GET /api/v2/events/filters/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterInfoResponse {
    pub name: Option<String>,
    pub folder_id: Option<String>,
    pub is_removed: Option<bool>,
    pub source: Option<String>,
    pub select: Option<Value>,
    #[serde(rename = "where")]
    pub where_: Option<Value>,
    pub group_by: Option<Value>,
    pub aggregate_by: Option<Value>,
    pub distribute_by: Option<Value>,
    pub top: Option<Value>,
    pub aliases: Option<Value>,
}

/// `GET /api/v3/events/filters/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterInfoPdqlResponse {
    pub name: Option<String>,
    pub folder_id: Option<String>,
    pub is_removed: Option<bool>,
    pub source: Option<String>,
    pub pdql_query: Option<String>,
}

/// Decode a response body into one of the wire structs
pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: Value, context: &str) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| Error::MalformedResponse(format!("invalid {}: {}", context, e)))
}

impl TryFrom<FilterInfoResponse> for FilterDetail {
    type Error = Error;

    fn try_from(info: FilterInfoResponse) -> Result<Self> {
        let name = info
            .name
            .ok_or_else(|| Error::missing_field("name", "filter info response"))?;

        // The v2 API has no separate ordering field; `order` mirrors `groupBy`.
        let query = FilterQuery {
            select: info.select,
            where_: info.where_,
            order: info.group_by.clone(),
            group: info.group_by,
            aggregate: info.aggregate_by,
            distribute: info.distribute_by,
            top: info.top,
            aliases: info.aliases,
        };

        Ok(FilterDetail {
            name,
            folder_id: info.folder_id,
            removed: info.is_removed.unwrap_or(false),
            source: info.source,
            query,
        })
    }
}

impl TryFrom<FilterInfoPdqlResponse> for FilterDetailPdql {
    type Error = Error;

    fn try_from(info: FilterInfoPdqlResponse) -> Result<Self> {
        let name = info
            .name
            .ok_or_else(|| Error::missing_field("name", "filter info response"))?;

        Ok(FilterDetailPdql {
            name,
            folder_id: info.folder_id,
            removed: info.is_removed.unwrap_or(false),
            source: info.source,
            pdql_query: info.pdql_query,
        })
    }
}
