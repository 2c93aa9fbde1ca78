//! Filter catalog: event filters and their folders

use crate::hierarchy::Hierarchy;
use crate::wire::{
    CreateFilterRequest, CreateFilterResponse, CreateFolderRequest, CreateFolderResponse,
    FilterInfoPdqlResponse, FilterInfoResponse, decode,
};
use mpsiem_client::{Connection, Method, exec_request};
use mpsiem_core::{Error, FilterDetail, FilterDetailPdql, FilterMap, FolderMap, Result};
use tracing::{debug, info, instrument};

const API_FILTERS_HIERARCHY: &str = "/api/v2/events/filters_hierarchy";
const API_FILTER_INFO: &str = "/api/v2/events/filters";
const API_FILTER: &str = "/api/v3/events/filters";
const API_FOLDER: &str = "/api/v2/events/folders";

/// Client for the SIEM core's event filters API.
///
/// The folder and filter listings come from a single hierarchy request and
/// are cached together after the first successful fetch. Creating a folder
/// or a filter drops the cache, so the next listing refetches.
///
/// Methods that touch the cache take `&mut self`; share a catalog between
/// tasks behind a mutex.
#[derive(Debug)]
pub struct FilterCatalog {
    connection: Connection,
    cache: Option<Hierarchy>,
}

impl FilterCatalog {
    pub fn new(connection: Connection) -> Self {
        debug!(
            status = "success",
            action = "prepare",
            hostname = %connection.hostname(),
            "Filters module init"
        );
        Self {
            connection,
            cache: None,
        }
    }

    pub fn hostname(&self) -> &str {
        self.connection.hostname()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// All folders, keyed by folder id
    pub async fn list_folders(&mut self) -> Result<&FolderMap> {
        let hierarchy = Self::load_hierarchy(&self.connection, &mut self.cache).await?;
        Ok(&hierarchy.folders)
    }

    /// All filters, keyed by filter id
    pub async fn list_filters(&mut self) -> Result<&FilterMap> {
        let fetched = self.cache.is_none();
        let filters = &Self::load_hierarchy(&self.connection, &mut self.cache)
            .await?
            .filters;

        if fetched {
            info!(
                status = "success",
                action = "get_filters_list",
                hostname = %self.connection.hostname(),
                "Got {} filters",
                filters.len()
            );
        }

        Ok(filters)
    }

    /// Ids of folders named `name`, ordered by id
    pub async fn find_folders_by_name(&mut self, name: &str) -> Result<Vec<String>> {
        let folders = self.list_folders().await?;
        Ok(folders
            .iter()
            .filter(|(_, folder)| folder.name == name)
            .map(|(id, _)| id.clone())
            .collect())
    }

    /// Ids of filters named `name`, ordered by id
    pub async fn find_filters_by_name(&mut self, name: &str) -> Result<Vec<String>> {
        let filters = self.list_filters().await?;
        Ok(filters
            .iter()
            .filter(|(_, filter)| filter.name == name)
            .map(|(id, _)| id.clone())
            .collect())
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Forget the cached listing; the next listing call refetches it
    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    /// Cached hierarchy, fetched on first use
    async fn load_hierarchy<'a>(
        connection: &Connection,
        cache: &'a mut Option<Hierarchy>,
    ) -> Result<&'a Hierarchy> {
        let hierarchy = match cache.take() {
            Some(cached) => cached,
            None => Self::fetch_hierarchy(connection).await?,
        };
        Ok(cache.insert(hierarchy))
    }

    #[instrument(skip(connection), fields(hostname = %connection.hostname()))]
    async fn fetch_hierarchy(connection: &Connection) -> Result<Hierarchy> {
        let body = exec_request(connection, Method::GET, API_FILTERS_HIERARCHY, None).await?;
        let hierarchy = Hierarchy::from_response(body)?;

        info!(
            status = "success",
            action = "get_folders_list",
            hostname = %connection.hostname(),
            folders = hierarchy.folders.len(),
            filters = hierarchy.filters.len(),
            "Got {} folders",
            hierarchy.folders.len()
        );

        Ok(hierarchy)
    }

    /// Create a folder under `parent_id` and return the new folder's id
    #[instrument(skip(self), fields(hostname = %self.hostname()))]
    pub async fn create_folder(&mut self, name: &str, parent_id: &str) -> Result<String> {
        let request = serde_json::to_value(CreateFolderRequest { name, parent_id })?;
        let body = exec_request(&self.connection, Method::POST, API_FOLDER, Some(&request)).await?;

        let response: CreateFolderResponse = decode(body, "create folder response")?;
        let folder_id = response
            .folder_id
            .ok_or_else(|| Error::missing_field("folderId", "create folder response"))?;

        self.clear_cache();
        info!(
            status = "success",
            action = "create_folder",
            hostname = %self.hostname(),
            folder_id = %folder_id,
            "Created folder {}",
            name
        );

        Ok(folder_id)
    }

    /// Create a PDQL filter in `folder_id` and return the new filter's id
    #[instrument(skip(self, pdql_query), fields(hostname = %self.hostname()))]
    pub async fn create_filter(
        &mut self,
        filter_name: &str,
        folder_id: &str,
        pdql_query: &str,
    ) -> Result<String> {
        let request = serde_json::to_value(CreateFilterRequest {
            folder_id,
            name: filter_name,
            pdql_query,
        })?;
        let body = exec_request(&self.connection, Method::POST, API_FILTER, Some(&request)).await?;

        let response: CreateFilterResponse = decode(body, "create filter response")?;
        let filter_id = response
            .id
            .ok_or_else(|| Error::missing_field("id", "create filter response"))?;

        self.clear_cache();
        info!(
            status = "success",
            action = "create_filter",
            hostname = %self.hostname(),
            filter_id = %filter_id,
            "Created filter {}",
            filter_name
        );

        Ok(filter_id)
    }

    /// Filter details in the structured (v2) representation
    #[instrument(skip(self), fields(hostname = %self.hostname()))]
    pub async fn get_filter_info(&self, filter_id: &str) -> Result<FilterDetail> {
        let path = format!("{}/{}", API_FILTER_INFO, filter_id);
        let body = exec_request(&self.connection, Method::GET, &path, None).await?;

        let info: FilterInfoResponse = decode(body, "filter info response")?;
        let detail = FilterDetail::try_from(info)?;

        info!(
            status = "success",
            action = "get_filter_info",
            hostname = %self.hostname(),
            "Got info for filter {}",
            filter_id
        );

        Ok(detail)
    }

    /// Filter details in the PDQL (v3) representation
    #[instrument(skip(self), fields(hostname = %self.hostname()))]
    pub async fn get_filter_info_pdql(&self, filter_id: &str) -> Result<FilterDetailPdql> {
        let path = format!("{}/{}", API_FILTER, filter_id);
        let body = exec_request(&self.connection, Method::GET, &path, None).await?;

        let info: FilterInfoPdqlResponse = decode(body, "filter info response")?;
        let detail = FilterDetailPdql::try_from(info)?;

        info!(
            status = "success",
            action = "get_filter_info_pdql",
            hostname = %self.hostname(),
            "Got info for filter {}",
            filter_id
        );

        Ok(detail)
    }

    /// Release the underlying HTTP session. Safe to call more than once.
    pub fn close(&mut self) {
        self.connection.close();
    }
}
