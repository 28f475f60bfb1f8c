//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Remote Catalog Client
//!
//! [`Catalog`] over the HTTP search API of a running server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::catalog::{Catalog, CatalogError, Hotel, Restaurant};
use crate::pagination::{PageRequest, PageResult};
use crate::search_query_builder::SearchFilter;

pub struct HttpCatalog {
    client: Arc<wreq::Client>,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, CatalogError> {
        let client = wreq::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn search_url(&self, path: &str, filter: &SearchFilter, page: PageRequest) -> String {
        let mut pairs = filter.to_query_pairs();
        pairs.push(("page", page.number().to_string()));
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}{}?{}", self.base_url, path, query)
    }

    /// `Ok(None)` on 404
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, CatalogError> {
        tracing::debug!("[get_json] GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        Ok(Some(response.json::<T>().await?))
    }

    async fn search<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> Result<PageResult<T>, CatalogError> {
        let url = self.search_url(path, filter, page);
        self.get_json(&url)
            .await?
            .ok_or(CatalogError::Status(404))
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn search_hotels(
        &self,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> Result<PageResult<Hotel>, CatalogError> {
        self.search("/api/user/home/search", filter, page).await
    }

    async fn search_restaurants(
        &self,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> Result<PageResult<Restaurant>, CatalogError> {
        self.search("/api/user/home/restaurants/search", filter, page)
            .await
    }

    async fn hotel(&self, id: &str) -> Result<Option<Hotel>, CatalogError> {
        let url = format!("{}/api/user/home/{}", self.base_url, urlencoding::encode(id));
        self.get_json(&url).await
    }

    async fn restaurant(&self, id: &str) -> Result<Option<Restaurant>, CatalogError> {
        let url = format!(
            "{}/api/user/home/restaurants/{}",
            self.base_url,
            urlencoding::encode(id)
        );
        self.get_json(&url).await
    }
}
