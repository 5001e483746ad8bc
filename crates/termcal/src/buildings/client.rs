//! HTTP lookup of building descriptions.
//!
//! Issues one GET per abbreviation against a configured page, e.g.
//! `https://host/bldg?code=CAS`, and takes the text of the first element
//! matching a CSS selector as the description.

use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::BuildingLookupError;
use super::BuildingLookup;
use crate::schedule::{decode_latin1, normalize};

fn default_timeout_secs() -> u64 {
    10
}

fn default_concurrency() -> usize {
    8
}

/// Settings for [`HttpBuildingLookup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpLookupConfig {
    /// Page to query, without the abbreviation parameter
    pub url: String,
    /// Query parameter that carries the abbreviation
    pub query_param: String,
    /// CSS selector of the element holding the description
    pub selector: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum number of lookups in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Looks buildings up over HTTP.
pub struct HttpBuildingLookup {
    client: Client,
    base_url: Url,
    query_param: String,
    selector: String,
}

impl HttpBuildingLookup {
    /// Creates a lookup client, validating the URL and selector up front.
    pub fn new(config: &HttpLookupConfig) -> Result<Self, BuildingLookupError> {
        let base_url = Url::parse(&config.url)?;
        Selector::parse(&config.selector).map_err(|e| BuildingLookupError::Config {
            message: format!("invalid selector {:?}: {:?}", config.selector, e),
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BuildingLookupError::Network {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            query_param: config.query_param.clone(),
            selector: config.selector.clone(),
        })
    }

    /// URL queried for one abbreviation.
    pub fn lookup_url(&self, abbreviation: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.query_param, abbreviation);
        url
    }

    /// Pulls the description out of a building page.
    fn extract_description(&self, html: &str) -> Option<String> {
        let selector = Selector::parse(&self.selector).ok()?;
        let document = Html::parse_document(html);
        document
            .select(&selector)
            .next()
            .map(|el| normalize(&el.text().collect::<String>()))
            .filter(|description| !description.is_empty())
    }
}

impl BuildingLookup for HttpBuildingLookup {
    async fn describe(&self, abbreviation: &str) -> Result<Option<String>, BuildingLookupError> {
        let url = self.lookup_url(abbreviation);
        debug!(building = %abbreviation, url = %url, "Looking up building");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BuildingLookupError::UnexpectedResponse {
                message: format!("building page returned status {}", response.status()),
            });
        }

        // Same legacy charset as the schedule page.
        let body = response.bytes().await?;
        Ok(self.extract_description(&decode_latin1(&body)))
    }
}
