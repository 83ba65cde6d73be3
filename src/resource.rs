//! The upstream resources served by the proxy
//!
//! There are exactly two: the latest exchange rates and the currency list.
//! Each one has a stable cache key, a route, a fixed failure message and an
//! upstream URL derived from [`Upstream`].

use reqwest::Url;

/// Default base URL for the Open Exchange Rates API
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://openexchangerates.org/api";

/// A cached upstream resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Latest exchange rates (requires the app id)
    Rates,
    /// List of supported currencies
    Currencies,
}

impl Resource {
    /// Every resource, in a stable order
    pub const ALL: [Resource; 2] = [Resource::Rates, Resource::Currencies];

    /// Stable identifier used as cache slot and cache file stem
    pub fn key(&self) -> &'static str {
        match self {
            Resource::Rates => "latest",
            Resource::Currencies => "currencies",
        }
    }

    /// HTTP route serving this resource
    pub fn route(&self) -> &'static str {
        match self {
            Resource::Rates => "/api/latest",
            Resource::Currencies => "/api/currencies",
        }
    }

    /// Generic client-facing message returned when a refresh fails
    ///
    /// Never includes upstream error detail.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Resource::Rates => "Failed to fetch exchange rates",
            Resource::Currencies => "Failed to fetch currency list",
        }
    }

    /// Upstream endpoint file name, relative to the base URL
    fn upstream_path(&self) -> &'static str {
        match self {
            Resource::Rates => "latest.json",
            Resource::Currencies => "currencies.json",
        }
    }
}

/// Location and credentials of the upstream API
#[derive(Debug, Clone)]
pub struct Upstream {
    base_url: Url,
    app_id: String,
}

impl Upstream {
    /// Creates an upstream description; a trailing slash on the base is ignored
    pub fn new(base_url: Url, app_id: impl Into<String>) -> Self {
        Self {
            base_url,
            app_id: app_id.into(),
        }
    }

    /// Fully-formed URL for a resource, query parameters included and encoded
    pub fn url_for(&self, resource: Resource) -> String {
        let mut url = self.base_url.clone();
        // Bases that cannot carry a path are rejected when the config is built
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource.upstream_path());
        }
        if resource == Resource::Rates {
            url.query_pairs_mut().append_pair("app_id", &self.app_id);
        }
        url.to_string()
    }
}
