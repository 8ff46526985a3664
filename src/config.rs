use std::collections::BTreeMap;

use rusoto_core::Region;

use crate::error::{Error, Result};

static REGION_VAR: &str = "INDEXER_REGION";
static FALLBACK_REGION_VAR: &str = "AWS_REGION";
static ENDPOINT_VAR: &str = "INDEXER_ENDPOINT";
static INDEX_VAR: &str = "INDEXER_INDEX";
static DOC_TYPE_VAR: &str = "INDEXER_DOC_TYPE";

/// The search domain a batch is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub host: String,
    /// Headers the endpoint itself defines. These override the forwarder's defaults.
    pub headers: BTreeMap<String, String>,
}

impl Endpoint {
    /// Accepts either `https://host[/...]` or a bare host name.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (scheme, rest) = match raw.find("://") {
            Some(idx) => (&raw[..idx], &raw[idx + 3..]),
            None => ("https", raw),
        };
        if scheme != "https" && scheme != "http" {
            return Err(Error::Config(format!("unsupported endpoint scheme '{}'", scheme)));
        }

        let host = rest.split('/').next().unwrap_or_default();
        if host.is_empty() {
            return Err(Error::Config(format!("endpoint '{}' has no host", raw)));
        }

        Ok(Self {
            url: format!("{}://{}", scheme, host),
            host: host.to_string(),
            headers: BTreeMap::new(),
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Where and how documents are indexed. Fixed for the duration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub region: String,
    pub endpoint: Endpoint,
    pub index: String,
    pub document_type: String,
}

impl TargetConfig {
    pub fn new(
        region: impl Into<String>,
        endpoint: Endpoint,
        index: impl Into<String>,
        document_type: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            region: region.into(),
            endpoint,
            index: index.into(),
            document_type: document_type.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} must be set", key)))
        };

        let region = match lookup(REGION_VAR).filter(|value| !value.trim().is_empty()) {
            Some(region) => region,
            None => required(FALLBACK_REGION_VAR)
                .map_err(|_| Error::Config(format!("{} must be set", REGION_VAR)))?,
        };
        let endpoint = Endpoint::parse(&required(ENDPOINT_VAR)?)?;

        Self::new(
            region.trim(),
            endpoint,
            required(INDEX_VAR)?.trim(),
            required(DOC_TYPE_VAR)?.trim(),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(Error::Config("region is empty".to_string()));
        }
        if self.endpoint.host.is_empty() {
            return Err(Error::Config("endpoint host is empty".to_string()));
        }
        if self.index.trim_matches('/').is_empty() {
            return Err(Error::Config("index is empty".to_string()));
        }
        if self.document_type.trim_matches('/').is_empty() {
            return Err(Error::Config("document type is empty".to_string()));
        }
        Ok(())
    }

    /// Signing region. The endpoint is carried along so the region never has to
    /// match one of the well-known AWS names.
    pub fn signing_region(&self) -> Region {
        Region::Custom {
            name: self.region.clone(),
            endpoint: self.endpoint.url.clone(),
        }
    }
}
