use std::collections::BTreeMap;

use rusoto_core::credential::AwsCredentials;
use rusoto_core::signature::SignedRequest;
use rusoto_core::Region;

use crate::config::{Endpoint, TargetConfig};

pub const SERVICE: &str = "es";
pub const METHOD: &str = "POST";

static HOST_HEADER: &str = "host";
static PRESIGNED_EXPIRES_HEADER: &str = "presigned-expires";
static CONTENT_TYPE_HEADER: &str = "content-type";

/// One document write, built fresh for every record and consumed by signing.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    path: String,
    headers: BTreeMap<String, String>,
    body: String,
    region: Region,
}

impl OutboundRequest {
    pub fn build(config: &TargetConfig, body: String) -> Self {
        Self {
            path: document_path(&config.index, &config.document_type),
            headers: merge_headers(&config.endpoint),
            body,
            region: config.signing_region(),
        }
    }

    pub fn method(&self) -> &str {
        METHOD
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Header names are lower-cased.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn host(&self) -> Option<&str> {
        self.headers.get(HOST_HEADER).map(String::as_str)
    }

    /// Signs with SigV4 against the current wall clock. Adds `x-amz-date`,
    /// `x-amz-content-sha256`, `authorization` and, for session credentials,
    /// `x-amz-security-token`.
    pub fn sign(self, credentials: &AwsCredentials) -> SignedRequest {
        let mut request = SignedRequest::new(METHOD, SERVICE, &self.region, &self.path);
        for (name, value) in &self.headers {
            if name == HOST_HEADER {
                // The signer writes the host header from the hostname, which is
                // also where the request is sent.
                request.set_hostname(Some(value.clone()));
            } else {
                request.add_header(name.as_str(), value);
            }
        }
        request.set_payload(Some(self.body.into_bytes()));
        request.sign(credentials);
        request
    }
}

/// `/{index}/{document_type}` with no doubled slashes.
pub(crate) fn document_path(index: &str, document_type: &str) -> String {
    format!(
        "/{}/{}",
        index.trim_matches('/'),
        document_type.trim_matches('/')
    )
}

/// Defaults first, then the endpoint's own headers, so on a collision the
/// endpoint wins. Names compare case-insensitively.
pub(crate) fn merge_headers(endpoint: &Endpoint) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(PRESIGNED_EXPIRES_HEADER.to_string(), "false".to_string());
    headers.insert(HOST_HEADER.to_string(), endpoint.host.clone());
    // Without this the signer falls back to application/octet-stream.
    headers.insert(CONTENT_TYPE_HEADER.to_string(), "application/json".to_string());
    for (name, value) in &endpoint.headers {
        headers.insert(name.to_ascii_lowercase(), value.clone());
    }
    headers
}
