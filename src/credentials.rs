use chrono::Utc;
use rusoto_core::credential::{AwsCredentials, ChainProvider, ProvideAwsCredentials};

use crate::error::{Error, Result};

/// Resolves credentials once from the default provider chain (environment,
/// profile file, container role, instance metadata).
pub async fn resolve() -> Result<AwsCredentials> {
    let credentials = ChainProvider::new()
        .credentials()
        .await
        .map_err(|err| Error::Credentials(err.to_string()))?;
    validate(&credentials)?;
    tracing::debug!(
        access_key_id = credentials.aws_access_key_id(),
        session = credentials.token().is_some(),
        "resolved signing credentials"
    );
    Ok(credentials)
}

pub fn validate(credentials: &AwsCredentials) -> Result<()> {
    if credentials.aws_access_key_id().trim().is_empty() {
        return Err(Error::Credentials("access key id is empty".to_string()));
    }
    if credentials.aws_secret_access_key().trim().is_empty() {
        return Err(Error::Credentials("secret access key is empty".to_string()));
    }
    if matches!(credentials.expires_at(), Some(at) if *at <= Utc::now()) {
        return Err(Error::Credentials("credentials have expired".to_string()));
    }
    Ok(())
}
