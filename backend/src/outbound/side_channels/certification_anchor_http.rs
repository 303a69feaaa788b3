//! HTTP bridge that records earned certifications on a public ledger.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::dto::{AnchorRequestDto, AnchorResponseDto};
use crate::domain::ports::{
    AnchorReceipt, AnchorRequest, CertificationAnchor, CertificationAnchorError,
};

/// Certification anchor that POSTs each award to a ledger bridge.
pub struct HttpCertificationAnchor {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpCertificationAnchor {
    /// Build an anchor using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl CertificationAnchor for HttpCertificationAnchor {
    async fn anchor(
        &self,
        request: &AnchorRequest,
    ) -> Result<AnchorReceipt, CertificationAnchorError> {
        let mut call = self
            .client
            .post(self.endpoint.clone())
            .json(&AnchorRequestDto::from(request));
        if let Some(key) = &self.api_key {
            call = call.header("X-API-Key", key);
        }
        let response = call
            .send()
            .await
            .map_err(|err| CertificationAnchorError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CertificationAnchorError::status(status.as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| CertificationAnchorError::transport(err.to_string()))?;
        let receipt = parse_receipt(bytes.as_ref())?;
        debug!(
            user_id = %request.user_id,
            certification = %request.certification_name,
            reference = receipt.reference.as_deref().unwrap_or("pending"),
            "certification anchored"
        );
        Ok(receipt)
    }
}

fn parse_receipt(body: &[u8]) -> Result<AnchorReceipt, CertificationAnchorError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AnchorReceipt::default());
    }
    let decoded: AnchorResponseDto = serde_json::from_slice(body).map_err(|err| {
        CertificationAnchorError::decode(format!("invalid anchor response: {err}"))
    })?;
    Ok(AnchorReceipt {
        reference: decoded.transaction_hash,
    })
}
