//! HTTP client for a Sigsum log
//!
//! Mirrors the [`Log`] capability over the log's HTTP API. Responses that
//! carry a tree head are checked against the configured log key before
//! they are returned; callers judge cosignatures with their own policy.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::api::{ApiError, Log, SubmitHeader, SUBMIT_HEADER_NAME};
use sigsum_crypto::PublicKey;
use sigsum_types::requests;
use sigsum_types::{
    leaves_from_ascii, ConsistencyProof, CosignedTreeHead, Endpoint, InclusionProof, Leaf,
    SignedTreeHead, TreeHead,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub user_agent: String,
    pub log_url: String,
    pub log_public_key: PublicKey,
}

/// A [`Log`] backed by HTTP requests to a single log instance.
pub struct Client {
    config: Config,
    base_url: String,
    client: reqwest::Client,
}

// Transient transport errors are retried with exponential backoff.
const RETRY_SCHEDULE: [u64; 3] = [1, 2, 4];

impl Client {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let url = Url::parse(&config.log_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid log URL: {e}")))?;
        let mut base_url = url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            config,
            base_url,
            client: reqwest::Client::new(),
        })
    }

    /// The tree head the log is currently collecting cosignatures for,
    /// before it is signed.
    pub async fn get_unsigned_tree_head(&self) -> Result<TreeHead, ApiError> {
        let body = self
            .get(Endpoint::GetTreeHeadUnsigned.path(&self.base_url))
            .await?;
        TreeHead::from_ascii(&body).map_err(parse_error)
    }

    /// The signed tree head being handed to witnesses for cosigning.
    pub async fn get_next_tree_head(&self) -> Result<SignedTreeHead, ApiError> {
        let body = self
            .get(Endpoint::GetNextTreeHead.path(&self.base_url))
            .await?;
        let sth = SignedTreeHead::from_ascii(&body).map_err(parse_error)?;
        if !sth.verify(&self.config.log_public_key) {
            return Err(ApiError::BadResponse("invalid log signature".into()));
        }
        Ok(sth)
    }

    async fn get(&self, url: String) -> Result<String, ApiError> {
        self.do_request(self.client.get(&url), &url).await
    }

    async fn do_request(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<String, ApiError> {
        let request = request
            .header(reqwest::header::USER_AGENT, self.config.user_agent.as_str())
            .build()?;

        let mut attempt = 0;
        let response = loop {
            let this_try = request
                .try_clone()
                .ok_or_else(|| ApiError::InvalidRequest("request body not retryable".into()))?;
            tracing::debug!(url, attempt, "requesting");
            match self.client.execute(this_try).await {
                Ok(rsp) => break rsp,
                Err(err) if attempt < RETRY_SCHEDULE.len() => {
                    let wait = RETRY_SCHEDULE[attempt];
                    tracing::debug!(url, %err, "retrying in {wait}s");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        };

        let status = response.status();
        let body = response.text().await?;
        match status {
            reqwest::StatusCode::OK => Ok(body),
            reqwest::StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            reqwest::StatusCode::ACCEPTED => Err(ApiError::Accepted),
            _ => Err(ApiError::BadResponse(format!(
                "status code {status}, server: {body:?}"
            ))),
        }
    }
}

fn parse_error(err: sigsum_types::Error) -> ApiError {
    ApiError::BadResponse(format!("parse: {err}"))
}

#[async_trait]
impl Log for Client {
    async fn get_tree_head(&self) -> Result<CosignedTreeHead, ApiError> {
        let body = self.get(Endpoint::GetTreeHead.path(&self.base_url)).await?;
        let cth = CosignedTreeHead::from_ascii(&body).map_err(parse_error)?;
        if !cth.verify(&self.config.log_public_key) {
            return Err(ApiError::BadResponse("invalid log signature".into()));
        }
        Ok(cth)
    }

    async fn get_inclusion_proof(
        &self,
        req: requests::InclusionProof,
    ) -> Result<InclusionProof, ApiError> {
        let url = req.to_url(&Endpoint::GetInclusionProof.path(&self.base_url));
        let proof = InclusionProof::from_ascii(&self.get(url).await?).map_err(parse_error)?;
        if proof.tree_size != req.size {
            return Err(ApiError::BadResponse(format!(
                "proof for tree size {}, requested {}",
                proof.tree_size, req.size
            )));
        }
        Ok(proof)
    }

    async fn get_consistency_proof(
        &self,
        req: requests::ConsistencyProof,
    ) -> Result<ConsistencyProof, ApiError> {
        let url = req.to_url(&Endpoint::GetConsistencyProof.path(&self.base_url));
        let proof = ConsistencyProof::from_ascii(&self.get(url).await?).map_err(parse_error)?;
        if proof.old_size != req.old_size || proof.new_size != req.new_size {
            return Err(ApiError::BadResponse("proof for other tree sizes".into()));
        }
        Ok(proof)
    }

    async fn get_leaves(&self, req: requests::Leaves) -> Result<Vec<Leaf>, ApiError> {
        let url = req.to_url(&Endpoint::GetLeaves.path(&self.base_url));
        leaves_from_ascii(&self.get(url).await?).map_err(parse_error)
    }

    async fn add_leaf(
        &self,
        req: requests::Leaf,
        header: Option<SubmitHeader>,
    ) -> Result<bool, ApiError> {
        let mut body = String::new();
        req.to_ascii(&mut body);
        let url = Endpoint::AddLeaf.path(&self.base_url);
        let mut request = self.client.post(&url).body(body);
        if let Some(SubmitHeader(token)) = header {
            request = request.header(SUBMIT_HEADER_NAME, token);
        }
        match self.do_request(request, &url).await {
            Ok(_) => Ok(true),
            Err(ApiError::Accepted) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(url: &str) -> Config {
        Config {
            user_agent: "sigsum-client-test".into(),
            log_url: url.into(),
            log_public_key: [0; 32],
        }
    }

    #[test]
    fn base_url_is_slash_terminated() {
        let client = Client::new(test_config("https://log.example.org/prefix")).unwrap();
        assert_eq!(client.base_url, "https://log.example.org/prefix/");
        let client = Client::new(test_config("https://log.example.org/prefix/")).unwrap();
        assert_eq!(client.base_url, "https://log.example.org/prefix/");
    }

    #[test]
    fn rejects_unparsable_url() {
        assert!(matches!(
            Client::new(test_config("not a url")),
            Err(ApiError::InvalidRequest(_))
        ));
    }
}
