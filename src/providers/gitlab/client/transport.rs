use graphql_client::{QueryBody, Response as GraphQLResponse};
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{GlmrError, Result};

const MAX_CONCURRENT_REQUESTS: usize = 16;

/// HTTP transport for GitLab's GraphQL endpoint.
///
/// Failures are classified into authorization, validation and unknown-server
/// errors and returned immediately. Nothing is retried.
pub struct GitLabClient {
    client: Client,
    graphql_url: Url,
    token: Option<Token>,
    semaphore: Arc<Semaphore>,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("glmr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GlmrError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut base = Url::parse(base_url)
            .map_err(|e| GlmrError::Config(format!("Invalid base URL: {e}")))?;

        // Keep instances hosted under a sub-path (https://host/gitlab) intact on join.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let graphql_url = base
            .join("api/graphql")
            .map_err(|e| GlmrError::Config(format!("Invalid GraphQL URL: {e}")))?;

        Ok(Self {
            client,
            graphql_url,
            token,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    pub fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Sends one GraphQL operation and returns its `data`.
    ///
    /// # Errors
    ///
    /// * `Authorization` - HTTP 401/403, or an "invalid token" message
    /// * `Validation` - the envelope carries GraphQL `errors` (first message)
    /// * `UnknownServer` - any other non-2xx status or transport failure
    /// * `NoResponseData` - a successful envelope without `data`
    pub(super) async fn execute_graphql_request<V, T>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<T>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| GlmrError::UnknownServer(format!("Request limiter closed: {e}")))?;

        let body = QueryBody {
            variables,
            query,
            operation_name,
        };

        debug!("POST {} ({operation_name})", self.graphql_url);

        let response = self
            .auth_request(self.client.post(self.graphql_url.clone()).json(&body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(GlmrError::from_status(status.as_u16(), error_text));
        }

        let response_body: GraphQLResponse<T> = response.json().await?;

        if let Some(err) = response_body
            .errors
            .and_then(|errors| GlmrError::from_messages(errors.into_iter().map(|e| e.message)))
        {
            return Err(err);
        }

        response_body.data.ok_or(GlmrError::NoResponseData)
    }
}
