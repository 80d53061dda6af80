//! Remote gateway — talks to the strategy backend over HTTP.
//!
//! Every operation is a single JSON POST. Any transport failure or non-2xx
//! status becomes one `GatewayError` for that operation; nothing is retried.

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::GatewayError;
use crate::flow::{Goal, OptionCard};

use super::{
    Checklist, EntryReceipt, ExportRequest, FramingReceipt, Gateway, OptionsRequest, PlanDocument,
};

/// Backend endpoint paths.
pub mod endpoints {
    pub const CONTEXT: &str = "/context";
    pub const DECISION: &str = "/decision";
    pub const BETS: &str = "/bets";
    pub const PLAN_GENERATOR: &str = "/plan-generator";
    pub const PLAN_EXPORT: &str = "/plan-export-pdf";
}

/// Media type assumed when the backend omits `Content-Type` on an export.
const DEFAULT_EXPORT_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP gateway to the strategy backend.
pub struct RemoteGateway {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Url::parse(base_url).map_err(|e| {
            GatewayError::Configuration(format!("invalid base url {base_url:?}: {e}"))
        })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST `body` as JSON and return the response if it is 2xx.
    async fn post<B>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
    {
        tracing::debug!(operation, path, "Remote gateway call");

        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(operation, "Request failed: {}", e);
                GatewayError::Transport {
                    operation: operation.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(operation, status = status.as_u16(), "Backend returned an error");
            return Err(GatewayError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }

    async fn post_json<B, T>(&self, operation: &str, path: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let resp = self.post(operation, path, body).await?;
        resp.json::<T>().await.map_err(|e| GatewayError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Gateway for RemoteGateway {
    fn name(&self) -> &str {
        "remote"
    }

    async fn submit_entry(&self, answer: &str) -> Result<EntryReceipt, GatewayError> {
        let body = serde_json::json!({ "answer": answer });
        self.post_json("submit_entry", endpoints::CONTEXT, &body)
            .await
    }

    async fn frame_goal(&self, goal: &Goal) -> Result<FramingReceipt, GatewayError> {
        self.post_json("frame_goal", endpoints::DECISION, goal).await
    }

    async fn fetch_options(
        &self,
        request: &OptionsRequest,
    ) -> Result<Vec<OptionCard>, GatewayError> {
        self.post_json("fetch_options", endpoints::BETS, request)
            .await
    }

    async fn fetch_checklist(&self, option: &OptionCard) -> Result<Checklist, GatewayError> {
        let body = serde_json::json!({ "selected_option": option });
        self.post_json("fetch_checklist", endpoints::PLAN_GENERATOR, &body)
            .await
    }

    async fn export_plan(&self, request: &ExportRequest) -> Result<PlanDocument, GatewayError> {
        let operation = "export_plan";
        let resp = self.post(operation, endpoints::PLAN_EXPORT, request).await?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_EXPORT_CONTENT_TYPE)
            .to_string();

        let bytes = resp.bytes().await.map_err(|e| GatewayError::Transport {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        Ok(PlanDocument::new(bytes.to_vec(), content_type))
    }
}
