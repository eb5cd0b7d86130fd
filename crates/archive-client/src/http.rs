//! reqwest implementation of the backend traits.

use std::path::Path;
use std::time::{Duration, Instant};

use archive_core::config::ApiConfig;
use archive_core::{ContractId, FeedbackValue};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::{ContractApi, QaApi, SearchApi};
use crate::envelope::ApiEnvelope;
use crate::error::ClientError;
use crate::wire::{
    AskRequest, ContractPage, ContractRecord, FeedbackRequest, HealthReport, HtmlContent,
    NaturalSearchRequest, OcrProcessReceipt, OcrStatusReport, QaRecord, SearchPage,
    SessionHistory, SessionPage, UploadReceipt,
};

/// HTTP client for the archive backend.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: Url,
    client: reqwest::Client,
}

/// FastAPI-style error body (`{"detail": "..."}`) or envelope failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

impl HttpClient {
    /// Create a client for the configured base URL.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("archive-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, mapping non-success statuses to [`ClientError::Status`].
    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let request = request.build()?;
        debug!(method = %request.method(), url = %request.url(), "API request");

        let started = Instant::now();
        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "API response"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_detail(&body);
        warn!(status = status.as_u16(), message = %message, "API error response");
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Send a request and unwrap the `data` of its envelope.
    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
        envelope.into_data()
    }

    /// Send a request whose envelope carries no payload.
    async fn fetch_unit(&self, request: RequestBuilder) -> Result<(), ClientError> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(&body)?;
        envelope.into_optional().map(|_| ())
    }
}

/// Human-readable reason from an error body. Never returns the raw body.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
            ..
        }) => detail,
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => String::new(),
    }
}

#[async_trait]
impl QaApi for HttpClient {
    async fn ask(&self, request: &AskRequest) -> Result<QaRecord, ClientError> {
        let url = self.endpoint(&["qa", "ask"])?;
        self.fetch(self.client.post(url).json(request)).await
    }

    async fn list_sessions(&self, page: u32, page_size: u32) -> Result<SessionPage, ClientError> {
        let url = self.endpoint(&["qa", "sessions"])?;
        let request = self.client.get(url).query(&[
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ]);
        self.fetch(request).await
    }

    async fn session_history(&self, session_id: &str) -> Result<SessionHistory, ClientError> {
        let url = self.endpoint(&["qa", "sessions", session_id])?;
        self.fetch(self.client.get(url)).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&["qa", "sessions", session_id])?;
        self.fetch_unit(self.client.delete(url)).await?;
        info!(session_id, "Session deleted");
        Ok(())
    }

    async fn submit_feedback(
        &self,
        session_id: &str,
        message_id: i64,
        feedback: FeedbackValue,
    ) -> Result<(), ClientError> {
        let message_id = message_id.to_string();
        let url = self.endpoint(&[
            "qa",
            "sessions",
            session_id,
            "messages",
            &message_id,
            "feedback",
        ])?;
        let body = FeedbackRequest { feedback };
        self.fetch_unit(self.client.post(url).json(&body)).await
    }
}

#[async_trait]
impl ContractApi for HttpClient {
    async fn health(&self) -> Result<HealthReport, ClientError> {
        let url = self.endpoint(&["health"])?;
        self.fetch(self.client.get(url)).await
    }

    async fn list_contracts(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<ContractPage, ClientError> {
        let url = self.endpoint(&["v1", "contracts", ""])?;
        let request = self.client.get(url).query(&[
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ]);
        self.fetch(request).await
    }

    async fn get_contract(&self, id: ContractId) -> Result<ContractRecord, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["v1", "contracts", &id])?;
        self.fetch(self.client.get(url)).await
    }

    async fn upload_contract(
        &self,
        path: &Path,
        contract_type: Option<&str>,
    ) -> Result<UploadReceipt, ClientError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let size = data.len();

        let form = Form::new().part("file", Part::bytes(data).file_name(file_name.clone()));
        let url = self.endpoint(&["v1", "contracts", "upload"])?;
        let mut request = self.client.post(url).multipart(form);
        if let Some(contract_type) = contract_type {
            request = request.query(&[("contract_type", contract_type)]);
        }

        let receipt: UploadReceipt = self.fetch(request).await?;
        info!(
            contract_id = receipt.contract_id,
            file_name = %file_name,
            bytes = size,
            "Contract uploaded"
        );
        Ok(receipt)
    }

    async fn ocr_status(&self, id: ContractId) -> Result<OcrStatusReport, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["v1", "contracts", &id, "ocr-status"])?;
        self.fetch(self.client.get(url)).await
    }

    async fn process_ocr(&self, id: ContractId) -> Result<OcrProcessReceipt, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["v1", "contracts", &id, "process-ocr"])?;
        self.fetch(self.client.post(url)).await
    }

    async fn delete_contract(&self, id: ContractId) -> Result<(), ClientError> {
        let id_str = id.to_string();
        let url = self.endpoint(&["v1", "contracts", &id_str])?;
        self.fetch_unit(self.client.delete(url)).await?;
        info!(contract_id = id, "Contract deleted");
        Ok(())
    }

    async fn html_content(&self, id: ContractId) -> Result<HtmlContent, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["v1", "contracts", &id, "html-content"])?;
        self.fetch(self.client.get(url)).await
    }

    async fn download_contract(&self, id: ContractId) -> Result<Vec<u8>, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["v1", "contracts", &id, "download"])?;
        let response = self.execute(self.client.get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SearchApi for HttpClient {
    async fn natural_search(
        &self,
        request: &NaturalSearchRequest,
    ) -> Result<SearchPage, ClientError> {
        let url = self.endpoint(&["search", "natural"])?;
        self.fetch(self.client.post(url).json(request)).await
    }

    async fn keyword_search(&self, keyword: &str, limit: u32) -> Result<SearchPage, ClientError> {
        let url = self.endpoint(&["search", "keyword"])?;
        let request = self
            .client
            .get(url)
            .query(&[("q", keyword.to_string()), ("limit", limit.to_string())]);
        self.fetch(request).await
    }
}
