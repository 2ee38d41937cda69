use crate::models::{
    AuthUrl, CurrentUser, DigestSchedule, DigestUpdate, Email, EmailListResponse, LlmPreferences,
    Model, ModelsResponse, StylesResponse, SummarizeResult, SummaryStyle, ThreadsResponse,
};
use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the cookie the backend issues after the OAuth callback.
pub const SESSION_COOKIE: &str = "access_token";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} {path} returned {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
    },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid api url {0}")]
    InvalidUrl(String),
}

/// Query parameters accepted by `GET /emails`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EmailQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub urgency_min: Option<u8>,
    pub category: Option<String>,
    pub action_required: Option<bool>,
}

impl EmailQuery {
    /// Ordered query-string pairs; unset fields and blank search text are omitted.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                params.push(("search", search.to_string()));
            }
        }
        if let Some(min) = self.urgency_min {
            params.push(("urgency_min", min.to_string()));
        }
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(action) = self.action_required {
            params.push(("action_required", action.to_string()));
        }
        params
    }
}

/// Everything the dashboard needs from the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Replace the session cookie sent with every request.
    fn set_session(&self, token: Option<String>);

    async fn list_emails(&self, query: &EmailQuery) -> Result<EmailListResponse, ApiError>;
    async fn get_email(&self, id: &str) -> Result<Email, ApiError>;
    async fn summarize(
        &self,
        id: &str,
        style: &str,
        model: Option<String>,
    ) -> Result<SummarizeResult, ApiError>;
    async fn list_threads(&self, page: u32) -> Result<ThreadsResponse, ApiError>;

    async fn list_models(&self) -> Result<Vec<Model>, ApiError>;
    async fn list_styles(&self) -> Result<Vec<SummaryStyle>, ApiError>;
    async fn update_llm(&self, prefs: &LlmPreferences) -> Result<(), ApiError>;
    async fn get_digest(&self) -> Result<DigestSchedule, ApiError>;
    async fn update_digest(&self, update: &DigestUpdate) -> Result<(), ApiError>;

    async fn gmail_auth_url(&self) -> Result<String, ApiError>;
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    session: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// `api_url` is the backend origin, e.g. `http://localhost:8000`.
    pub fn new(api_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(&format!("{}/api/v1/", api_url.trim_end_matches('/')))
            .map_err(|e| ApiError::InvalidUrl(format!("{api_url}: {e}")))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base,
            session: Arc::new(RwLock::new(None)),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut builder = self.http.request(method, self.endpoint(path)?);
        let token = self.session.read().ok().and_then(|s| s.clone());
        if let Some(token) = token {
            if let Ok(value) = HeaderValue::from_str(&format!("{SESSION_COOKIE}={token}")) {
                builder = builder.header(COOKIE, value);
            }
        }
        Ok(builder)
    }

    fn list_emails_request(&self, query: &EmailQuery) -> Result<RequestBuilder, ApiError> {
        Ok(self.request(Method::GET, "emails")?.query(&query.params()))
    }

    fn summarize_request(
        &self,
        id: &str,
        style: &str,
        model: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let mut params = vec![("style", style)];
        if let Some(model) = model {
            params.push(("model", model));
        }
        Ok(self
            .request(Method::POST, &format!("emails/{id}/summarize"))?
            .query(&params))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!("{} {}", method, request.url());

        let response = self.http.execute(request).await.inspect_err(|e| {
            warn!("{} {} failed: {}", method, path, e);
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} {} returned {}", method, path, status);
            return Err(ApiError::Status {
                method,
                path,
                status,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("{} {} returned an unexpected body: {}", method, path, e);
            ApiError::Decode(e)
        })
    }

    /// Sends a request whose response body is not needed.
    async fn send_discarding(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(builder).await.map(|_| ())
    }
}

#[async_trait]
impl Backend for ApiClient {
    fn set_session(&self, token: Option<String>) {
        if let Ok(mut session) = self.session.write() {
            *session = token;
        }
    }

    async fn list_emails(&self, query: &EmailQuery) -> Result<EmailListResponse, ApiError> {
        self.send(self.list_emails_request(query)?).await
    }

    async fn get_email(&self, id: &str) -> Result<Email, ApiError> {
        self.send(self.request(Method::GET, &format!("emails/{id}"))?)
            .await
    }

    async fn summarize(
        &self,
        id: &str,
        style: &str,
        model: Option<String>,
    ) -> Result<SummarizeResult, ApiError> {
        self.send(self.summarize_request(id, style, model.as_deref())?)
            .await
    }

    async fn list_threads(&self, page: u32) -> Result<ThreadsResponse, ApiError> {
        let builder = self
            .request(Method::GET, "emails/threads")?
            .query(&[("page", page)]);
        self.send(builder).await
    }

    async fn list_models(&self) -> Result<Vec<Model>, ApiError> {
        let resp: ModelsResponse = self
            .send(self.request(Method::GET, "settings/models")?)
            .await?;
        Ok(resp.models)
    }

    async fn list_styles(&self) -> Result<Vec<SummaryStyle>, ApiError> {
        let resp: StylesResponse = self
            .send(self.request(Method::GET, "settings/styles")?)
            .await?;
        Ok(resp.styles)
    }

    async fn update_llm(&self, prefs: &LlmPreferences) -> Result<(), ApiError> {
        self.send_discarding(self.request(Method::PUT, "settings/llm")?.json(prefs))
            .await
    }

    async fn get_digest(&self) -> Result<DigestSchedule, ApiError> {
        self.send(self.request(Method::GET, "settings/digest")?)
            .await
    }

    async fn update_digest(&self, update: &DigestUpdate) -> Result<(), ApiError> {
        self.send_discarding(self.request(Method::PUT, "settings/digest")?.json(update))
            .await
    }

    async fn gmail_auth_url(&self) -> Result<String, ApiError> {
        let resp: AuthUrl = self.send(self.request(Method::GET, "auth/gmail")?).await?;
        Ok(resp.auth_url)
    }

    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.send(self.request(Method::GET, "auth/me")?).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.send_discarding(self.request(Method::POST, "auth/logout")?)
            .await?;
        self.set_session(None);
        Ok(())
    }
}
