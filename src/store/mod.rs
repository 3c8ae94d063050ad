//! Client for the external record store (a PostgREST-style backend service).
//!
//! The store owns persistence and image generation. This client only issues
//! bounded reads, the role update, and the generation call, and turns any
//! non-success reply into a single [`AppError::Upstream`].

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::image::{GenerateImage, ImageRecord};
use crate::models::user::{UserRecord, UserRole};

/// Optional narrowing for image reads.
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    pub user_id: Option<String>,
    pub limit: Option<u32>,
}

/// Shared handle to the record store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_limit: u32,
}

impl StoreClient {
    pub fn new(base_url: &str, api_key: &str, page_limit: u32) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_limit: page_limit.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.store_url,
            &config.store_api_key,
            config.store_page_limit,
        )
    }

    /// Requested page size, capped by the configured page limit.
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.page_limit)
            .clamp(1, self.page_limit)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{name}", self.base_url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Newest users first, at most `limit` (capped by the page limit).
    pub async fn list_users(&self, limit: Option<u32>) -> Result<Vec<UserRecord>, AppError> {
        let limit = self.effective_limit(limit).to_string();
        let response = self
            .authorized(self.http.get(self.rest_url("users")))
            .query(&[
                ("select", "*"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        let users: Vec<UserRecord> = read_json(response).await?;
        tracing::debug!(count = users.len(), "Fetched users from record store");
        Ok(users)
    }

    /// Look up one user by id. `None` when the store has no such row.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, AppError> {
        let response = self
            .authorized(self.http.get(self.rest_url("users")))
            .query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{user_id}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let users: Vec<UserRecord> = read_json(response).await?;
        Ok(users.into_iter().next())
    }

    /// Newest images first, optionally restricted to one owner.
    pub async fn list_images(&self, filter: &ImageFilter) -> Result<Vec<ImageRecord>, AppError> {
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "created_at.desc".to_string()),
            (
                "limit".to_string(),
                self.effective_limit(filter.limit).to_string(),
            ),
        ];
        if let Some(user_id) = &filter.user_id {
            query.push(("user_id".to_string(), format!("eq.{user_id}")));
        }

        let response = self
            .authorized(self.http.get(self.rest_url("images")))
            .query(&query)
            .send()
            .await?;
        let images: Vec<ImageRecord> = read_json(response).await?;
        tracing::debug!(
            count = images.len(),
            user_id = filter.user_id.as_deref().unwrap_or("*"),
            "Fetched images from record store"
        );
        Ok(images)
    }

    /// Change a user's role and return the updated row.
    pub async fn update_user_role(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> Result<UserRecord, AppError> {
        let response = self
            .authorized(self.http.patch(self.rest_url("users")))
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=representation")
            .json(&json!({ "role": role }))
            .send()
            .await?;
        let updated: Vec<UserRecord> = read_json(response).await?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    /// Hand a generation request to the store's generation function.
    pub async fn generate_image(
        &self,
        user_id: &str,
        request: &GenerateImage,
    ) -> Result<ImageRecord, AppError> {
        let response = self
            .authorized(self.http.post(self.function_url("generate-image")))
            .json(&json!({
                "user_id": user_id,
                "prompt": request.prompt,
                "size": request.size,
                "quality": request.quality,
            }))
            .send()
            .await?;
        read_json(response).await
    }

    /// Readiness check against the REST root.
    pub async fn ping(&self) -> Result<(), AppError> {
        let response = self
            .authorized(self.http.get(format!("{}/rest/v1/", self.base_url)))
            .send()
            .await?;
        ensure_success(response).await.map(|_| ())
    }
}

async fn ensure_success(response: Response) -> Result<Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(AppError::Upstream(format!("{status} {text}")))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let response = ensure_success(response).await?;
    Ok(response.json().await?)
}
