use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::{
    entities::dj_users::DjUserEntity, repositories::dj_users::DjUserRepository,
    value_objects::user_metadata::MetadataPatch,
};

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone)]
pub struct SupabaseAuthConfig {
    pub project_url: String,
    pub service_role_key: String,
    pub timeout_secs: u64,
    pub page_size: u32,
}

/// Supabase Auth admin API client, authenticated with the service-role key.
/// https://supabase.com/docs/reference/api/auth-admin
pub struct SupabaseAuthAdmin {
    http: reqwest::Client,
    base_url: String,
    service_role_key: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct UsersPage {
    #[serde(default)]
    users: Vec<DjUserEntity>,
}

impl SupabaseAuthAdmin {
    pub fn new(config: SupabaseAuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build Supabase auth http client")?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/auth/v1/admin/users",
                config.project_url.trim_end_matches('/')
            ),
            service_role_key: config.service_role_key,
            page_size: config.page_size.max(1),
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.service_role_key))
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map(|b| b.trim().to_owned())
            .unwrap_or_default();
        let preview = body.chars().take(512).collect::<String>();

        error!(
            status = %status,
            context = %context,
            response_body = %preview,
            "supabase_auth: admin request failed"
        );

        Err(anyhow!(
            "Supabase auth admin request failed: {context} (status {status})"
        ))
    }

    pub async fn list_users_page(&self, page: u32) -> Result<Vec<DjUserEntity>> {
        let resp = self
            .authorized(self.http.get(&self.base_url))
            .query(&[("page", page), ("per_page", self.page_size)])
            .send()
            .await
            .context("failed to reach Supabase auth")?;
        let resp = Self::ensure_success(resp, "list users").await?;

        let page: UsersPage = resp.json().await.context("failed to decode users page")?;
        Ok(page.users)
    }
}

fn is_last_page(received: usize, page_size: u32) -> bool {
    received < page_size as usize
}

fn email_matches(user: &DjUserEntity, email: &str) -> bool {
    user.email
        .as_deref()
        .is_some_and(|candidate| candidate.trim().eq_ignore_ascii_case(email.trim()))
}

#[async_trait]
impl DjUserRepository for SupabaseAuthAdmin {
    async fn list_all_users(&self) -> Result<Vec<DjUserEntity>> {
        let mut users = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.list_users_page(page).await?;
            let received = batch.len();
            users.extend(batch);

            debug!(page, received, total = users.len(), "supabase_auth: fetched users page");

            if is_last_page(received, self.page_size) {
                break;
            }
            page += 1;
        }

        Ok(users)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<DjUserEntity>> {
        let resp = self
            .authorized(self.http.get(format!("{}/{}", self.base_url, user_id)))
            .send()
            .await
            .context("failed to reach Supabase auth")?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::ensure_success(resp, "get user").await?;

        let user: DjUserEntity = resp.json().await.context("failed to decode user")?;
        Ok(Some(user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<DjUserEntity>> {
        // The admin API has no email filter, so pages are scanned until a match.
        let mut page = 1;

        loop {
            let batch = self.list_users_page(page).await?;
            let received = batch.len();

            if let Some(user) = batch.into_iter().find(|user| email_matches(user, email)) {
                return Ok(Some(user));
            }

            if is_last_page(received, self.page_size) {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn update_metadata(&self, user_id: Uuid, patch: MetadataPatch) -> Result<DjUserEntity> {
        let body = json!({ "user_metadata": patch.into_value() });

        let resp = self
            .authorized(self.http.put(format!("{}/{}", self.base_url, user_id)))
            .json(&body)
            .send()
            .await
            .context("failed to reach Supabase auth")?;
        let resp = Self::ensure_success(resp, "update user metadata").await?;

        let user: DjUserEntity = resp.json().await.context("failed to decode user")?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::enums::subscription_plans::SubscriptionPlan;

    #[test]
    fn short_page_ends_pagination() {
        assert!(is_last_page(0, 1000));
        assert!(is_last_page(999, 1000));
        assert!(!is_last_page(1000, 1000));
    }

    #[test]
    fn decodes_admin_users_page() {
        let raw = r#"{
            "users": [
                {
                    "id": "5f0c7a52-9b39-4a6c-8d0e-2b1f6f0e8a11",
                    "email": "DJ@Example.com",
                    "created_at": "2024-01-01T00:00:00Z",
                    "user_metadata": {"subscription_plan": "pro", "dj_name": "Nova"}
                },
                {
                    "id": "0b7a1c2e-3d4f-4a5b-8c6d-7e8f9a0b1c2d",
                    "email": null,
                    "created_at": "2024-01-02T00:00:00Z"
                }
            ],
            "aud": "authenticated"
        }"#;

        let page: UsersPage = serde_json::from_str(raw).unwrap();

        assert_eq!(page.users.len(), 2);
        assert_eq!(
            page.users[0].user_metadata.subscription_plan,
            Some(SubscriptionPlan::Pro)
        );
        assert!(email_matches(&page.users[0], "dj@example.com "));
        assert!(!email_matches(&page.users[1], "dj@example.com"));
    }
}
