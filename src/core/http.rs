use crate::domain::model::{Grade, LoginRequest, NewGrade, NewUser, User};
use crate::domain::ports::{GradingApi, SessionStore};
use crate::utils::error::{GradebookError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// reqwest 實作的後端客戶端
///
/// 每次呼叫時才從 session store 讀 token，登入或登出後不需要重建客戶端。
pub struct HttpGradingApi {
    client: Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
}

impl HttpGradingApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 加上 JSON 與 Bearer 標頭
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let request = request.header(CONTENT_TYPE, "application/json");
        match self.store.load_token()? {
            Some(token) => Ok(request.bearer_auth(token)),
            None => {
                tracing::debug!("No stored token, sending request without Authorization");
                Ok(request)
            }
        }
    }

    /// 非 2xx 一律轉成 ApiError，訊息優先使用伺服器回傳的文字
    async fn check(response: Response, fallback: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = if text.trim().is_empty() {
            fallback.to_string()
        } else {
            text
        };
        tracing::warn!("📡 API responded {}: {}", status, message);
        Err(GradebookError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T> {
        tracing::debug!("📡 GET {}", path);
        let request = self.authorized(self.client.get(self.url(path)))?;
        let response = Self::check(request.send().await?, fallback).await?;
        Self::decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("📡 POST {}", path);
        let request = self.authorized(self.client.post(self.url(path)))?.json(body);
        let response = Self::check(request.send().await?, fallback).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl GradingApi for HttpGradingApi {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        tracing::debug!("📡 POST /auth/login for {}", email);
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let response = Self::check(response, "Login failed").await?;
        let token = response.text().await?;
        Ok(token.trim().to_string())
    }

    async fn all_users(&self) -> Result<Vec<User>> {
        self.get_json("/api/users", "Failed to fetch users").await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.post_json("/api/users", user, "Failed to create user")
            .await
    }

    async fn all_students(&self) -> Result<Vec<User>> {
        self.get_json("/api/users/students", "Failed to fetch students")
            .await
    }

    async fn all_parents(&self) -> Result<Vec<User>> {
        self.get_json("/api/users/parents", "Failed to fetch parents")
            .await
    }

    async fn teacher_by_id(&self, id: i64) -> Result<User> {
        self.get_json(&format!("/api/users/teachers/{}", id), "Failed to fetch teacher")
            .await
    }

    async fn children_of_parent(&self, parent_id: i64) -> Result<Vec<User>> {
        self.get_json(
            &format!("/api/users/parents/{}/children", parent_id),
            "Failed to fetch children",
        )
        .await
    }

    async fn user_by_id(&self, id: i64) -> Result<User> {
        self.get_json(&format!("/api/users/{}", id), "Failed to fetch user")
            .await
    }

    async fn all_grades(&self) -> Result<Vec<Grade>> {
        self.get_json("/api/grades", "Failed to fetch grades").await
    }

    async fn create_grade(&self, grade: &NewGrade) -> Result<Grade> {
        self.post_json("/api/grades", grade, "Failed to create grade")
            .await
    }

    async fn grades_for_student(&self, student_id: i64) -> Result<Vec<Grade>> {
        self.get_json(
            &format!("/api/grades/student/{}", student_id),
            "Failed to fetch grades",
        )
        .await
    }

    async fn grades_for_parent(&self, parent_id: i64) -> Result<Vec<Grade>> {
        self.get_json(
            &format!("/api/grades/parent/{}", parent_id),
            "Failed to fetch grades",
        )
        .await
    }
}
