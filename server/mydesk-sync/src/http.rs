//! HTTP implementation of [`RemoteStore`] against the record server API
//!
//! Every request carries `Authorization: Bearer <token>` when a token is
//! configured and GETs add a `_ts` cache-busting query parameter.
//! Successful responses are the bare entity; failures carry a `message` or
//! `error` field.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::models::{
    AttendanceMap, NewRegisterEntry, NewTask, Profile, RegisterEntry,
    RegisterKind, RegisterPatch, Task,
};
use crate::remote_store::RemoteStore;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

impl HttpRemoteStore {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            token: config.auth_token.clone(),
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a session token
    pub async fn login(&self, username: &str, password: &str) -> SyncResult<String> {
        let data: LoginData = self
            .send(
                Method::POST,
                "/api/auth/login",
                Some(&json!({ "username": username, "password": password })),
            )
            .await?;
        Ok(data.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        let ts = chrono::Utc::now().timestamp_millis().to_string();
        let request = self
            .authorize(self.client.get(self.url(path)))
            .query(&[("_ts", ts.as_str())]);
        tracing::debug!(path, "GET");
        let response = request.send().await?;
        Self::read_body(response).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> SyncResult<T> {
        let mut request = self.authorize(self.client.request(method.clone(), self.url(path)));
        if let Some(body) = body {
            request = request.json(body);
        }
        tracing::debug!(%method, path, "request");
        let response = request.send().await?;
        Self::read_body(response).await
    }

    async fn read_body<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
        let status = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            return Err(SyncError::http(status.as_u16(), body.as_ref().and_then(error_message)));
        }

        Ok(serde_json::from_value(body.unwrap_or(Value::Null))?)
    }
}

/// `message` or `error` field of an error body
fn error_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

fn register_path(kind: RegisterKind) -> String {
    format!("/api/{}", kind.as_str())
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_registers(&self, kind: RegisterKind) -> SyncResult<Vec<RegisterEntry>> {
        self.get(&register_path(kind)).await
    }

    async fn create_register(
        &self,
        kind: RegisterKind,
        entry: &NewRegisterEntry,
    ) -> SyncResult<RegisterEntry> {
        self.send(Method::POST, &register_path(kind), Some(&entry.to_payload(kind)))
            .await
    }

    async fn update_register(
        &self,
        kind: RegisterKind,
        id: &str,
        patch: &RegisterPatch,
    ) -> SyncResult<RegisterEntry> {
        let path = format!("{}/{id}", register_path(kind));
        self.send(Method::PUT, &path, Some(&patch.to_payload(kind))).await
    }

    async fn delete_register(&self, kind: RegisterKind, id: &str) -> SyncResult<()> {
        let path = format!("{}/{id}", register_path(kind));
        let _: Value = self.send(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn get_attendance(&self) -> SyncResult<AttendanceMap> {
        let map: Option<AttendanceMap> = self.get("/api/attendance").await?;
        Ok(map.unwrap_or_default())
    }

    async fn upsert_attendance(&self, date: &str, record: &Value) -> SyncResult<()> {
        let body = json!({ "date": date, "record": record });
        let _: Value = self.send(Method::POST, "/api/attendance", Some(&body)).await?;
        Ok(())
    }

    async fn list_tasks(&self) -> SyncResult<Vec<Task>> {
        let tasks: Option<Vec<Task>> = self.get("/api/tasks").await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn create_task(&self, task: &NewTask) -> SyncResult<Task> {
        let body = serde_json::to_value(task)?;
        self.send(Method::POST, "/api/tasks", Some(&body)).await
    }

    async fn update_task(&self, id: &str, patch: &Value) -> SyncResult<Task> {
        self.send(Method::PUT, &format!("/api/tasks/{id}"), Some(patch))
            .await
    }

    async fn delete_task(&self, id: &str) -> SyncResult<()> {
        let _: Value = self
            .send(Method::DELETE, &format!("/api/tasks/{id}"), None)
            .await?;
        Ok(())
    }

    async fn get_profile(&self) -> SyncResult<Profile> {
        let profile: Option<Profile> = self.get("/api/profile").await?;
        Ok(profile.unwrap_or_default())
    }

    async fn save_profile(&self, profile: &Profile) -> SyncResult<Profile> {
        let body = serde_json::to_value(profile)?;
        self.send(Method::PUT, "/api/profile", Some(&body)).await
    }

    async fn get_offices(&self) -> SyncResult<Vec<String>> {
        let offices: Option<Vec<String>> = self.get("/api/offices").await?;
        Ok(offices.unwrap_or_default())
    }

    async fn save_offices(&self, offices: &[String]) -> SyncResult<Vec<String>> {
        self.send(Method::PUT, "/api/offices", Some(&json!(offices)))
            .await
    }
}
