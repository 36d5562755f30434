//! Asana REST API hierarchy client
//!
//! Endpoints:
//! 1. `GET /tasks/{gid}?opt_fields=gid,parent` for the parent link
//! 2. `GET /tasks/{gid}/subtasks?opt_fields=name&limit=100` for children
//!
//! Responses are wrapped in a `{ "data": ... }` envelope. Requests carry a
//! bearer token and a bounded timeout.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{Sibling, TaskId, TaskRef, PAGE_SIZE};
use crate::storage::AsanaConfig;

use super::{HierarchyClient, HierarchyError};

/// Asana hierarchy client
pub struct AsanaClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct GidRef {
    gid: TaskId,
}

#[derive(Debug, Deserialize)]
struct TaskBody {
    gid: TaskId,
    #[serde(default)]
    parent: Option<GidRef>,
}

#[derive(Debug, Deserialize)]
struct SubtaskBody {
    gid: TaskId,
    #[serde(default)]
    name: Option<String>,
}

impl AsanaClient {
    /// Creates a client against `base_url`
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Asana base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid Asana base URL: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Creates a client from project configuration, reading the token from
    /// the configured environment variable
    pub fn from_config(config: &AsanaConfig) -> anyhow::Result<Self> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.is_empty())
            .with_context(|| format!("Asana token not set: export {}", config.token_env))?;

        Self::new(
            &config.base_url,
            Some(token),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// `{base}/tasks/{id}[/{suffix}]`
    fn task_url(&self, id: &TaskId, suffix: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("tasks").push(id.as_str());
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        url
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        id: &TaskId,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, HierarchyError> {
        tracing::debug!(%url, "asana request");

        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(HierarchyError::transport)?;
        check_status(id, response.status())?;

        let body = response.text().map_err(HierarchyError::transport)?;
        parse_envelope(&body)
    }
}

/// Maps an HTTP status to the hierarchy error vocabulary
fn check_status(id: &TaskId, status: StatusCode) -> Result<(), HierarchyError> {
    if status == StatusCode::NOT_FOUND {
        return Err(HierarchyError::NotFound(id.clone()));
    }
    if !status.is_success() {
        return Err(HierarchyError::Transport(format!("API {}", status.as_u16())));
    }
    Ok(())
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, HierarchyError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| HierarchyError::Transport(format!("malformed response: {}", e)))
}

fn into_task_ref(body: TaskBody) -> TaskRef {
    TaskRef {
        id: body.gid,
        parent: body.parent.map(|p| p.gid),
    }
}

fn into_siblings(bodies: Vec<SubtaskBody>) -> Vec<Sibling> {
    bodies
        .into_iter()
        .take(PAGE_SIZE)
        .map(|s| Sibling::new(s.gid, s.name.unwrap_or_default()))
        .collect()
}

impl HierarchyClient for AsanaClient {
    fn get_task(&self, id: &TaskId) -> Result<TaskRef, HierarchyError> {
        let url = self.task_url(id, None);
        let body: TaskBody = self.fetch(id, url, &[("opt_fields", "gid,parent")])?;
        Ok(into_task_ref(body))
    }

    fn get_children(&self, parent: &TaskId) -> Result<Vec<Sibling>, HierarchyError> {
        let url = self.task_url(parent, Some("subtasks"));
        let limit = PAGE_SIZE.to_string();
        let bodies: Vec<SubtaskBody> =
            self.fetch(parent, url, &[("opt_fields", "name"), ("limit", limit.as_str())])?;
        Ok(into_siblings(bodies))
    }
}
