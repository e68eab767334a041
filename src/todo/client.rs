use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::api_types::{CreateTaskBody, WireTask};
use super::error::{ApiError, ApiResult};
use super::types::{CreateTodo, DeleteConfirmation, UpdateTodo};

/// How the deployed backend toggles completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BackendVariant {
  /// Completion is an ordinary field of `POST /tasks/{id}`
  #[default]
  Generic,
  /// Completion goes through `POST /tasks/{id}/complete` or `/incomplete`
  StateMachine,
}

/// The tasks HTTP API, seen through its wire types.
///
/// Implementations can talk to a real server or stand in for one in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
  /// `GET /tasks`
  async fn fetch_all(&self) -> ApiResult<Vec<WireTask>>;

  /// `GET /tasks/completed`
  async fn fetch_completed(&self) -> ApiResult<Vec<WireTask>>;

  /// `POST /tasks`
  async fn create(&self, input: &CreateTodo) -> ApiResult<WireTask>;

  /// `POST /tasks/{id}` with the requested fields
  async fn update(&self, id: &str, input: &UpdateTodo) -> ApiResult<WireTask>;

  /// `POST /tasks/{id}/complete` or `POST /tasks/{id}/incomplete`
  async fn set_completed(&self, id: &str, completed: bool) -> ApiResult<WireTask>;

  /// `DELETE /tasks/{id}`
  async fn delete(&self, id: &str) -> ApiResult<DeleteConfirmation>;
}

/// reqwest-backed client for the tasks API
#[derive(Clone)]
pub struct HttpTaskApi {
  client: Client,
  base_url: Url,
}

impl HttpTaskApi {
  pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
    let base_url =
      Url::parse(base_url).map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
    if base_url.cannot_be_a_base() {
      return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = Client::builder()
      .default_headers(headers)
      .timeout(timeout)
      .build()
      .map_err(ApiError::Client)?;

    Ok(Self { client, base_url })
  }

  /// Build `{base}/tasks/{segments...}`, escaping each segment.
  fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
      .pop_if_empty()
      .push("tasks")
      .extend(segments);
    Ok(url)
  }

  /// Send a request and return the body of a 2xx response.
  async fn execute(&self, request: RequestBuilder, url: &Url) -> ApiResult<String> {
    tracing::debug!(%url, "Sending request");

    let response = request.send().await.map_err(|e| transport_error(url, e))?;
    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| transport_error(url, e))?;

    if !status.is_success() {
      tracing::warn!(%url, status = status.as_u16(), "Request rejected by server");
      return Err(ApiError::from_status(status.as_u16(), &body));
    }

    Ok(body)
  }

  async fn execute_json<T: DeserializeOwned>(
    &self,
    request: RequestBuilder,
    url: &Url,
  ) -> ApiResult<T> {
    let body = self.execute(request, url).await?;
    serde_json::from_str(&body).map_err(|source| ApiError::Decode {
      url: url.to_string(),
      source,
    })
  }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
  async fn fetch_all(&self) -> ApiResult<Vec<WireTask>> {
    let url = self.endpoint(&[])?;
    self.execute_json(self.client.get(url.clone()), &url).await
  }

  async fn fetch_completed(&self) -> ApiResult<Vec<WireTask>> {
    let url = self.endpoint(&["completed"])?;
    self.execute_json(self.client.get(url.clone()), &url).await
  }

  async fn create(&self, input: &CreateTodo) -> ApiResult<WireTask> {
    let url = self.endpoint(&[])?;
    let request = self
      .client
      .post(url.clone())
      .json(&CreateTaskBody::from(input));
    self.execute_json(request, &url).await
  }

  async fn update(&self, id: &str, input: &UpdateTodo) -> ApiResult<WireTask> {
    let url = self.endpoint(&[id])?;
    let request = self.client.post(url.clone()).json(input);
    self.execute_json(request, &url).await
  }

  async fn set_completed(&self, id: &str, completed: bool) -> ApiResult<WireTask> {
    let action = if completed { "complete" } else { "incomplete" };
    let url = self.endpoint(&[id, action])?;
    self.execute_json(self.client.post(url.clone()), &url).await
  }

  async fn delete(&self, id: &str) -> ApiResult<DeleteConfirmation> {
    let url = self.endpoint(&[id])?;
    let body = self.execute(self.client.delete(url.clone()), &url).await?;
    Ok(DeleteConfirmation::from_body(&body))
  }
}

fn transport_error(url: &Url, error: reqwest::Error) -> ApiError {
  if error.is_timeout() {
    ApiError::Timeout {
      url: url.to_string(),
    }
  } else {
    ApiError::Transport {
      url: url.to_string(),
      source: Box::new(error),
    }
  }
}
