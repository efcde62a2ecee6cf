use std::time::Duration;

use anyhow::Context;
use docket_shared::{
  Case,
  Employee,
  Matter,
  Task,
  TaskDraft,
  TaskId
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{
  debug,
  instrument,
  warn
};

#[derive(Debug, Error)]
pub enum SourceError {
  #[error("{method} {url} failed: {source}")]
  Transport {
    method: &'static str,
    url:    String,
    #[source]
    source: reqwest::Error
  },
  #[error(
    "unexpected status {status} from \
     {method} {url}"
  )]
  UnexpectedStatus {
    method: &'static str,
    url:    String,
    status: u16
  },
  #[error("task {0} not found")]
  NotFound(TaskId),
  #[error(
    "malformed response from {method} \
     {url}: {source}"
  )]
  Decode {
    method: &'static str,
    url:    String,
    #[source]
    source: reqwest::Error
  }
}

/// The backend holding tasks and the
/// read-only reference lists.
// Futures are polled on a current-thread
// runtime, so no `Send` bound is imposed.
#[allow(async_fn_in_trait)]
pub trait DataSource {
  async fn list_tasks(
    &self
  ) -> Result<Vec<Task>, SourceError>;

  async fn create_task(
    &self,
    draft: &TaskDraft
  ) -> Result<Task, SourceError>;

  async fn update_task(
    &self,
    task: &Task
  ) -> Result<Task, SourceError>;

  async fn delete_task(
    &self,
    id: TaskId
  ) -> Result<(), SourceError>;

  async fn list_cases(
    &self
  ) -> Result<Vec<Case>, SourceError>;

  async fn list_matters(
    &self
  ) -> Result<Vec<Matter>, SourceError>;

  async fn list_employees(
    &self
  ) -> Result<Vec<Employee>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct HttpDataSource {
  client: reqwest::Client,
  base:   String
}

impl HttpDataSource {
  /// `base_url` is the collection root,
  /// e.g. `http://localhost:3001/pms/`.
  pub fn new(
    base_url: &str,
    timeout: Duration
  ) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .context(
        "failed building HTTP client \
         for the data source"
      )?;

    let base = if base_url.ends_with('/') {
      base_url.to_string()
    } else {
      format!("{base_url}/")
    };
    debug!(base = %base, ?timeout, "configured data source");

    Ok(Self {
      client,
      base
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base)
  }

  async fn send(
    &self,
    method: &'static str,
    url: &str,
    request: reqwest::RequestBuilder
  ) -> Result<reqwest::Response, SourceError>
  {
    let response =
      request.send().await.map_err(
        |source| {
          warn!(method, url, error = %source, "data source request failed");
          SourceError::Transport {
            method,
            url: url.to_string(),
            source
          }
        }
      )?;
    debug!(method, url, status = %response.status(), "data source responded");
    Ok(response)
  }

  async fn decode<T>(
    method: &'static str,
    url: &str,
    response: reqwest::Response
  ) -> Result<T, SourceError>
  where
    T: DeserializeOwned
  {
    response.json::<T>().await.map_err(
      |source| SourceError::Decode {
        method,
        url: url.to_string(),
        source
      }
    )
  }

  async fn get_list<T>(
    &self,
    path: &str
  ) -> Result<Vec<T>, SourceError>
  where
    T: DeserializeOwned
  {
    let url = self.url(path);
    let response = self
      .send("GET", &url, self.client.get(&url))
      .await?;
    expect_status(
      "GET",
      &url,
      response.status(),
      StatusCode::OK
    )?;
    Self::decode("GET", &url, response).await
  }
}

fn expect_status(
  method: &'static str,
  url: &str,
  status: StatusCode,
  expected: StatusCode
) -> Result<(), SourceError> {
  if status == expected {
    Ok(())
  } else {
    Err(SourceError::UnexpectedStatus {
      method,
      url: url.to_string(),
      status: status.as_u16()
    })
  }
}

impl DataSource for HttpDataSource {
  #[instrument(skip(self))]
  async fn list_tasks(
    &self
  ) -> Result<Vec<Task>, SourceError> {
    self.get_list("tasks/").await
  }

  #[instrument(skip(self, draft), fields(title = %draft.title))]
  async fn create_task(
    &self,
    draft: &TaskDraft
  ) -> Result<Task, SourceError> {
    let url = self.url("tasks/");
    let response = self
      .send(
        "POST",
        &url,
        self.client.post(&url).json(draft)
      )
      .await?;
    expect_status(
      "POST",
      &url,
      response.status(),
      StatusCode::CREATED
    )?;
    Self::decode("POST", &url, response).await
  }

  #[instrument(skip(self, task), fields(task_id = task.id))]
  async fn update_task(
    &self,
    task: &Task
  ) -> Result<Task, SourceError> {
    let url =
      self.url(&format!("tasks/{}", task.id));
    let response = self
      .send(
        "PUT",
        &url,
        self.client.put(&url).json(task)
      )
      .await?;
    if response.status()
      == StatusCode::NOT_FOUND
    {
      return Err(SourceError::NotFound(
        task.id
      ));
    }
    expect_status(
      "PUT",
      &url,
      response.status(),
      StatusCode::OK
    )?;
    Self::decode("PUT", &url, response).await
  }

  #[instrument(skip(self))]
  async fn delete_task(
    &self,
    id: TaskId
  ) -> Result<(), SourceError> {
    let url =
      self.url(&format!("tasks/{id}"));
    let response = self
      .send(
        "DELETE",
        &url,
        self.client.delete(&url)
      )
      .await?;
    if response.status()
      == StatusCode::NOT_FOUND
    {
      return Err(SourceError::NotFound(id));
    }
    expect_status(
      "DELETE",
      &url,
      response.status(),
      StatusCode::NO_CONTENT
    )
  }

  #[instrument(skip(self))]
  async fn list_cases(
    &self
  ) -> Result<Vec<Case>, SourceError> {
    self.get_list("cases/").await
  }

  #[instrument(skip(self))]
  async fn list_matters(
    &self
  ) -> Result<Vec<Matter>, SourceError> {
    self.get_list("matters/").await
  }

  #[instrument(skip(self))]
  async fn list_employees(
    &self
  ) -> Result<Vec<Employee>, SourceError>
  {
    self.get_list("employees/").await
  }
}
