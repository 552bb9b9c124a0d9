//! Typed HTTP client for the notes API.

use std::time::Duration;

use jotter_core::{ApiResponse, DeleteAck, HealthStatus, Note, NoteInput};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::ClientError;

/// The operations the front end needs from the server.
#[async_trait::async_trait]
pub trait NotesApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Note>, ClientError>;

    async fn get(&self, id: &str) -> Result<Note, ClientError>;

    async fn create(&self, input: &NoteInput) -> Result<Note, ClientError>;

    async fn update(&self, id: &str, input: &NoteInput) -> Result<Note, ClientError>;

    async fn delete(&self, id: &str) -> Result<(), ClientError>;

    async fn health(&self) -> Result<HealthStatus, ClientError>;
}

/// [`NotesApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotesApi {
    base_url: String,
    client: Client,
}

impl HttpNotesApi {
    /// `timeout` bounds each request, connect included.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let body: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string(),
                });
            }
            Err(err) => return Err(ClientError::Decode(err.to_string())),
        };

        if !status.is_success() || !body.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body
                    .error
                    .unwrap_or_else(|| format!("Request failed with status {}", status)),
            });
        }

        body.data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))
    }
}

#[async_trait::async_trait]
impl NotesApi for HttpNotesApi {
    async fn list(&self) -> Result<Vec<Note>, ClientError> {
        self.send(self.client.get(self.url("/notes"))).await
    }

    async fn get(&self, id: &str) -> Result<Note, ClientError> {
        self.send(self.client.get(self.url(&format!("/notes/{}", id))))
            .await
    }

    async fn create(&self, input: &NoteInput) -> Result<Note, ClientError> {
        let note: Note = self
            .send(self.client.post(self.url("/notes")).json(input))
            .await?;
        tracing::debug!(id = %note.id, "Created note.");
        Ok(note)
    }

    async fn update(&self, id: &str, input: &NoteInput) -> Result<Note, ClientError> {
        let request = self
            .client
            .put(self.url(&format!("/notes/{}", id)))
            .json(input);
        let note: Note = self.send(request).await?;
        tracing::debug!(id = %note.id, "Updated note.");
        Ok(note)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let _: DeleteAck = self
            .send(self.client.delete(self.url(&format!("/notes/{}", id))))
            .await?;
        tracing::debug!(id, "Deleted note.");
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.send(self.client.get(self.url("/health"))).await
    }
}
