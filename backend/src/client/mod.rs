//! HTTP client for the user service.
//!
//! Error responses are mapped back onto [`ClientError`] using the `code`
//! field of the JSON error body, falling back to the status code when the
//! body is not the service's error shape.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::{CreateUserRequest, ErrorCode, UpdateUserRequest, User};
use crate::inbound::http::idempotency::IDEMPOTENCY_KEY_HEADER;
use crate::inbound::http::users::{DeleteUserResponse, UserListResponse};

/// Errors returned by [`UsersClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already in progress: {0}")]
    AlreadyInProgress(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("server error ({status}): {message}")]
    Server { status: StatusCode, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
    code: ErrorCode,
}

fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    let Ok(ErrorBody { error, code }) = serde_json::from_slice::<ErrorBody>(body) else {
        let message = String::from_utf8_lossy(body).into_owned();
        return match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY => ClientError::AlreadyInProgress(message),
            StatusCode::BAD_REQUEST => ClientError::InvalidRequest(message),
            _ => ClientError::Server { status, message },
        };
    };
    match code {
        ErrorCode::NotFound => ClientError::NotFound(error),
        ErrorCode::AlreadyInProgress => ClientError::AlreadyInProgress(error),
        ErrorCode::InvalidRequest => ClientError::InvalidRequest(error),
        ErrorCode::BuildFailed | ErrorCode::InternalError => ClientError::Server {
            status,
            message: error,
        },
    }
}

/// Typed client for the `/api/users` endpoints.
#[derive(Debug, Clone)]
pub struct UsersClient {
    client: Client,
    base_url: String,
}

impl UsersClient {
    /// Create a client for the service at `base_url` (for example
    /// `http://localhost:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(2))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response: Response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.bytes().await?;
        Err(error_from_response(status, &body))
    }

    /// Create a user, optionally deduplicated by `idempotency_key`.
    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
        idempotency_key: Option<&str>,
    ) -> Result<User, ClientError> {
        let mut builder = self.client.post(self.url("/users")).json(request);
        if let Some(key) = idempotency_key {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        Self::send(builder).await
    }

    pub async fn get_user(&self, id: &str) -> Result<User, ClientError> {
        Self::send(self.client.get(self.url(&format!("/users/{id}")))).await
    }

    pub async fn list_users(&self) -> Result<UserListResponse, ClientError> {
        Self::send(self.client.get(self.url("/users"))).await
    }

    pub async fn update_user(
        &self,
        id: &str,
        request: &UpdateUserRequest,
    ) -> Result<User, ClientError> {
        Self::send(self.client.put(self.url(&format!("/users/{id}"))).json(request)).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        let _: DeleteUserResponse =
            Self::send(self.client.delete(self.url(&format!("/users/{id}")))).await?;
        Ok(())
    }
}
