//! Async HTTP client for the larch REST API.
//!
//! Every request goes through `LarchClient::request`, which applies basic
//! auth and the shared CSRF header policy in one place.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use larch_model::endpoints::{ENTITY_COLLECTION, USER_COLLECTION, entity_path, join_url, user_path};
use larch_model::{CsrfToken, EntityPatch, Method, NewEntity, error_page_url};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderName, HeaderValue};
use serde_json::Value;

use crate::CliError;

pub(crate) struct LarchClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
    csrf: Option<CsrfToken>,
}

impl LarchClient {
    pub(crate) fn new(
        base_url: String,
        credentials: Option<(String, Option<String>)>,
        csrf: Option<CsrfToken>,
    ) -> Result<Self, CliError> {
        if let Some(token) = &csrf {
            validate_csrf_header(token)?;
        }
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url,
            credentials,
            csrf,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = join_url(&self.base_url, path);
        tracing::debug!(method = method.as_str(), %url, "sending request");
        let mut builder = self.http.request(to_reqwest_method(method), url);
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, password.as_deref());
        }
        if let Some((name, value)) = self.csrf.as_ref().and_then(|token| token.header_for(method)) {
            builder = builder.header(name, value);
        }
        builder
    }

    /// Send and return the body of a 2xx response.
    ///
    /// Failure bodies are read best effort; a 2xx body that cannot be read is
    /// a transport error.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, CliError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(server_error(&self.base_url, status, &body));
        }
        Ok(response.text().await?)
    }

    pub(crate) async fn create_entity(&self, entity: &NewEntity) -> Result<String, CliError> {
        let builder = self
            .request(Method::Post, ENTITY_COLLECTION)
            .header(ACCEPT, "text/plain")
            .json(entity);
        let body = self.send(builder).await?;
        let id = body.trim();
        if id.is_empty() {
            return Err(CliError::EmptyCreatedId);
        }
        tracing::info!(%id, "entity created");
        Ok(id.to_owned())
    }

    pub(crate) async fn fetch_entity(&self, id: &str) -> Result<Value, CliError> {
        let builder = self
            .request(Method::Get, &entity_path(id))
            .header(ACCEPT, "application/json");
        let body = self.send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn patch_entity(&self, id: &str, patch: &EntityPatch) -> Result<(), CliError> {
        let builder = self.request(Method::Patch, &entity_path(id)).json(patch);
        self.send(builder).await?;
        tracing::info!(%id, fields = patch.len(), "entity patched");
        Ok(())
    }

    pub(crate) async fn fetch_users(&self) -> Result<Value, CliError> {
        let builder = self
            .request(Method::Get, USER_COLLECTION)
            .header(ACCEPT, "application/json");
        let body = self.send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn delete_user(&self, name: &str) -> Result<(), CliError> {
        let builder = self.request(Method::Delete, &user_path(name));
        self.send(builder).await?;
        tracing::info!(%name, "user deleted");
        Ok(())
    }
}

/// Map a non-2xx response onto the error page the browser would show.
pub(crate) fn server_error(base_url: &str, status: StatusCode, body: &str) -> CliError {
    tracing::warn!(status = status.as_u16(), body = %body, "request failed");
    CliError::ServerError {
        status: status.as_u16(),
        error_page: join_url(base_url, &error_page_url(body)),
    }
}

pub(crate) fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Reject a token that cannot travel as an HTTP header before any request.
pub(crate) fn validate_csrf_header(token: &CsrfToken) -> Result<(), CliError> {
    HeaderName::from_bytes(token.header_name.as_bytes())
        .map_err(|e| CliError::InvalidHeader(e.to_string()))?;
    HeaderValue::from_str(&token.token).map_err(|e| CliError::InvalidHeader(e.to_string()))?;
    Ok(())
}
