//! HTTP client for the Yunxiao OpenAPI.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::error::{Result, YunxiaoError, format_error_body};
use crate::shared::config::ApiConfig;
use crate::shared::env_var::EnvVars;

const TOKEN_HEADER: &str = "x-yunxiao-token";

/// Characters left unescaped in path segments. Repository IDs may be
/// `group/repo` paths, so `/` must be escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Production client: one per invocation.
pub struct YunxiaoClient {
    http: reqwest::Client,
    base_url: String,
}

impl YunxiaoClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            TOKEN_HEADER,
            HeaderValue::from_str(token)
                .map_err(|e| YunxiaoError::InvalidToken(e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("yx/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(YunxiaoError::from)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from config, reading the token from `api.token_env`.
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let token = EnvVars::token(&api.token_env)
            .ok_or_else(|| YunxiaoError::MissingToken(api.token_env.clone()))?;
        Self::new(&api.base_url, &token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(YunxiaoError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(YunxiaoError::from)?;

        if !status.is_success() {
            return Err(YunxiaoError::Api {
                status: status.as_u16(),
                message: format_error_body(&body),
            }
            .into());
        }
        Ok(body)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "yunxiao request");
        self.http.request(method, url)
    }

    /// GET a JSON document. An empty body is returned as `null`.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let body = self.send(self.request(Method::GET, path).query(query)).await?;
        parse_body(&body)
    }

    /// POST a JSON body and parse the JSON reply.
    pub async fn post_json(&self, path: &str, payload: &Value) -> Result<Value> {
        let body = self
            .send(self.request(Method::POST, path).json(payload))
            .await?;
        parse_body(&body)
    }
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// Percent-encode a single path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// `/oapi/v1/codeup/organizations/{org}/repositories/{repo}`
pub fn repository_path(organization_id: &str, repository_id: &str) -> String {
    format!(
        "/oapi/v1/codeup/organizations/{}/repositories/{}",
        encode_segment(organization_id),
        encode_segment(repository_id)
    )
}

/// `.../changeRequests/{local_id}`
pub fn change_request_path(organization_id: &str, repository_id: &str, local_id: u64) -> String {
    format!(
        "{}/changeRequests/{local_id}",
        repository_path(organization_id, repository_id)
    )
}
