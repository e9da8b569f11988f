//! Generic request commands: get, post, put, patch, delete, upload

use crate::output;
use crate::Format;
use anyhow::{ensure, Context, Result};
use reqwest::multipart::{Form, Part};
use rewards_api_client::{ApiClient, ApiResponse, QueryParams, RequestOptions};
use serde_json::Value;
use std::path::Path;

/// Verbs that carry a JSON body
#[derive(Debug, Clone, Copy)]
pub enum Verb {
    Post,
    Put,
    Patch,
}

/// Parse a `key=value` query argument
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// GET an endpoint with optional query parameters
pub async fn get(
    client: &ApiClient,
    endpoint: &str,
    query: &[(String, String)],
    format: Format,
) -> Result<()> {
    let params = query
        .iter()
        .fold(QueryParams::new(), |params, (key, value)| params.insert(key.as_str(), value));
    let response: ApiResponse<Value> = client.get_with_params(endpoint, &params).await;
    finish(&response, format)
}

/// Send a JSON body with POST, PUT or PATCH
pub async fn send(
    client: &ApiClient,
    verb: Verb,
    endpoint: &str,
    data: Option<&str>,
    format: Format,
) -> Result<()> {
    let body: Option<Value> = data
        .map(serde_json::from_str)
        .transpose()
        .context("--data is not valid JSON")?;

    let response: ApiResponse<Value> = match (verb, body) {
        (Verb::Post, Some(body)) => client.post(endpoint, &body).await,
        (Verb::Put, Some(body)) => client.put(endpoint, &body).await,
        (Verb::Patch, Some(body)) => client.patch(endpoint, &body).await,
        (verb, None) => {
            let options = match verb {
                Verb::Post => RequestOptions::post(),
                Verb::Put => RequestOptions::put(),
                Verb::Patch => RequestOptions::patch(),
            };
            client.request(endpoint, options).await
        }
    };
    finish(&response, format)
}

/// DELETE an endpoint
pub async fn delete(client: &ApiClient, endpoint: &str, format: Format) -> Result<()> {
    let response: ApiResponse<Value> = client.delete(endpoint).await;
    finish(&response, format)
}

/// Upload a file as a single multipart field
pub async fn upload(
    client: &ApiClient,
    endpoint: &str,
    file: &Path,
    field: &str,
    format: Format,
) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let form = Form::new().part(field.to_string(), Part::bytes(bytes).file_name(file_name));
    let response: ApiResponse<Value> = client.upload_file(endpoint, form).await;
    finish(&response, format)
}

fn finish(response: &ApiResponse<Value>, format: Format) -> Result<()> {
    match format {
        Format::Json => output::print_json(response)?,
        Format::Text => output::print_text(response)?,
    }
    ensure!(response.is_success(), "request failed");
    Ok(())
}
