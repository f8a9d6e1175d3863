//! Generative AI provider abstraction and the Gemini REST client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::Config;
use crate::error::GenerationError;

/// Structured-output text request
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub response_schema: Value,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    /// e.g. "1:1" or "4:3"
    pub aspect_ratio: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Returns the raw text of the first candidate
    async fn generate_text(&self, request: &TextRequest) -> Result<String, GenerationError>;

    /// Returns the first inline image as a `data:` URI
    async fn generate_image(&self, request: &ImageRequest) -> Result<String, GenerationError>;
}

pub fn create_provider(config: &Config) -> Box<dyn GenerativeProvider> {
    let gemini = &config.providers.gemini;
    Box::new(GeminiProvider::new(
        gemini.resolved_api_key(),
        &gemini.base_url,
        &config.generation.text_model,
        &config.generation.image_model,
    ))
}

pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        text_model: &str,
        image_model: &str,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            text_model: text_model.to_string(),
            image_model: image_model.to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn post(&self, model: &str, body: &Value) -> Result<Value, GenerationError> {
        // Checked per call: a missing key only fails the request that needs it.
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        check_response(status, text)
    }
}

/// Turn an HTTP status and body into the JSON payload or an API error.
fn check_response(status: u16, text: String) -> Result<Value, GenerationError> {
    let success = (200..300).contains(&status);
    let body: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) if !success => return Err(GenerationError::Api { status, message: text }),
        Err(e) => {
            return Err(GenerationError::Transport(format!(
                "Invalid JSON from Gemini: {}",
                e
            )));
        }
    };

    if let Some(error) = api_error(&body, status) {
        return Err(error);
    }
    // Proxies answer with JSON that has no `error` envelope
    if !success {
        return Err(GenerationError::Api { status, message: text });
    }

    Ok(body)
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate_text(&self, request: &TextRequest) -> Result<String, GenerationError> {
        let body = text_request_body(request);
        debug!(
            "Gemini text request ({}): {}",
            self.text_model,
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let response_body = self.post(&self.text_model, &body).await?;
        debug!(
            "Gemini text response: {}",
            serde_json::to_string_pretty(&response_body).unwrap_or_default()
        );

        parse_text_response(&response_body)
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<String, GenerationError> {
        let body = image_request_body(request);
        debug!(
            "Gemini image request ({}, {}): {}",
            self.image_model, request.aspect_ratio, request.prompt
        );

        let response_body = self.post(&self.image_model, &body).await?;
        let image = parse_image_response(&response_body)?;
        debug!("Gemini image response: {} bytes of data URI", image.len());

        Ok(image)
    }
}

pub(crate) fn text_request_body(request: &TextRequest) -> Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.response_schema,
            "temperature": request.temperature
        }
    })
}

pub(crate) fn image_request_body(request: &ImageRequest) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE"],
            "imageConfig": { "aspectRatio": request.aspect_ratio }
        }
    })
}

fn api_error(body: &Value, status: u16) -> Option<GenerationError> {
    let error = body.get("error")?;
    let code = error["code"]
        .as_u64()
        .map(|c| c as u16)
        .unwrap_or(status);
    let message = match (error["status"].as_str(), error["message"].as_str()) {
        (Some(s), Some(m)) => format!("{}: {}", s, m),
        (None, Some(m)) => m.to_string(),
        _ => error.to_string(),
    };
    Some(GenerationError::Api {
        status: code,
        message,
    })
}

fn first_candidate_parts(body: &Value) -> Result<&[Value], GenerationError> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(GenerationError::Blocked(reason.to_string()));
    }

    let candidate = &body["candidates"][0];
    let parts = candidate["content"]["parts"].as_array();

    match (parts, candidate["finishReason"].as_str()) {
        (Some(parts), _) if !parts.is_empty() => Ok(parts.as_slice()),
        (_, Some(reason)) if reason.contains("SAFETY") || reason == "PROHIBITED_CONTENT" => {
            Err(GenerationError::Blocked(reason.to_string()))
        }
        _ => Ok(&[][..]),
    }
}

/// Concatenate the text parts of the first candidate, skipping thoughts.
pub(crate) fn parse_text_response(body: &Value) -> Result<String, GenerationError> {
    let text: String = first_candidate_parts(body)?
        .iter()
        .filter(|p| !p["thought"].as_bool().unwrap_or(false))
        .filter_map(|p| p["text"].as_str())
        .collect();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

/// First inline image of the first candidate as a data URI.
pub(crate) fn parse_image_response(body: &Value) -> Result<String, GenerationError> {
    first_candidate_parts(body)?
        .iter()
        .find_map(|p| {
            let inline = p.get("inlineData").or_else(|| p.get("inline_data"))?;
            let data = inline["data"].as_str().filter(|d| !d.is_empty())?;
            let mime = inline["mimeType"]
                .as_str()
                .or_else(|| inline["mime_type"].as_str())
                .unwrap_or("image/png");
            Some(format!("data:{};base64,{}", mime, data))
        })
        .ok_or(GenerationError::NoImage)
}
