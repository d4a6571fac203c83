use std::{sync::LazyLock, time::Duration};

use color_eyre::{Result, eyre};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

use folio_config::LlmProviderConfig;

static JSON_FENCE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok());

/// Sends a chat completion request and returns the trimmed text of the first choice.
pub async fn generate(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_text(&json)
}

pub fn parse_completion_text(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.ok_or_else(|| eyre::eyre!("Completion response is missing message content."))?;
	let text = match content {
		Value::String(text) => text.trim().to_string(),
		// Some gateways return content parts instead of a plain string.
		Value::Array(parts) => parts
			.iter()
			.filter_map(|part| part.get("text").and_then(Value::as_str))
			.collect::<Vec<_>>()
			.join("")
			.trim()
			.to_string(),
		_ => return Err(eyre::eyre!("Completion content must be text.")),
	};

	if text.is_empty() {
		return Err(eyre::eyre!("Completion response is empty."));
	}

	Ok(text)
}

/// Recovers a JSON value from model output.
///
/// A fenced block wins. Otherwise the span from the first `[` or `{` to the last `]` or `}` is
/// parsed.
pub fn extract_json(text: &str) -> Option<Value> {
	if let Some(fence) = JSON_FENCE.as_ref()
		&& let Some(captures) = fence.captures(text)
		&& let Some(body) = captures.get(1)
		&& let Ok(value) = serde_json::from_str(body.as_str().trim())
	{
		return Some(value);
	}

	let start = text.find(['[', '{'])?;
	let end = text.rfind([']', '}'])?;

	if end < start {
		return None;
	}

	serde_json::from_str(&text[start..=end]).ok()
}
