//! Web search collaborator.
//!
//! Opaque search service blended into the prompt when the caller asks for
//! live web context. Missing credentials degrade silently to "no web
//! context"; a failed search logs a warning and degrades the same way, so a
//! flaky search provider never fails the question.

use anyhow::Result;
use std::time::Duration;

use crate::config::WebSearchConfig;
use crate::models::WebResult;

pub async fn search_web(config: &WebSearchConfig, query: &str) -> Result<Vec<WebResult>> {
    let api_key = match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => return Ok(Vec::new()),
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "api_key": api_key,
        "query": query,
        "max_results": config.max_results,
    });

    let resp = match client.post(&config.endpoint).json(&body).send().await {
        Ok(resp) => resp,
        Err(e) => {
            eprintln!("web search failed: {}", e);
            return Ok(Vec::new());
        }
    };

    if !resp.status().is_success() {
        eprintln!("web search returned HTTP {}", resp.status());
        return Ok(Vec::new());
    }

    let json: serde_json::Value = match resp.json().await {
        Ok(json) => json,
        Err(e) => {
            eprintln!("web search returned malformed response: {}", e);
            return Ok(Vec::new());
        }
    };

    let results = json["results"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .take(config.max_results)
                .map(|item| WebResult {
                    title: item["title"].as_str().unwrap_or("(untitled)").to_string(),
                    url: item["url"].as_str().unwrap_or("").to_string(),
                    snippet: item["content"].as_str().unwrap_or("").to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(results)
}
