//! Advisory commentary over candidate plans.
//!
//! Plans are rendered to plain text and handed to a [`PlanAdvisor`]. The
//! bundled [`ChatAdvisor`] talks to any OpenAI-compatible chat completions
//! endpoint, such as a local llama.cpp or vLLM server.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AdvisorError;
use crate::model::{Item, Plan};
use crate::traits::PlanAdvisor;

/// Render one plan the way it is shown to the advisor.
///
/// ```text
/// Plan A (Average Distance: 3.25 km):
/// Bus 1: Ana -> Ben -> High School (Distance: 6.5 km)
/// ```
///
/// Empty groups keep their bus number but get no line.
pub fn render_plan(plan: &Plan, items: &[Item], destination: &str) -> String {
    let mut text = format!(
        "Plan {} (Average Distance: {:.2} km):",
        plan.label, plan.average_distance
    );
    for (bus, route) in plan.routes.iter().enumerate() {
        if route.stops.is_empty() {
            continue;
        }
        let names: Vec<&str> = route
            .stops
            .iter()
            .map(|&stop| items[stop].name.as_str())
            .collect();
        text.push_str(&format!(
            "\nBus {}: {} -> {} (Distance: {:.1} km)",
            bus + 1,
            names.join(" -> "),
            destination,
            route.distance
        ));
    }
    text
}

/// All candidate plans, separated by blank lines.
pub fn render_candidates(plans: &[Plan], items: &[Item], destination: &str) -> String {
    plans
        .iter()
        .map(|plan| render_plan(plan, items, destination))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(destination: &str, intent: &str, candidates: &str) -> String {
    format!(
        "You are an intelligent route planner helping assign students to buses based on a special user request.\n\
         The final destination is '{destination}'.\n\
         The user request is: '{intent}'.\n\
         Choose the plan (A, B, C, ...) that best satisfies the request while keeping the total travel distance minimal.\n\
         The best plan balances the user request with the shortest total travel distance for all buses.\n\
         Here are the candidate plans:\n\n{candidates}"
    )
}

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Server root; `/v1/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_tokens: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatAdvisor {
    config: AdvisorConfig,
    client: reqwest::blocking::Client,
}

impl ChatAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
        }
    }
}

impl PlanAdvisor for ChatAdvisor {
    fn advise(
        &self,
        destination: &str,
        intent: &str,
        candidates: &str,
    ) -> Result<String, AdvisorError> {
        let prompt = build_prompt(destination, intent, candidates);
        let mut request = self.client.post(self.endpoint()).json(&self.request_body(&prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let raw = request
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())?;

        let text = parse_reply(&raw)?;
        debug!(chars = text.len(), "advisor replied");
        Ok(text)
    }
}

fn parse_reply(raw: &str) -> Result<String, AdvisorError> {
    let body: ChatResponse = serde_json::from_str(raw)?;
    first_message(body).ok_or(AdvisorError::Empty)
}

fn first_message(body: ChatResponse) -> Option<String> {
    body.choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}
