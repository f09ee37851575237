use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SolutionConfig;
use crate::error::{Result, WingmanError};
use crate::provider::{resolve_api_key, truncate};

/// Structured answer to an interview question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Step-by-step technical explanation of the approach.
    #[serde(default)]
    pub explanation: String,
    /// Conversational answer, phrased the way you would say it out loud.
    #[serde(default)]
    pub solution: String,
    /// Complete working code.
    #[serde(default)]
    pub code: String,
    /// Time and space complexity analysis.
    #[serde(default)]
    pub complexity: String,
    /// Tips for presenting the approach.
    #[serde(default)]
    pub strategy: String,
}

impl Solution {
    fn is_empty(&self) -> bool {
        self.explanation.is_empty()
            && self.solution.is_empty()
            && self.code.is_empty()
            && self.complexity.is_empty()
            && self.strategy.is_empty()
    }
}

/// What a solution call produced: the structured object when the model
/// returned parseable JSON, or its raw text when it did not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SolutionPayload {
    Structured(Solution),
    Raw(String),
}

/// Interpret a model reply as a `Solution` if at all possible.
///
/// Models wrap JSON in code fences or prose often enough that a strict parse
/// would throw away good answers: strip fences, try the whole body, then try
/// the outermost `{...}` span, and only then fall back to raw text.
pub fn parse_solution(raw: &str) -> SolutionPayload {
    let stripped = strip_code_fences(raw.trim());

    if let Some(solution) = try_parse(stripped) {
        return SolutionPayload::Structured(solution);
    }

    if let (Some(open), Some(close)) = (stripped.find('{'), stripped.rfind('}')) {
        if open < close {
            if let Some(solution) = try_parse(&stripped[open..=close]) {
                return SolutionPayload::Structured(solution);
            }
        }
    }

    SolutionPayload::Raw(raw.trim().to_string())
}

fn try_parse(text: &str) -> Option<Solution> {
    serde_json::from_str::<Solution>(text)
        .ok()
        .filter(|s| !s.is_empty())
}

fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Skip the info string ("json") on the opening fence line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };

    body.trim_end().trim_end_matches("```").trim()
}

/// LLM collaborator for question extraction and solution generation.
#[async_trait::async_trait]
pub trait SolutionProvider: Send + Sync {
    /// Pull the interview question out of captured material (a pasted
    /// problem statement or transcript text).
    async fn extract_question(&self, context: &str) -> Result<String>;

    /// Produce a solution for a question, with recent transcript as context.
    async fn solve(&self, question: &str, transcript: &str) -> Result<SolutionPayload>;

    /// Answer a follow-up against an earlier question and its solution.
    async fn follow_up(
        &self,
        question: &str,
        prior_code: &str,
        transcript: &str,
    ) -> Result<SolutionPayload>;

    /// Provider name for logging.
    fn name(&self) -> String;
}

const SOLUTION_FORMAT: &str = "Respond with a single JSON object containing string fields \
\"explanation\" (step-by-step technical explanation), \
\"solution\" (conversational answer as you would deliver it in an interview), \
\"code\" (complete working code), \
\"complexity\" (time and space complexity analysis), and \
\"strategy\" (tips for presenting the approach). Respond with the JSON object only.";

/// OpenAI-compatible `/chat/completions` client.
pub struct HttpSolver {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpSolver {
    pub fn new(config: &SolutionConfig) -> Result<Self> {
        let api_key = resolve_api_key(config.api_key.as_deref(), "solution.api_key")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WingmanError::Solution {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    async fn complete(&self, system: &str, user: String) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WingmanError::Solution {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WingmanError::Solution {
                message: format!("Provider returned {}: {}", status, truncate(&text, 200)),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| WingmanError::Solution {
            message: format!("Malformed provider response: {}", e),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| WingmanError::Solution {
                message: "Provider returned no choices".to_string(),
            })?;

        debug!("Completion returned {} chars", content.len());
        Ok(content)
    }
}

#[async_trait::async_trait]
impl SolutionProvider for HttpSolver {
    async fn extract_question(&self, context: &str) -> Result<String> {
        let system = "You are assisting in a live technical interview. Extract the interview \
                      question being asked in the material below. Respond with only the question \
                      text, nothing else.";
        let content = self.complete(system, context.to_string()).await?;
        Ok(content.trim().to_string())
    }

    async fn solve(&self, question: &str, transcript: &str) -> Result<SolutionPayload> {
        let system = format!(
            "You are assisting in a live technical interview. Solve the question below. {}",
            SOLUTION_FORMAT
        );

        let mut user = format!("Question:\n{}", question);
        if !transcript.is_empty() {
            user.push_str(&format!("\n\nRecent interview transcript:\n{}", transcript));
        }

        let content = self.complete(&system, user).await?;
        Ok(parse_solution(&content))
    }

    async fn follow_up(
        &self,
        question: &str,
        prior_code: &str,
        transcript: &str,
    ) -> Result<SolutionPayload> {
        let system = format!(
            "You are assisting in a live technical interview. The interviewer has asked a \
             follow-up about the solution below. Answer the follow-up. {}",
            SOLUTION_FORMAT
        );

        let mut user = format!("Original question:\n{}", question);
        if !prior_code.is_empty() {
            user.push_str(&format!("\n\nCurrent solution code:\n{}", prior_code));
        }
        if !transcript.is_empty() {
            user.push_str(&format!(
                "\n\nRecent interview transcript (the follow-up is at the end):\n{}",
                transcript
            ));
        }

        let content = self.complete(&system, user).await?;
        Ok(parse_solution(&content))
    }

    fn name(&self) -> String {
        format!("{} ({})", self.model, self.base_url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
