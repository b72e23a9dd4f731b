// Clientes de LLM usados pelas features de IA
//
// Groq:   API compatível com OpenAI (chat completions)
// Gemini: generateContent
//
// Configuração via env:
//   GROQ_API_KEY, GROQ_MODEL (default llama3-70b-8192), GROQ_FAST_MODEL (default llama3-8b-8192)
//   GEMINI_API_KEY, GEMINI_MODEL (default gemini-2.0-flash)
//   LLM_TIMEOUT_SECS (default 60, aplicado no cliente HTTP compartilhado)

use serde::{Deserialize, Serialize};
use std::env;

use crate::utils::http_client::http_client;

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const DEFAULT_GROQ_MODEL: &str = "llama3-70b-8192";
const DEFAULT_GROQ_FAST_MODEL: &str = "llama3-8b-8192";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Qual modelo Groq usar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroqModel {
    /// Modelo maior: perguntas/feedback de entrevista, currículo
    Default,
    /// Modelo rápido: soft skills, roadmap, projetos, blogs
    Fast,
}

impl GroqModel {
    pub fn name(&self) -> String {
        match self {
            GroqModel::Default => env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string()),
            GroqModel::Fast => {
                env::var("GROQ_FAST_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_FAST_MODEL.to_string())
            }
        }
    }
}

/// Parâmetros opcionais de geração
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn creative(max_tokens: u32) -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: Some(max_tokens),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: String,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

fn build_chat_request<'a>(model: GroqModel, system: &'a str, prompt: &'a str, options: ChatOptions) -> ChatRequest<'a> {
    ChatRequest {
        model: model.name(),
        messages: vec![
            ChatMessage { role: "system", content: system },
            ChatMessage { role: "user", content: prompt },
        ],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    }
}

fn chat_content(response: ChatResponse) -> Result<String, String> {
    if let Some(err) = response.error {
        return Err(format!("Groq API error: {}", err.message));
    }
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| "Groq returned an empty completion".to_string())
}

/// Chamada de chat completion no Groq; retorna o texto da primeira escolha
pub async fn groq_chat(
    model: GroqModel,
    system: &str,
    prompt: &str,
    options: ChatOptions,
) -> Result<String, String> {
    let api_key = env::var("GROQ_API_KEY").map_err(|_| "GROQ_API_KEY not configured".to_string())?;
    let body = build_chat_request(model, system, prompt, options);

    log::debug!("🤖 Groq request (model: {})", body.model);
    let start = std::time::Instant::now();

    let response = http_client()
        .post(GROQ_CHAT_URL)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("Failed to call Groq: {}", e))?;

    let status = response.status();
    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse Groq response ({}): {}", status, e))?;

    let content = chat_content(parsed)?;
    log::debug!("🤖 Groq answered in {}ms ({} chars)", start.elapsed().as_millis(), content.len());
    Ok(content)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

fn gemini_text(response: GeminiResponse) -> Result<String, String> {
    if let Some(err) = response.error {
        return Err(format!("Gemini API error: {}", err.message));
    }
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err("Gemini returned an empty response".to_string())
    } else {
        Ok(text)
    }
}

/// Geração de texto no Gemini
pub async fn gemini_generate(prompt: &str) -> Result<String, String> {
    let api_key = env::var("GEMINI_API_KEY").map_err(|_| "GEMINI_API_KEY not configured".to_string())?;
    let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
    let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, model);

    let body = GeminiRequest {
        contents: vec![GeminiContent { parts: vec![GeminiPart { text: prompt }] }],
        generation_config: GeminiGenerationConfig {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 4096,
        },
    };

    log::debug!("✨ Gemini request (model: {})", model);

    let response = http_client()
        .post(&url)
        .query(&[("key", api_key.as_str())])
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("Failed to call Gemini: {}", e))?;

    let status = response.status();
    let parsed: GeminiResponse = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse Gemini response ({}): {}", status, e))?;

    gemini_text(parsed)
}
