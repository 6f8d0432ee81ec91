use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::api_connection::connection::ApiConnectionError;
use crate::api_connection::endpoints::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, FunctionDefinition,
    ImageUrl, MessageContent, Provider, ToolDefinition,
};
use crate::config::AnalyzerConfig;
use crate::meal_analysis::MealAnalysis;

pub const NUTRITION_TOOL_NAME: &str = "extract_nutrition_facts";

/// Conditions the nutrition tool advertises to the model.
pub const KNOWN_CONDITIONS: &[&str] = &[
    "high blood pressure",
    "gout",
    "diabetes",
    "heart disease",
    "obesity",
    "none",
];

/// Image reference handed to the model: a remote URL or an inline `data:` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    url: String,
}

impl ImageSource {
    pub fn from_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            url: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
        }
    }

    /// URLs pass through untouched; anything else is read as a local file and inlined.
    pub async fn resolve(reference: &str) -> Result<Self, ApiConnectionError> {
        if is_url(reference) {
            return Ok(Self::from_url(reference));
        }
        let path = Path::new(reference);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ApiConnectionError::ImageRead {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "Inlining local meal image");
        Ok(Self::from_bytes(&bytes, mime_type_for(path)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn is_url(reference: &str) -> bool {
    ["http://", "https://", "data:"]
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealAnalysisRequest {
    pub image: ImageSource,
    pub conditions: Vec<String>,
    pub notes: Option<String>,
}

pub fn build_prompt(conditions: &[String], notes: Option<&str>) -> String {
    let tailored_for = if conditions.is_empty() {
        "none".to_string()
    } else {
        conditions.join(", ")
    };
    let mut prompt = format!(
        "Can you tell me the food nutrition of the image, tailored for {}?",
        tailored_for
    );
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push_str("\nAdditional notes: ");
        prompt.push_str(notes);
    }
    prompt
}

pub fn nutrition_tool() -> ToolDefinition {
    let number = |description: &str| json!({ "type": "number", "description": description });

    ToolDefinition {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: NUTRITION_TOOL_NAME.to_string(),
            description: "Extracts structured nutritional information, ingredients, risk levels, and health recommendations for a given food item, tailored to multiple illnesses.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "sicknesses": {
                        "type": "array",
                        "items": { "type": "string", "enum": KNOWN_CONDITIONS },
                        "description": "An array of specific illnesses or conditions of the user (e.g., gout, diabetes)."
                    },
                    "kcal": number("The total calories (kcal) in the food item."),
                    "protein": number("The amount of protein (in grams) in the food item."),
                    "carbs": number("The amount of carbohydrates (in grams) in the food item."),
                    "fat": number("The amount of fat (in grams) in the food item."),
                    "sugar": number("The amount of sugar (in grams) in the food item."),
                    "fiber": number("The amount of dietary fiber (in grams) in the food item."),
                    "sodium": number("The amount of sodium (in milligrams) in the food item."),
                    "purines": number("The estimated purine content (in milligrams) in the food item."),
                    "ingredients": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "A list of key ingredients identified in the food item."
                    },
                    "highPurineIngredients": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "ingredient": { "type": "string", "description": "The name of the high-purine ingredient." },
                                "purineLevel": number("The estimated purine level of the ingredient (mg/100g).")
                            },
                            "required": ["ingredient", "purineLevel"]
                        },
                        "description": "A list of ingredients with high purine levels and their estimated purine content."
                    },
                    "riskLevels": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "object",
                            "properties": {
                                "level": { "type": "string", "enum": ["Low", "Moderate", "High"] },
                                "reason": { "type": "string" }
                            },
                            "required": ["level", "reason"]
                        },
                        "description": "An object mapping each illness to its risk level and the reason for it."
                    },
                    "recommendations": {
                        "type": "object",
                        "additionalProperties": { "type": "array", "items": { "type": "string" } },
                        "description": "An object mapping each illness to its respective recommendations."
                    }
                },
                "required": [
                    "sicknesses", "kcal", "protein", "carbs", "fat", "sugar", "fiber", "sodium",
                    "purines", "ingredients", "highPurineIngredients", "riskLevels", "recommendations"
                ]
            }),
        },
    }
}

pub fn build_chat_request(
    request: &MealAnalysisRequest,
    config: &AnalyzerConfig,
) -> ChatCompletionRequest {
    for condition in &request.conditions {
        if !KNOWN_CONDITIONS.contains(&condition.as_str()) {
            warn!(condition = %condition, "Condition is not one the nutrition tool advertises");
        }
    }

    ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: build_prompt(&request.conditions, request.notes.as_deref()),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: request.image.url().to_string(),
                    },
                },
            ]),
        }],
        tools: Some(vec![nutrition_tool()]),
        temperature: None,
        max_tokens: Some(config.max_tokens),
    }
}

fn strip_markdown_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6 {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

/// Pulls the meal analysis out of a chat completion.
///
/// Prefers the `extract_nutrition_facts` tool call; when the model answered in
/// plain text instead, the text is parsed as JSON after removing markdown fences.
pub fn extract_meal_analysis(
    response: &ChatCompletionResponse,
) -> Result<MealAnalysis, ApiConnectionError> {
    let choice = response.choices.first().ok_or_else(|| {
        ApiConnectionError::NoStructuredOutput("no response choices received".to_string())
    })?;

    let tool_call = choice
        .message
        .tool_calls
        .iter()
        .flatten()
        .find(|call| call.function.name == NUTRITION_TOOL_NAME);
    if let Some(call) = tool_call {
        debug!(arguments = %call.function.arguments, "Parsing nutrition tool call");
        return Ok(MealAnalysis::from_json_str(&call.function.arguments)?);
    }

    let content = choice.message.content.as_deref().unwrap_or_default();
    let candidate = strip_markdown_fences(content);
    if candidate.starts_with('{') {
        if let Ok(meal) = MealAnalysis::from_json_str(candidate) {
            warn!("Model answered without a tool call; used JSON from message text");
            return Ok(meal);
        }
    }
    Err(ApiConnectionError::NoStructuredOutput(content.to_string()))
}

/// Sends one meal photo to the vision model and returns its nutrition analysis.
pub async fn analyze_meal(
    request: &MealAnalysisRequest,
    config: &AnalyzerConfig,
) -> Result<MealAnalysis, ApiConnectionError> {
    let provider = Provider::from_config(config);
    info!(
        model = %config.model,
        conditions = ?request.conditions,
        "Requesting meal analysis"
    );
    let response = provider
        .call_chat_completion(build_chat_request(request, config))
        .await?;
    extract_meal_analysis(&response)
}
