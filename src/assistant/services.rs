use tracing::{info, warn};

use super::{
    dto::{DraftMode, DraftRequest, DraftResponse, SuggestionResponse},
    TextGenerator,
};
use crate::error::{AppError, AppResult};

pub const ERROR_PLACEHOLDER: &str = "An error occurred while communicating with the AI assistant.";
pub const EMPTY_PLACEHOLDER: &str = "I couldn't generate a response at this time.";
pub const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Community Cleanup Participation",
    "Winning Inter-house Debate",
    "Example of Honesty",
];

fn context_for(mode: DraftMode) -> &'static str {
    match mode {
        DraftMode::Announcement => {
            "The user wants to draft a formal school announcement to be broadcast via the app or PA system."
        }
        DraftMode::General => {
            "The user is asking a general administrative question or needs help with conflict resolution."
        }
    }
}

pub fn compose_prompt(mode: DraftMode, task: &str) -> String {
    format!(
        "You are an expert School Administrator Assistant for a prestigious secondary school.\n\
         Your tone should be professional, encouraging, and clear.\n\n\
         Context: {}\n\n\
         Task: {}\n\n\
         Keep the response concise and formatted for a web UI.",
        context_for(mode),
        task.trim()
    )
}

fn suggestion_prompt(house_name: &str) -> String {
    format!(
        "Generate 3 creative and specific reasons for awarding points to the student house \"{house_name}\". \
         Focus on areas like: Community Service, Academic Excellence, Sportsmanship, or Environmental Care. \
         Return ONLY a JSON array of strings."
    )
}

/// Relays the prompt once. Backend failures come back as a placeholder
/// reply, never as an error.
pub async fn draft<G: TextGenerator + ?Sized>(gen: &G, req: DraftRequest) -> AppResult<DraftResponse> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::validation("Prompt is required"));
    }
    let prompt = compose_prompt(req.mode, &req.prompt);
    let res = match gen.generate(&prompt, false).await {
        Ok(Some(reply)) => DraftResponse {
            reply,
            generated: true,
        },
        Ok(None) => DraftResponse {
            reply: EMPTY_PLACEHOLDER.to_string(),
            generated: false,
        },
        Err(e) => {
            warn!(error = %e, "assistant draft failed");
            DraftResponse {
                reply: ERROR_PLACEHOLDER.to_string(),
                generated: false,
            }
        }
    };
    info!(mode = ?req.mode, generated = res.generated, "assistant draft");
    Ok(res)
}

fn fallback() -> SuggestionResponse {
    SuggestionResponse {
        suggestions: FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        fallback: true,
    }
}

pub async fn house_point_suggestions<G: TextGenerator + ?Sized>(
    gen: &G,
    house_name: &str,
) -> AppResult<SuggestionResponse> {
    let house_name = house_name.trim();
    if house_name.is_empty() {
        return Err(AppError::validation("House name is required"));
    }
    let res = match gen.generate(&suggestion_prompt(house_name), true).await {
        Ok(None) => SuggestionResponse {
            suggestions: Vec::new(),
            fallback: false,
        },
        Ok(Some(text)) => match serde_json::from_str::<Vec<String>>(text.trim()) {
            Ok(suggestions) => SuggestionResponse {
                suggestions,
                fallback: false,
            },
            Err(e) => {
                warn!(error = %e, "assistant returned a non-array suggestion body");
                fallback()
            }
        },
        Err(e) => {
            warn!(error = %e, "assistant suggestions failed");
            fallback()
        }
    };
    Ok(res)
}
