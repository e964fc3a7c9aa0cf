use chrono::NaiveDate;

use crate::extraction::fields::{CompletionQuery, FieldSpec};
use crate::extraction::{ExtractionRecord, PromptStyle};
use crate::llm_client::prompts::{
    ANSWER_ONLY, CHAT_RESUME_PREFIX, EXTRACTOR_BRIEF, KNOWLEDGE_CUTOFF, LLAMA3_SYSTEM_OPEN,
    LLAMA3_USER_OPEN, REQUIRED_OUTPUTS,
};
use crate::llm_client::Prompt;

/// Builds the per-field prompts for one document.
///
/// The shared parts (system header with the resume, or the chat system/user
/// prefix) are assembled once in `new` and reused for all twelve fields.
pub struct PromptBuilder {
    style: PromptStyle,
    today: NaiveDate,
    /// Completion: system header carrying the resume. Chat: the user-message prefix.
    resume_context: String,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle, resume_text: &str, today: NaiveDate) -> Self {
        let resume_context = match style {
            PromptStyle::Completion => {
                let body = format!("{EXTRACTOR_BRIEF}\nResume:\n{resume_text}\n\n{REQUIRED_OUTPUTS}");
                system_header(today, &body)
            }
            PromptStyle::Chat => format!("{CHAT_RESUME_PREFIX}{resume_text}"),
        };
        Self {
            style,
            today,
            resume_context,
        }
    }

    /// Prompt for `spec`. `answers` holds the fields already extracted for this document.
    pub fn prompt_for(&self, spec: &FieldSpec, answers: &ExtractionRecord) -> Prompt {
        match self.style {
            PromptStyle::Completion => Prompt::Raw(self.completion_prompt(spec, answers)),
            PromptStyle::Chat => {
                let instruction = spec
                    .chat_instruction
                    .replace("{today}", &self.today.to_string());
                Prompt::Chat {
                    system: EXTRACTOR_BRIEF.to_string(),
                    user: format!("{}\n\n{}", self.resume_context, instruction),
                }
            }
        }
    }

    fn completion_prompt(&self, spec: &FieldSpec, answers: &ExtractionRecord) -> String {
        match spec.completion {
            CompletionQuery::FromResume(label) => format!(
                "{}\nUser: Give me only required output '{}' From the above Resume.{} Assistant:",
                self.resume_context, label, ANSWER_ONLY
            ),
            CompletionQuery::FromField(source, template) => {
                let question = template.replace("{answer}", answers.get(source));
                format!(
                    "{}\nUser: {}{}Assistant:",
                    system_header(self.today, ""),
                    question,
                    ANSWER_ONLY
                )
            }
        }
    }
}

fn system_header(today: NaiveDate, body: &str) -> String {
    format!(
        "{LLAMA3_SYSTEM_OPEN}\n\n{KNOWLEDGE_CUTOFF}\nToday Date: {today}\n\n{body}\n{LLAMA3_USER_OPEN}\n"
    )
}
