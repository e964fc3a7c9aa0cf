//! Field Extraction — turns resume text into an `ExtractionRecord`.
//!
//! One model call per field, each carrying the whole (possibly truncated)
//! resume. Answers are stored as returned; nothing is parsed or validated.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::llm_client::{LanguageModel, LlmError};

pub mod fields;
pub mod prompts;

use fields::{Field, FIELDS};
use prompts::PromptBuilder;

/// How prompts are shaped for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// One composed Llama 3 style prompt string per field.
    Completion,
    /// A system message plus a user message per field.
    Chat,
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptStyle::Completion => write!(f, "completion"),
            PromptStyle::Chat => write!(f, "chat"),
        }
    }
}

/// Free-text answers keyed by field. Missing fields read as "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionRecord {
    values: BTreeMap<Field, String>,
}

impl ExtractionRecord {
    pub fn insert(&mut self, field: Field, value: String) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Values in spreadsheet column order.
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        FIELDS.iter().map(move |spec| self.get(spec.field))
    }
}

pub struct FieldExtractor {
    model: Arc<dyn LanguageModel>,
    style: PromptStyle,
    max_input_chars: usize,
}

impl FieldExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, style: PromptStyle, max_input_chars: usize) -> Self {
        Self {
            model,
            style,
            max_input_chars,
        }
    }

    /// Queries the model once per field, in table order.
    /// The first inference failure aborts the whole record.
    pub async fn extract_record(
        &self,
        text: &str,
        today: NaiveDate,
    ) -> Result<ExtractionRecord, LlmError> {
        let submitted = truncate_chars(text, self.max_input_chars);
        if submitted.len() < text.len() {
            warn!(
                "Resume too long ({} chars), truncating to {} chars to fit the context window",
                text.chars().count(),
                self.max_input_chars
            );
        }

        let builder = PromptBuilder::new(self.style, submitted, today);
        let mut record = ExtractionRecord::default();

        for spec in FIELDS.iter() {
            debug!("Extracting field '{}'", spec.column);
            let prompt = builder.prompt_for(spec, &record);
            let answer = self.model.infer(&prompt).await?;
            record.insert(spec.field, answer);
        }

        Ok(record)
    }
}

/// Returns the first `max_chars` characters of `text` (all of it if shorter).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Prompt;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every prompt with "answer-N" and remembers what it was asked.
    #[derive(Default)]
    struct ScriptedModel {
        prompts: Mutex<Vec<Prompt>>,
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn infer(&self, prompt: &Prompt) -> Result<String, LlmError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.clone());
            let n = prompts.len();
            if self.fail_on_call == Some(n) {
                return Err(LlmError::EmptyContent);
            }
            Ok(format!("answer-{n}"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
    }

    #[test]
    fn test_truncate_keeps_exact_prefix_of_budget() {
        let text = "a".repeat(25_000);
        let out = truncate_chars(&text, 19_600);
        assert_eq!(out.chars().count(), 19_600);
        assert!(text.starts_with(out));
    }

    #[test]
    fn test_truncate_leaves_short_text_alone() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_respects_multibyte_chars() {
        let text = "é".repeat(10);
        let out = truncate_chars(&text, 4);
        assert_eq!(out, "éééé");
    }

    #[test]
    fn test_record_columns_default_to_empty() {
        let mut record = ExtractionRecord::default();
        record.insert(Field::Email, "a@b.pk".to_string());
        let cols: Vec<&str> = record.columns().collect();
        assert_eq!(cols.len(), 12);
        assert_eq!(cols[10], "a@b.pk");
        assert!(cols.iter().enumerate().all(|(i, c)| i == 10 || c.is_empty()));
    }

    #[tokio::test]
    async fn test_twelve_calls_in_column_order() {
        let model = Arc::new(ScriptedModel::default());
        let extractor = FieldExtractor::new(model.clone(), PromptStyle::Chat, 100);

        let record = extractor.extract_record("cv text", today()).await.unwrap();

        assert_eq!(model.prompts.lock().unwrap().len(), 12);
        assert_eq!(record.get(Field::NameAndCnic), "answer-1");
        assert_eq!(record.get(Field::Address), "answer-12");
    }

    #[tokio::test]
    async fn test_every_prompt_carries_truncated_text() {
        let model = Arc::new(ScriptedModel::default());
        let extractor = FieldExtractor::new(model.clone(), PromptStyle::Chat, 8);

        extractor
            .extract_record("0123456789ABCDEF", today())
            .await
            .unwrap();

        for prompt in model.prompts.lock().unwrap().iter() {
            let Prompt::Chat { user, .. } = prompt else {
                panic!("expected chat prompt");
            };
            assert!(user.contains("01234567\n\n"));
            assert!(!user.contains('8'));
        }
    }

    #[tokio::test]
    async fn test_father_name_uses_first_answer_in_completion_style() {
        let model = Arc::new(ScriptedModel::default());
        let extractor = FieldExtractor::new(model.clone(), PromptStyle::Completion, 1000);

        extractor.extract_record("cv text", today()).await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        let Prompt::Raw(second) = &prompts[1] else {
            panic!("expected raw prompt");
        };
        assert!(second.contains("from that name : answer-1 "));
        assert!(!second.contains("cv text"));
    }

    #[tokio::test]
    async fn test_inference_failure_aborts_record() {
        let model = Arc::new(ScriptedModel {
            fail_on_call: Some(3),
            ..Default::default()
        });
        let extractor = FieldExtractor::new(model.clone(), PromptStyle::Chat, 100);

        let result = extractor.extract_record("cv text", today()).await;

        assert!(matches!(result, Err(LlmError::EmptyContent)));
        assert_eq!(model.prompts.lock().unwrap().len(), 3);
    }
}
