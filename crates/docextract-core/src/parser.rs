//! Output parsers: turn a raw model reply into a structured record.

use crate::error::ExtractError;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Parses a model reply and tells the model how to format it.
pub trait OutputParser: Send + Sync {
    /// Structured record produced from a reply.
    type Output: Serialize;

    /// Instructions inserted into the prompt's `{format_instructions}` slot.
    fn format_instructions(&self) -> String;

    fn parse(&self, text: &str) -> Result<Self::Output, ExtractError>;
}

/// Parses a JSON object with a fixed set of extraction keys.
///
/// Missing keys come back as `null`; extra keys are kept.
#[derive(Debug, Clone)]
pub struct JsonOutputParser {
    keys: Vec<String>,
}

impl JsonOutputParser {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    fn schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .keys
            .iter()
            .map(|k| (k.clone(), json!({ "title": k, "type": "string" })))
            .collect();
        json!({ "properties": properties, "required": self.keys })
    }
}

impl OutputParser for JsonOutputParser {
    type Output = Map<String, Value>;

    fn format_instructions(&self) -> String {
        format!(
            "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\n\
             As an example, for the schema {{\"properties\": {{\"foo\": {{\"title\": \"Foo\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
             the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. \
             The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\n\
             Here is the output schema:\n```\n{}\n```",
            self.schema()
        )
    }

    fn parse(&self, text: &str) -> Result<Self::Output, ExtractError> {
        let candidate = extract_json_object(text).ok_or_else(|| ExtractError::Parse {
            message: format!("no JSON object found in model output: {}", preview(text)),
        })?;

        let mut map: Map<String, Value> =
            serde_json::from_str(candidate).map_err(|e| ExtractError::Parse {
                message: format!("invalid JSON in model output ({e}): {}", preview(text)),
            })?;

        for key in &self.keys {
            map.entry(key.clone()).or_insert(Value::Null);
        }
        Ok(map)
    }
}

/// Slice from the first `{` to the last `}`.
///
/// Tolerates Markdown code fences and chatter around the object.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn preview(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> JsonOutputParser {
        JsonOutputParser::new(["invoice_number", "total"])
    }

    #[test]
    fn test_format_instructions_list_keys() {
        let instructions = parser().format_instructions();
        assert!(instructions.contains("\"invoice_number\""));
        assert!(instructions.contains("\"required\":[\"invoice_number\",\"total\"]"));
    }

    #[test]
    fn test_parse_plain_json() {
        let out = parser()
            .parse(r#"{"invoice_number": "A-17", "total": "12.50"}"#)
            .unwrap();
        assert_eq!(out["invoice_number"], "A-17");
        assert_eq!(out["total"], "12.50");
    }

    #[test]
    fn test_parse_fenced_json_with_chatter() {
        let reply = "Sure! Here you go:\n```json\n{\"invoice_number\": \"A-17\"}\n```\nAnything else?";
        let out = parser().parse(reply).unwrap();
        assert_eq!(out["invoice_number"], "A-17");
        assert_eq!(out["total"], Value::Null);
    }

    #[test]
    fn test_parse_keeps_extra_keys() {
        let out = parser().parse(r#"{"total": 3, "currency": "EUR"}"#).unwrap();
        assert_eq!(out["currency"], "EUR");
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_parse_without_object_fails() {
        let err = parser().parse("I could not find any values.").unwrap_err();
        assert!(matches!(err, ExtractError::Parse { .. }));
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        let err = parser().parse("{\"total\": }").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }
}
