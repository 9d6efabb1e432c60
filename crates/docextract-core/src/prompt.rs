//! Extraction prompt construction.
//!
//! The prompt is an ordered list of role-tagged templates. Templates use
//! `{name}` placeholders and `{{` / `}}` for literal braces.

use crate::error::ExtractError;
use crate::model::Provider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SYSTEM_PROMPT: &str = "You are a document information extraction system.\n\
     You are given a document and a json with keys that must be extracted from the document.\n";

const DOCUMENT_PROMPT: &str = "Here is the document:\n{document}\n{format_instructions}\n";

const JSON_ONLY_PROMPT: &str = "Never include natural text in your answer, return a json only! \
     The message must start with {{ and end with }}.\n";

/// Message role in a chat prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single role-tagged prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub template: String,
}

/// A rendered chat message ready to send to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Ordered prompt templates for one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub messages: Vec<PromptMessage>,
}

impl PromptSpec {
    /// Substitute variables into every template, preserving order.
    pub fn render(&self, vars: &HashMap<&str, String>) -> Result<Vec<ChatMessage>, ExtractError> {
        self.messages
            .iter()
            .map(|m| {
                Ok(ChatMessage {
                    role: m.role,
                    content: render_template(&m.template, vars)?,
                })
            })
            .collect()
    }
}

/// Anthropic must be told to answer with bare JSON.
pub fn requires_json_only(provider: Provider) -> bool {
    provider == Provider::Anthropic
}

/// Anthropic needs the document in a separate human turn.
pub fn requires_user_message(provider: Provider) -> bool {
    provider == Provider::Anthropic
}

/// Role for the leading message.
///
/// Vertex AI rejects system messages and the automatic conversion in client
/// libraries is unreliable, so the instructions are sent as a user turn.
pub fn leading_role(provider: Provider) -> Role {
    if provider == Provider::VertexAi {
        Role::User
    } else {
        Role::System
    }
}

/// Build the document information extraction prompt for a provider.
pub fn build_prompt(provider: Provider) -> PromptSpec {
    let mut doc_prompt = DOCUMENT_PROMPT.to_string();
    if requires_json_only(provider) {
        doc_prompt.push_str(JSON_ONLY_PROMPT);
    }

    let lead = leading_role(provider);
    let messages = if requires_user_message(provider) {
        vec![
            PromptMessage {
                role: lead,
                template: SYSTEM_PROMPT.to_string(),
            },
            PromptMessage {
                role: Role::User,
                template: doc_prompt,
            },
        ]
    } else {
        vec![PromptMessage {
            role: lead,
            template: format!("{SYSTEM_PROMPT}{doc_prompt}"),
        }]
    };

    PromptSpec { messages }
}

/// Render a template with `{name}` placeholders and `{{`/`}}` escapes.
///
/// Substituted values are inserted verbatim; braces inside them are not
/// interpreted.
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> Result<String, ExtractError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(ExtractError::Prompt {
                        message: format!("unterminated placeholder '{{{name}'"),
                    });
                }
                let value = vars.get(name.as_str()).ok_or_else(|| ExtractError::Prompt {
                    message: format!("missing value for placeholder '{name}'"),
                })?;
                out.push_str(value);
            }
            '}' => {
                return Err(ExtractError::Prompt {
                    message: "single '}' in template".to_string(),
                });
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("document", "INVOICE 42".to_string()),
            ("format_instructions", "Return {\"total\": ...}".to_string()),
        ])
    }

    #[test]
    fn test_openai_single_system_message() {
        let prompt = build_prompt(Provider::OpenAi);
        assert_eq!(prompt.messages.len(), 1);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert!(prompt.messages[0]
            .template
            .starts_with("You are a document information extraction system."));
        assert!(prompt.messages[0].template.contains("{document}"));
        assert!(prompt.messages[0].template.contains("{format_instructions}"));
        assert!(!prompt.messages[0].template.contains("json only"));
    }

    #[test]
    fn test_vertexai_leads_with_user_role() {
        let prompt = build_prompt(Provider::VertexAi);
        assert_eq!(prompt.messages.len(), 1);
        assert_eq!(prompt.messages[0].role, Role::User);
    }

    #[test]
    fn test_anthropic_splits_and_demands_json() {
        let prompt = build_prompt(Provider::Anthropic);
        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, Role::System);
        assert_eq!(prompt.messages[1].role, Role::User);
        assert!(!prompt.messages[0].template.contains("{document}"));
        assert!(prompt.messages[1].template.contains("{document}"));
        assert!(prompt.messages[1].template.contains("return a json only!"));
    }

    #[test]
    fn test_anthropic_json_instruction_renders_literal_braces() {
        let rendered = build_prompt(Provider::Anthropic).render(&vars()).unwrap();
        assert!(rendered[1].content.contains("must start with { and end with }."));
    }

    #[test]
    fn test_render_substitutes_values_verbatim() {
        let rendered = build_prompt(Provider::Mistral).render(&vars()).unwrap();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0]
            .content
            .contains("Here is the document:\nINVOICE 42\nReturn {\"total\": ...}\n"));
    }

    #[test]
    fn test_render_missing_placeholder() {
        let err = render_template("{missing}", &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_render_rejects_stray_brace() {
        assert!(render_template("oops }", &HashMap::new()).is_err());
        assert!(render_template("oops {open", &HashMap::new()).is_err());
    }
}
