//! Conversation content exchanged with the model provider.
//!
//! Mirrors the provider's `Content`/`Part` wire shape so history can be sent
//! back verbatim on the next request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self {
            function_call: Some(FunctionCall {
                id: None,
                name: name.into(),
                args,
            }),
            ..Default::default()
        }
    }

    pub fn function_response(response: FunctionResponse) -> Self {
        Self {
            function_response: Some(response),
            ..Default::default()
        }
    }

    /// Visible answer text (thought summaries excluded).
    pub fn answer_text(&self) -> Option<&str> {
        match (&self.text, self.thought) {
            (Some(text), None | Some(false)) => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }

    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// Function results go back to the model under the user role.
    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::User,
            parts: responses.into_iter().map(Part::function_response).collect(),
        }
    }

    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|p| p.function_call.as_ref())
    }

    /// Answer text parts joined with newlines, if there are any.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self.parts.iter().filter_map(Part::answer_text).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_provider_parts() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                { "text": "thinking...", "thought": true },
                { "functionCall": { "name": "calculate_build_metrics", "args": { "components": [] } }, "thoughtSignature": "sig" },
                { "text": "done" }
            ]
        }))
        .unwrap();

        assert_eq!(content.role, Role::Model);
        assert_eq!(content.text().as_deref(), Some("done"));
        let calls: Vec<_> = content.function_calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "calculate_build_metrics");
        assert_eq!(content.parts[1].thought_signature.as_deref(), Some("sig"));
    }

    #[test]
    fn function_responses_serialize_in_camel_case() {
        let content = Content::function_responses(vec![FunctionResponse {
            id: None,
            name: "calculate_build_metrics".into(),
            response: json!({ "status": "success" }),
        }]);
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({
                "role": "user",
                "parts": [{ "functionResponse": { "name": "calculate_build_metrics", "response": { "status": "success" } } }]
            })
        );
    }
}
