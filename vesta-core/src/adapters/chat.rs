//! Chat completion consumer.
//!
//! The backend streams assistant message parts as newline-delimited JSON
//! deltas. The client folds deltas into ordered `ContentPart`s and invokes a
//! caller-supplied hook per delta so the host can render text as it arrives.

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{VestaError, VestaResult};
use crate::models::{ContentPart, SanitizedMessage};

use super::types::{ChatBackendInfo, VisitorProfile};

#[derive(Serialize)]
struct CompletionBody<'a> {
    messages: &'a [SanitizedMessage],
    #[serde(rename = "sessionId")]
    session_id: &'a str,
    profile: &'a VisitorProfile,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamDelta {
    Text { value: String },
    Reasoning { value: String },
    ToolInvocation { name: String },
    Done,
}

pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
}

impl ChatCompletionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    /// Backend identity shown in the widget footer.
    pub async fn metadata(&self) -> VestaResult<ChatBackendInfo> {
        let url = format!("{}/chat", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(VestaError::ServerRejection {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<ChatBackendInfo>()
            .await
            .map_err(|err| VestaError::MalformedResponse(err.to_string()))
    }

    /// Stream one completion. `on_delta` fires for every parsed delta in
    /// arrival order; the return value is the folded part list for the
    /// finished assistant message.
    pub async fn stream_completion<F>(
        &self,
        messages: &[SanitizedMessage],
        session_id: &str,
        profile: &VisitorProfile,
        mut on_delta: F,
    ) -> VestaResult<Vec<ContentPart>>
    where
        F: FnMut(&StreamEvent),
    {
        let url = format!("{}/chat", self.base_url);
        debug!(session_id, messages = messages.len(), "starting completion");

        let response = self
            .client
            .post(&url)
            .json(&CompletionBody {
                messages,
                session_id,
                profile,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VestaError::ServerRejection {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let mut parts: Vec<ContentPart> = Vec::new();
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);
                if line.is_empty() {
                    continue;
                }
                if !apply_line(&line, &mut parts, &mut on_delta) {
                    return Ok(parts);
                }
            }
        }

        let tail = buffer.trim();
        if !tail.is_empty() {
            apply_line(tail, &mut parts, &mut on_delta);
        }

        Ok(parts)
    }
}

/// One rendered stream notification.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Text(String),
    Reasoning(String),
    ToolInvocation(String),
}

/// Fold one wire line into the part list. Returns false once the stream
/// signalled completion.
fn apply_line<F>(line: &str, parts: &mut Vec<ContentPart>, on_delta: &mut F) -> bool
where
    F: FnMut(&StreamEvent),
{
    let delta: StreamDelta = match serde_json::from_str(line) {
        Ok(delta) => delta,
        Err(err) => {
            // Unknown lines are skipped, not fatal; the backend may append
            // new delta kinds before the widget learns about them.
            warn!(error = %err, "skipping unrecognized stream line");
            return true;
        }
    };

    match delta {
        StreamDelta::Text { value } => {
            if let Some(ContentPart::Text { text }) = parts.last_mut() {
                text.push_str(&value);
            } else {
                parts.push(ContentPart::text(value.clone()));
            }
            on_delta(&StreamEvent::Text(value));
        }
        StreamDelta::Reasoning { value } => {
            if let Some(ContentPart::Reasoning { text }) = parts.last_mut() {
                text.push_str(&value);
            } else {
                parts.push(ContentPart::reasoning(value.clone()));
            }
            on_delta(&StreamEvent::Reasoning(value));
        }
        StreamDelta::ToolInvocation { name } => {
            parts.push(ContentPart::ToolInvocation { name: name.clone() });
            on_delta(&StreamEvent::ToolInvocation(name));
        }
        StreamDelta::Done => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_all(lines: &[&str]) -> Vec<ContentPart> {
        let mut parts = Vec::new();
        let mut on_delta = |_: &StreamEvent| {};
        for line in lines {
            if !apply_line(line, &mut parts, &mut on_delta) {
                break;
            }
        }
        parts
    }

    #[test]
    fn test_consecutive_text_deltas_fold_into_one_part() {
        let parts = apply_all(&[
            r#"{"type":"text","value":"Hel"}"#,
            r#"{"type":"text","value":"lo"}"#,
            r#"{"type":"done"}"#,
        ]);
        assert_eq!(parts, vec![ContentPart::text("Hello")]);
    }

    #[test]
    fn test_mixed_deltas_keep_order() {
        let parts = apply_all(&[
            r#"{"type":"reasoning","value":"looking up listings"}"#,
            r#"{"type":"tool_invocation","name":"search_listings"}"#,
            r#"{"type":"text","value":"Here you go."}"#,
        ]);
        assert_eq!(
            parts,
            vec![
                ContentPart::reasoning("looking up listings"),
                ContentPart::ToolInvocation {
                    name: "search_listings".to_string()
                },
                ContentPart::text("Here you go."),
            ]
        );
    }

    #[test]
    fn test_unknown_lines_are_skipped() {
        let parts = apply_all(&[
            "garbage",
            r#"{"type":"text","value":"ok"}"#,
        ]);
        assert_eq!(parts, vec![ContentPart::text("ok")]);
    }

    #[test]
    fn test_done_stops_folding() {
        let parts = apply_all(&[
            r#"{"type":"text","value":"a"}"#,
            r#"{"type":"done"}"#,
            r#"{"type":"text","value":"b"}"#,
        ]);
        assert_eq!(parts, vec![ContentPart::text("a")]);
    }
}
