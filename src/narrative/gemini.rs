use crate::narrative::prompt::{Prompt, build_prompt};
use crate::narrative::{NarrativeError, NarrativeFacts, Narrator};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-flash-lite-latest";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl GeminiSettings {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Blocking client for the Gemini `generateContent` endpoint.
///
/// One attempt per render; the client timeout is the only bound on latency.
pub struct GeminiNarrator {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiNarrator {
    /// Must be called outside an async runtime context.
    pub fn new(settings: GeminiSettings) -> Result<Self, NarrativeError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            settings.base_url.trim_end_matches('/'),
            settings.model
        );
        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call_remote(&self, prompt: &Prompt<'_>) -> Result<String, NarrativeError> {
        let request = GenerateRequest::from_prompt(prompt);
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if status.is_client_error() || status.is_server_error() {
            return Err(NarrativeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|err| NarrativeError::MalformedResponse(err.to_string()))?;
        parsed.into_text()
    }
}

impl fmt::Debug for GeminiNarrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiNarrator")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Narrator for GeminiNarrator {
    fn render(&self, facts: &NarrativeFacts<'_>) -> Result<String, NarrativeError> {
        let prompt = build_prompt(facts);
        debug!(
            endpoint = %self.endpoint,
            has_image = prompt.image.is_some(),
            "Requesting narrative"
        );
        self.call_remote(&prompt)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn from_prompt(prompt: &Prompt<'_>) -> Self {
        let mut parts = vec![Part::Text {
            text: prompt.text.clone(),
        }];
        if let Some(image) = prompt.image {
            parts.push(Part::InlineData {
                inline_data: Blob {
                    mime_type: image.mime_type.clone(),
                    data: BASE64.encode(&image.data),
                },
            });
        }
        Self {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
enum Part {
    Text { text: String },
    InlineData { inline_data: Blob },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, NarrativeError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| NarrativeError::MalformedResponse("no candidates".to_string()))?;
        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            return Err(NarrativeError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustment::QueueContext;
    use crate::state::{PredictionRequest, VisualEvidence, WaitEstimate};
    use httpmock::prelude::*;
    use serde_json::json;

    const MODEL_PATH: &str = "/v1beta/models/gemini-flash-lite-latest:generateContent";

    fn narrator(server: &MockServer) -> GeminiNarrator {
        GeminiNarrator::new(GeminiSettings {
            base_url: server.base_url(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
        })
        .expect("build narrator")
    }

    fn request() -> PredictionRequest {
        PredictionRequest::new(14, 2, 3, 20).with_context(QueueContext::StaffShortage)
    }

    #[test]
    fn returns_concatenated_candidate_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(MODEL_PATH)
                .header(API_KEY_HEADER, "test-key")
                .body_contains("Predicted wait: 26.0 minutes");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "### Root Cause\n"}, {"text": "Two counters short."}]}
                }]
            }));
        });
        let request = request();

        let text = narrator(&server).render(&NarrativeFacts::Prediction {
            request: &request,
            wait: WaitEstimate::from_minutes(26.0),
        });

        mock.assert();
        assert_eq!(text.expect("narrative"), "### Root Cause\nTwo counters short.");
    }

    #[test]
    fn image_is_sent_as_inline_base64() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(MODEL_PATH)
                .body_contains("\"inlineData\"")
                .body_contains("\"mimeType\":\"image/jpeg\"")
                .body_contains("\"data\":\"AQID\"");
            then.status(200).json_body(json!({
                "candidates": [{"content": {"parts": [{"text": "Crowd matches."}]}}]
            }));
        });
        let request = request().with_image(VisualEvidence {
            mime_type: "image/jpeg".to_string(),
            data: vec![1, 2, 3],
        });

        let text = narrator(&server).render(&NarrativeFacts::Prediction {
            request: &request,
            wait: WaitEstimate::from_minutes(26.0),
        });

        mock.assert();
        assert_eq!(text.expect("narrative"), "Crowd matches.");
    }

    #[test]
    fn error_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(MODEL_PATH);
            then.status(403).body("API key not valid");
        });
        let request = request();

        let result = narrator(&server).render(&NarrativeFacts::Prediction {
            request: &request,
            wait: WaitEstimate::from_minutes(26.0),
        });

        assert!(matches!(result, Err(NarrativeError::Http { status: 403, .. })));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(MODEL_PATH);
            then.status(200).body("<html>gateway</html>");
        });
        let request = request();

        let result = narrator(&server).render(&NarrativeFacts::Prediction {
            request: &request,
            wait: WaitEstimate::from_minutes(26.0),
        });

        assert!(matches!(result, Err(NarrativeError::MalformedResponse(_))));
    }

    #[test]
    fn blocked_prompt_without_text_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(MODEL_PATH);
            then.status(200).json_body(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            }));
        });
        let request = request();

        let result = narrator(&server).render(&NarrativeFacts::Prediction {
            request: &request,
            wait: WaitEstimate::from_minutes(26.0),
        });

        assert!(matches!(result, Err(NarrativeError::EmptyResponse)));
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let narrator = GeminiNarrator::new(GeminiSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(2),
        })
        .expect("build narrator");
        let request = request();

        let result = narrator.render(&NarrativeFacts::Prediction {
            request: &request,
            wait: WaitEstimate::from_minutes(26.0),
        });

        assert!(matches!(result, Err(NarrativeError::Transport(_))));
    }

    #[test]
    fn endpoint_joins_base_url_and_model() {
        let narrator = GeminiNarrator::new(GeminiSettings {
            base_url: "https://example.test/".to_string(),
            model: "custom-model".to_string(),
            api_key: "k".to_string(),
            timeout: Duration::from_secs(1),
        })
        .expect("build narrator");

        assert_eq!(
            narrator.endpoint(),
            "https://example.test/v1beta/models/custom-model:generateContent"
        );
    }

    #[test]
    fn settings_debug_redacts_api_key() {
        let debug = format!("{:?}", GeminiSettings::new("secret-value".to_string()));

        assert!(!debug.contains("secret-value"));
        assert!(debug.contains("<redacted>"));
    }
}
