use std::future::Future;
use std::pin::Pin;

use snafu::Snafu;

pub const GENERATION_FAILED_MESSAGE: &str = "Failed to get a response from the AI. Please try again.";
pub const MISSING_API_KEY_MESSAGE: &str = "API key not configured. Set API_KEY or add api_key to settings.json.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: String,
    pub endpoint: String,
    pub model_id: String,
}

impl ProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into().trim().to_string(),
            api_key: api_key.into().trim().to_string(),
            endpoint: endpoint.into().trim().trim_end_matches('/').to_string(),
            model_id: model_id.into().trim().to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// A file the user attached to a turn.
///
/// `payload` holds the file as a data URL (`data:<mime>;base64,<data>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub payload: String,
}

impl Attachment {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Returns the base64 body of the payload with any `data:...;base64,` prefix removed.
    pub fn inline_data(&self) -> &str {
        match self.payload.split_once(',') {
            Some((_, data)) => data,
            None => self.payload.as_str(),
        }
    }
}

/// A web citation taken from grounding metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

impl Source {
    pub fn new(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.uri.is_empty() && !self.title.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryRequest {
    pub prompt: String,
    pub attachments: Vec<Attachment>,
}

impl QueryRequest {
    pub fn new(prompt: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            prompt: prompt.into(),
            attachments,
        }
    }

    /// Splits attachments into the image ones the model receives and the rest.
    pub fn partition_attachments(&self) -> (Vec<&Attachment>, Vec<&Attachment>) {
        self.attachments
            .iter()
            .partition(|attachment| attachment.is_image())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationOutput {
    pub text: String,
    pub sources: Vec<Source>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type QueryResult<T> = Result<T, QueryError>;
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors surfaced to callers of a gateway.
///
/// Neither variant carries the underlying cause; that is logged where it happens.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueryError {
    #[snafu(display("API key not configured. Set API_KEY or add api_key to settings.json."))]
    Configuration { stage: &'static str },
    #[snafu(display("Failed to get a response from the AI. Please try again."))]
    Generation { stage: &'static str },
}

impl QueryError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Configuration { stage } | Self::Generation { stage } => *stage,
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Detailed failure of one provider round trip. Only ever logged.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProviderError {
    #[snafu(display("http request failed on `{stage}`, {source}"))]
    HttpRequest {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("provider endpoint returned status {status}: {body}"))]
    ResponseStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to decode provider response on `{stage}`, {source}"))]
    DecodeResponse {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("provider response contained no candidates"))]
    EmptyCandidates { stage: &'static str },
}

pub trait QueryGateway: Send + Sync {
    fn id(&self) -> &str;
    fn model(&self) -> &str;
    fn has_credential(&self) -> bool;
    fn run_query<'a>(&'a self, request: QueryRequest) -> BoxFuture<'a, QueryResult<GenerationOutput>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_data_strips_data_url_prefix() {
        let attachment = Attachment::new("shot.png", "image/png", "data:image/png;base64,AAAA");
        assert_eq!(attachment.inline_data(), "AAAA");
    }

    #[test]
    fn inline_data_keeps_bare_payload() {
        let attachment = Attachment::new("shot.png", "image/png", "AAAA");
        assert_eq!(attachment.inline_data(), "AAAA");
    }

    #[test]
    fn partition_keeps_images_in_order() {
        let request = QueryRequest::new(
            "look",
            vec![
                Attachment::new("a.png", "image/png", "data:image/png;base64,AA"),
                Attachment::new("notes.txt", "text/plain", "data:text/plain;base64,BB"),
                Attachment::new("b.jpg", "image/jpeg", "data:image/jpeg;base64,CC"),
                Attachment::new("guide.pdf", "application/pdf", "data:application/pdf;base64,DD"),
            ],
        );

        let (images, others) = request.partition_attachments();
        let image_names = images.iter().map(|a| a.name.as_str()).collect::<Vec<_>>();
        let other_names = others.iter().map(|a| a.name.as_str()).collect::<Vec<_>>();

        assert_eq!(image_names, ["a.png", "b.jpg"]);
        assert_eq!(other_names, ["notes.txt", "guide.pdf"]);
    }

    #[test]
    fn query_errors_never_leak_causes() {
        let configuration = QueryError::Configuration { stage: "check-credential" };
        let generation = QueryError::Generation { stage: "send-request" };

        assert_eq!(configuration.user_message(), MISSING_API_KEY_MESSAGE);
        assert_eq!(generation.user_message(), GENERATION_FAILED_MESSAGE);
        assert_eq!(generation.stage(), "send-request");
    }

    #[test]
    fn missing_key_message_names_env_and_settings_file() {
        let message = QueryError::Configuration { stage: "check-credential" }.user_message();
        assert!(message.contains("API_KEY"));
        assert!(message.contains("settings.json"));
    }

    #[test]
    fn config_trims_fields_and_endpoint_slash() {
        let config = ProviderConfig::new(" gemini ", "  key ", "https://example.test/ ", "m ");
        assert_eq!(config.provider_id, "gemini");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.endpoint, "https://example.test");
        assert_eq!(config.model_id, "m");
        assert!(config.has_api_key());
    }
}
