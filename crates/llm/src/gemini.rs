use std::future;

use reqwest::Client;
use snafu::ResultExt;

use super::persona::SYSTEM_INSTRUCTION;
use super::provider::{
    BoxFuture, ConfigurationSnafu, DecodeResponseSnafu, GenerationOutput, GenerationSnafu,
    HttpRequestSnafu, ProviderConfig, ProviderResult, QueryGateway, QueryRequest, QueryResult,
    ResponseStatusSnafu,
};
use super::wire::{GenerateContentRequest, GenerateContentResponse};

pub const GEMINI_PROVIDER_ID: &str = "gemini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gateway that answers each query with one grounded `generateContent` call.
pub struct GeminiGateway {
    config: ProviderConfig,
    client: Client,
}

impl GeminiGateway {
    /// A config without an API key is accepted here; every query then fails
    /// with a configuration error before touching the network.
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(mut config: ProviderConfig, client: Client) -> Self {
        if config.endpoint.is_empty() {
            config.endpoint = DEFAULT_GEMINI_ENDPOINT.to_string();
        }
        if config.model_id.is_empty() {
            config.model_id = DEFAULT_GEMINI_MODEL.to_string();
        }

        Self { config, client }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint, self.config.model_id
        )
    }

    async fn send_request(&self, request: &QueryRequest) -> ProviderResult<GenerationOutput> {
        let body = GenerateContentRequest::grounded(SYSTEM_INSTRUCTION, request);

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(&body)
            .send()
            .await
            .context(HttpRequestSnafu {
                stage: "send-generate-request",
            })?;

        let status = response.status();
        let payload = response.text().await.context(HttpRequestSnafu {
            stage: "read-generate-response",
        })?;

        if !status.is_success() {
            return ResponseStatusSnafu {
                stage: "generate-http-status",
                status: status.as_u16(),
                body: payload,
            }
            .fail();
        }

        let decoded: GenerateContentResponse =
            serde_json::from_str(&payload).context(DecodeResponseSnafu {
                stage: "decode-generate-response",
            })?;

        decoded.into_output()
    }

    async fn query(&self, request: QueryRequest) -> QueryResult<GenerationOutput> {
        let (images, others) = request.partition_attachments();
        if !others.is_empty() {
            tracing::debug!(
                provider_id = %self.config.provider_id,
                dropped_attachment_count = others.len(),
                "non-image attachments are not forwarded to the model"
            );
        }

        tracing::debug!(
            provider_id = %self.config.provider_id,
            model_id = %self.config.model_id,
            prompt_len = request.prompt.len(),
            image_count = images.len(),
            "sending grounded generate request"
        );

        match self.send_request(&request).await {
            Ok(output) => {
                tracing::debug!(
                    provider_id = %self.config.provider_id,
                    text_len = output.text.len(),
                    source_count = output.sources.len(),
                    "generate request completed"
                );
                Ok(output)
            }
            Err(error) => {
                tracing::error!(
                    provider_id = %self.config.provider_id,
                    model_id = %self.config.model_id,
                    error = %error,
                    "error querying generation API"
                );
                GenerationSnafu {
                    stage: "generate-content",
                }
                .fail()
            }
        }
    }
}

impl QueryGateway for GeminiGateway {
    fn id(&self) -> &str {
        &self.config.provider_id
    }

    fn model(&self) -> &str {
        &self.config.model_id
    }

    fn has_credential(&self) -> bool {
        self.config.has_api_key()
    }

    fn run_query<'a>(&'a self, request: QueryRequest) -> BoxFuture<'a, QueryResult<GenerationOutput>> {
        if !self.has_credential() {
            tracing::error!(
                provider_id = %self.config.provider_id,
                "query rejected because no API key is configured"
            );
            return Box::pin(future::ready(
                ConfigurationSnafu {
                    stage: "check-credential",
                }
                .fail(),
            ));
        }

        Box::pin(self.query(request))
    }
}
