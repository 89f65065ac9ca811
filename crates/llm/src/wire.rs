//! Request and response bodies of the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use super::provider::{
    EmptyCandidatesSnafu, GenerationOutput, ProviderResult, QueryRequest, Source,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    pub system_instruction: Content<'a>,
    pub contents: Vec<Content<'a>>,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Part<'a> {
    Text(&'a str),
    InlineData(InlineData<'a>),
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoogleSearch {}

impl<'a> GenerateContentRequest<'a> {
    /// Builds the body for one grounded query.
    ///
    /// Only image attachments become parts; everything else is left out of the request.
    pub fn grounded(system_instruction: &'a str, request: &'a QueryRequest) -> Self {
        let (images, _) = request.partition_attachments();

        let mut parts = Vec::with_capacity(images.len() + 1);
        if !request.prompt.is_empty() {
            parts.push(Part::Text(request.prompt.as_str()));
        }
        parts.extend(images.into_iter().map(|attachment| {
            Part::InlineData(InlineData {
                mime_type: attachment.mime_type.as_str(),
                data: attachment.inline_data(),
            })
        }));

        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text(system_instruction)],
            },
            contents: vec![Content {
                role: Some("user"),
                parts,
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// Reads the first candidate into text plus its complete citations.
    pub fn into_output(self) -> ProviderResult<GenerationOutput> {
        let candidate = self
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .context(EmptyCandidatesSnafu {
                stage: "read-first-candidate",
            })?;

        let text = candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text)
            .collect::<String>();

        // Duplicated citations across chunks are kept as-is.
        let sources = candidate
            .grounding_metadata
            .and_then(|metadata| metadata.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .map(|chunk| {
                let web = chunk.web.unwrap_or_default();
                Source::new(web.uri.unwrap_or_default(), web.title.unwrap_or_default())
            })
            .filter(Source::is_complete)
            .collect();

        Ok(GenerationOutput { text, sources })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::provider::{Attachment, ProviderError};

    fn decode(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("fixture should decode")
    }

    #[test]
    fn text_only_request_has_grounding_tool_and_persona() {
        let request = QueryRequest::new("Tell me about the latest Free Fire tournament.", vec![]);
        let body = serde_json::to_value(GenerateContentRequest::grounded("persona", &request))
            .expect("request should serialize");

        assert_eq!(
            body,
            json!({
                "systemInstruction": { "parts": [{ "text": "persona" }] },
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": "Tell me about the latest Free Fire tournament." }]
                }],
                "tools": [{ "googleSearch": {} }]
            })
        );
    }

    #[test]
    fn image_only_request_strips_data_url_prefix() {
        let request = QueryRequest::new(
            "",
            vec![Attachment::new(
                "shot.png",
                "image/png",
                "data:image/png;base64,AAAA",
            )],
        );
        let body = serde_json::to_value(GenerateContentRequest::grounded("persona", &request))
            .expect("request should serialize");

        assert_eq!(
            body["contents"][0]["parts"],
            json!([{ "inlineData": { "mimeType": "image/png", "data": "AAAA" } }])
        );
    }

    #[test]
    fn non_image_attachments_are_left_out() {
        let request = QueryRequest::new(
            "read this",
            vec![
                Attachment::new("guide.pdf", "application/pdf", "data:application/pdf;base64,JVBE"),
                Attachment::new("notes.txt", "text/plain", "data:text/plain;base64,aGk="),
            ],
        );
        let body = GenerateContentRequest::grounded("persona", &request);

        assert_eq!(body.contents[0].parts, vec![Part::Text("read this")]);
    }

    #[test]
    fn output_joins_text_parts_and_skips_thoughts() {
        let response = decode(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "planning", "thought": true },
                    { "text": "Booyah! " },
                    { "text": "Here you go." }
                ]}
            }]
        }));

        let output = response.into_output().expect("candidate is present");
        assert_eq!(output.text, "Booyah! Here you go.");
        assert!(output.sources.is_empty());
    }

    #[test]
    fn output_drops_incomplete_sources_and_keeps_duplicates() {
        let response = decode(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "X" }] },
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "http://a", "title": "A" } },
                    { "web": { "uri": "", "title": "No link" } },
                    { "web": { "uri": "http://b" } },
                    { "web": { "title": "Only title" } },
                    { "retrievedContext": { "uri": "gs://bucket" } },
                    {},
                    { "web": { "uri": "http://a", "title": "A" } }
                ]}
            }]
        }));

        let output = response.into_output().expect("candidate is present");
        assert_eq!(
            output.sources,
            vec![Source::new("http://a", "A"), Source::new("http://a", "A")]
        );
    }

    #[test]
    fn null_grounding_fields_yield_no_sources() {
        let response = decode(json!({
            "candidates": [{
                "content": { "parts": null },
                "groundingMetadata": { "groundingChunks": null }
            }]
        }));

        let output = response.into_output().expect("candidate is present");
        assert_eq!(output, GenerationOutput::default());
    }

    #[test]
    fn missing_candidates_is_an_error() {
        let error = decode(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .into_output()
            .expect_err("no candidates to read");

        assert!(matches!(error, ProviderError::EmptyCandidates { .. }));
    }
}
