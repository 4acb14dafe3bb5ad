use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::recognition::domain::provider_error::{ErrorClass, ProviderError};
use crate::recognition::domain::recognition_provider::{
    DetectedFace, GalleryStatus, RecognitionProvider, SearchHit,
};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{DEFAULT_PROVIDER_ENDPOINT, DEFAULT_REQUEST_TIMEOUT};

/// Maximum hits requested per gallery search.
const SEARCH_RESULT_COUNT: &str = "5";

#[derive(Clone, Debug)]
pub struct FacePlusPlusConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout: Duration,
}

impl FacePlusPlusConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_PROVIDER_ENDPOINT.to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// [`RecognitionProvider`] backed by the Face++ v3 HTTP API, where a gallery
/// is a "faceset".
pub struct FacePlusPlusProvider {
    client: Client,
    config: FacePlusPlusConfig,
}

impl FacePlusPlusProvider {
    pub fn new(config: FacePlusPlusConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn credentials(&self) -> Form {
        Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("api_secret", self.config.api_secret.clone())
    }

    fn with_image(&self, image: &[u8]) -> Result<Form, ProviderError> {
        let part = Part::bytes(image.to_vec())
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(self.credentials().part("image_file", part))
    }

    fn post<R: DeserializeOwned>(&self, path: &str, form: Form) -> Result<R, ProviderError> {
        let url = format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        parse_response(status, &body)
    }
}

impl RecognitionProvider for FacePlusPlusProvider {
    fn create_gallery(&self, name: &str) -> Result<String, ProviderError> {
        let form = self.credentials().text("display_name", name.to_string());
        let response: CreateResponse = self.post("faceset/create", form)?;
        Ok(response.faceset_token)
    }

    fn enroll_face(&self, gallery_token: &str, face_token: &str) -> Result<(), ProviderError> {
        let form = self
            .credentials()
            .text("faceset_token", gallery_token.to_string())
            .text("face_tokens", face_token.to_string());
        let response: AddFaceResponse = self.post("faceset/addface", form)?;
        response.into_result()
    }

    fn detect_faces(&self, image: &[u8]) -> Result<Vec<DetectedFace>, ProviderError> {
        let response: DetectResponse = self.post("detect", self.with_image(image)?)?;
        Ok(response.faces.into_iter().map(DetectedFace::from).collect())
    }

    fn search_gallery(
        &self,
        image: &[u8],
        gallery_token: &str,
    ) -> Result<Vec<SearchHit>, ProviderError> {
        let form = self
            .with_image(image)?
            .text("faceset_token", gallery_token.to_string())
            .text("return_result_count", SEARCH_RESULT_COUNT);
        let response: SearchResponse = self.post("search", form)?;
        Ok(response
            .results
            .into_iter()
            .map(|r| SearchHit {
                face_token: r.face_token,
                confidence: r.confidence,
            })
            .collect())
    }

    fn validate_gallery(&self, gallery_token: &str) -> Result<GalleryStatus, ProviderError> {
        let form = self
            .credentials()
            .text("faceset_token", gallery_token.to_string());
        match self.post::<DetailResponse>("faceset/getdetail", form) {
            Ok(detail) => Ok(GalleryStatus {
                face_count: detail.face_count,
            }),
            Err(err) if err.class() == ErrorClass::InvalidResource => {
                Err(ProviderError::GalleryNotFound(gallery_token.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    fn delete_gallery(&self, gallery_token: &str) -> Result<(), ProviderError> {
        let form = self
            .credentials()
            .text("faceset_token", gallery_token.to_string())
            .text("check_empty", "0");
        let _: serde_json::Value = self.post("faceset/delete", form)?;
        Ok(())
    }
}

/// Decodes a Face++ response body, surfacing `error_message` as an API error
/// whether it arrives with an error status or not.
fn parse_response<R: DeserializeOwned>(status: u16, body: &str) -> Result<R, ProviderError> {
    if let Ok(ErrorBody {
        error_message: Some(message),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return Err(ProviderError::Api { status, message });
    }
    if !(200..300).contains(&status) {
        return Err(ProviderError::Api {
            status,
            message: body.trim().to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    faceset_token: String,
}

#[derive(Debug, Deserialize)]
struct AddFaceResponse {
    face_added: usize,
    #[serde(default)]
    failure_detail: Vec<FailureDetail>,
}

#[derive(Debug, Deserialize)]
struct FailureDetail {
    reason: String,
}

impl AddFaceResponse {
    fn into_result(self) -> Result<(), ProviderError> {
        if self.face_added > 0 {
            return Ok(());
        }
        let reason = self
            .failure_detail
            .into_iter()
            .map(|d| d.reason)
            .next()
            .unwrap_or_else(|| "face not added".to_string());
        Err(ProviderError::Api {
            status: 200,
            message: reason,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    faces: Vec<FaceppFace>,
}

#[derive(Debug, Deserialize)]
struct FaceppFace {
    face_token: String,
    face_rectangle: FaceppRectangle,
    #[serde(default)]
    attributes: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FaceppRectangle {
    top: i32,
    left: i32,
    width: i32,
    height: i32,
}

impl From<FaceppFace> for DetectedFace {
    fn from(face: FaceppFace) -> Self {
        let r = face.face_rectangle;
        DetectedFace {
            face_token: face.face_token,
            rectangle: BoundingBox::new(r.left, r.top, r.width, r.height),
            attributes: face.attributes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<FaceppResult>,
}

#[derive(Debug, Deserialize)]
struct FaceppResult {
    face_token: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    face_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_response_maps_rectangle() {
        let body = r#"{
            "request_id": "1",
            "faces": [
                {"face_token": "f1", "face_rectangle": {"top": 20, "left": 10, "width": 64, "height": 80}},
                {"face_token": "f2", "face_rectangle": {"top": 5, "left": 300, "width": 30, "height": 30},
                 "attributes": {"gender": {"value": "Female"}}}
            ]
        }"#;
        let response: DetectResponse = parse_response(200, body).unwrap();
        let faces: Vec<DetectedFace> = response.faces.into_iter().map(DetectedFace::from).collect();

        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].face_token, "f1");
        assert_eq!(faces[0].rectangle, BoundingBox::new(10, 20, 64, 80));
        assert!(faces[0].attributes.is_none());
        assert!(faces[1].attributes.is_some());
    }

    #[test]
    fn test_detect_without_faces_field_is_empty() {
        let response: DetectResponse = parse_response(200, r#"{"request_id": "x"}"#).unwrap();
        assert!(response.faces.is_empty());
    }

    #[test]
    fn test_search_results_keep_raw_confidence() {
        let body = r#"{"results": [{"face_token": "t", "confidence": 87.4, "user_id": ""}]}"#;
        let response: SearchResponse = parse_response(200, body).unwrap();
        assert_eq!(response.results[0].confidence, 87.4);
    }

    #[test]
    fn test_error_message_becomes_api_error() {
        let body = r#"{"error_message": "CONCURRENCY_LIMIT_EXCEEDED", "request_id": "r"}"#;
        let err = parse_response::<DetectResponse>(403, body).unwrap_err();
        assert_eq!(
            err,
            ProviderError::Api {
                status: 403,
                message: "CONCURRENCY_LIMIT_EXCEEDED".into()
            }
        );
        assert_eq!(err.class(), ErrorClass::TransientRate);
    }

    #[test]
    fn test_invalid_faceset_token_classified_as_invalid_resource() {
        let body = r#"{"error_message": "INVALID_FACESET_TOKEN"}"#;
        let err = parse_response::<DetailResponse>(400, body).unwrap_err();
        assert_eq!(err.class(), ErrorClass::InvalidResource);
    }

    #[test]
    fn test_non_json_error_body_is_kept_verbatim() {
        let err = parse_response::<DetectResponse>(502, "Bad Gateway\n").unwrap_err();
        assert_eq!(
            err,
            ProviderError::Api {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
    }

    #[test]
    fn test_malformed_success_body_is_decode_error() {
        let err = parse_response::<CreateResponse>(200, r#"{"unexpected": 1}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn test_add_face_failure_surfaces_reason() {
        let body = r#"{"face_added": 0, "failure_detail": [{"face_token": "f", "reason": "INVALID_FACE_TOKEN"}]}"#;
        let response: AddFaceResponse = parse_response(200, body).unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), "provider returned HTTP 200: INVALID_FACE_TOKEN");
    }

    #[test]
    fn test_add_face_success() {
        let response: AddFaceResponse = parse_response(200, r#"{"face_added": 1, "face_count": 1}"#).unwrap();
        assert!(response.into_result().is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let config = FacePlusPlusConfig::new("key", "secret");
        assert_eq!(config.endpoint, DEFAULT_PROVIDER_ENDPOINT);
        assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_unreachable_endpoint_is_network_error() {
        let config = FacePlusPlusConfig {
            endpoint: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(2),
            ..FacePlusPlusConfig::new("key", "secret")
        };
        let provider = FacePlusPlusProvider::new(config).unwrap();
        let err = provider.create_gallery("test").unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(err.class(), ErrorClass::Other);
    }
}
