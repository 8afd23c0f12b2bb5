//! Google Cloud Vision text detection over the REST API.
//!
//! Requests authenticate either with a service-account credentials file
//! (OAuth bearer token) or with an inline API key. The HTTP client and the
//! credentials are resolved on first use and cached for the life of the
//! detector; `gcp_auth` refreshes the access token itself.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use once_cell::sync::OnceCell;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::VisionConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::ocr::TextDetector;

/// OAuth scope requested for service-account tokens.
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImageContent,
    features: [Feature<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    feature_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct VisionError {
    error: VisionErrorDetail,
}

#[derive(Debug, Deserialize)]
struct VisionErrorDetail {
    message: String,
}

enum VisionAuth {
    ServiceAccount(CustomServiceAccount),
    ApiKey(SecretString),
}

struct VisionHttp {
    client: Client,
    auth: VisionAuth,
}

/// Text detector calling `images:annotate` with `TEXT_DETECTION`.
pub struct GoogleVisionDetector {
    config: VisionConfig,
    http: OnceCell<VisionHttp>,
}

impl GoogleVisionDetector {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            http: OnceCell::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(VisionConfig::from_env())
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/images:annotate", self.config.endpoint)
    }

    /// Build the client on first call, reuse it afterwards.
    fn http(&self) -> ExtractResult<&VisionHttp> {
        self.http.get_or_try_init(|| {
            let auth = match (&self.config.key_path, &self.config.api_key) {
                (Some(path), _) => {
                    let account = CustomServiceAccount::from_file(path).map_err(|e| {
                        ExtractError::configuration(format!(
                            "cannot load Vision service account {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    VisionAuth::ServiceAccount(account)
                }
                (None, Some(key)) => VisionAuth::ApiKey(key.clone()),
                (None, None) => {
                    return Err(ExtractError::configuration(
                        "Vision credentials not found. Set GOOGLE_CLOUD_VISION_KEY_PATH or GOOGLE_CLOUD_VISION_API_KEY.",
                    ))
                }
            };

            let client = Client::builder()
                .timeout(self.config.request_timeout)
                .build()
                .map_err(|e| ExtractError::configuration(format!("cannot build HTTP client: {}", e)))?;

            tracing::info!(endpoint = %self.config.endpoint, "Vision client initialized");
            Ok(VisionHttp { client, auth })
        })
    }
}

#[async_trait]
impl TextDetector for GoogleVisionDetector {
    async fn detect_text(&self, image: &[u8]) -> ExtractResult<serde_json::Value> {
        let http = self.http()?;

        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: [Feature {
                    feature_type: "TEXT_DETECTION",
                }],
            }],
        };

        let request = http.client.post(self.annotate_url()).json(&body);
        let request = match &http.auth {
            VisionAuth::ServiceAccount(account) => {
                let token = account.token(&[CLOUD_PLATFORM_SCOPE]).await.map_err(|e| {
                    ExtractError::upstream(format!("cannot obtain Vision access token: {}", e))
                })?;
                request.bearer_auth(token.as_str())
            }
            VisionAuth::ApiKey(key) => request.query(&[("key", key.expose_secret().as_str())]),
        };

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<VisionError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ExtractError::upstream(format!(
                "Vision API returned {}: {}",
                status, message
            )));
        }

        let payload: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::upstream(format!("invalid Vision API response: {}", e)))?;

        let annotations = payload
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ExtractError::upstream("Vision API returned no responses"))?;

        // Per-image failures (corrupt image, unsupported type) come back inside a 200.
        if let Some(message) = annotations
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return Err(ExtractError::invalid_input(message.to_string()));
        }

        Ok(annotations)
    }
}
