//! Google Cloud Vision OCR over the `images:annotate` REST endpoint.
//!
//! Uses the blocking reqwest client. The client is built lazily on the first
//! scan so that it is created on a worker thread, never inside the async
//! runtime.

use super::OcrScanner;
use crate::error::ExtractError;
use crate::types::{BoundingBox, PageImage, TextBox};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

/// Google Cloud Vision text detection.
pub struct GoogleVisionOcr {
    endpoint: String,
    api_key: String,
    timeout: Duration,
    client: OnceLock<reqwest::blocking::Client>,
}

impl GoogleVisionOcr {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> &reqwest::blocking::Client {
        self.client.get_or_init(reqwest::blocking::Client::new)
    }
}

// --- Request types ---

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    error: Option<Status>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityAnnotation {
    description: String,
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

// Vision omits zero coordinates.
#[derive(Deserialize)]
struct Vertex {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
}

#[derive(Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

fn to_bbox(poly: Option<&BoundingPoly>) -> BoundingBox {
    let Some(poly) = poly.filter(|p| !p.vertices.is_empty()) else {
        return BoundingBox::default();
    };
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for v in &poly.vertices {
        min_x = min_x.min(v.x);
        min_y = min_y.min(v.y);
        max_x = max_x.max(v.x);
        max_y = max_y.max(v.y);
    }
    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

/// Convert a Vision response into word-level text boxes.
///
/// The first text annotation is the full-page text; the rest are words in
/// reading order.
fn parse_response(resp: AnnotateResponse) -> Result<Vec<TextBox>, ExtractError> {
    let Some(image) = resp.responses.into_iter().next() else {
        return Ok(Vec::new());
    };
    if let Some(err) = image.error {
        return Err(ExtractError::Ocr {
            message: format!("Google Vision error {}: {}", err.code, err.message),
        });
    }

    Ok(image
        .text_annotations
        .into_iter()
        .skip(1)
        .map(|a| TextBox {
            bbox: to_bbox(a.bounding_poly.as_ref()),
            text: a.description,
        })
        .collect())
}

impl OcrScanner for GoogleVisionOcr {
    fn name(&self) -> &str {
        "google-vision"
    }

    fn scan(&self, image: &PageImage) -> Result<Vec<TextBox>, ExtractError> {
        let body = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image.bytes()),
                },
                features: vec![Feature {
                    feature_type: "TEXT_DETECTION".to_string(),
                }],
            }],
        };

        let url = format!("{}/v1/images:annotate", self.endpoint);
        let resp = self
            .client()
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .timeout(self.timeout)
            .send()
            .map_err(|e| ExtractError::Ocr {
                message: format!("Google Vision request failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(ExtractError::Ocr {
                message: format!("Google Vision HTTP {status}: {text}"),
            });
        }

        let annotate: AnnotateResponse = resp.json().map_err(|e| ExtractError::Ocr {
            message: format!("Failed to parse Google Vision response: {e}"),
        })?;

        parse_response(annotate)
    }
}
