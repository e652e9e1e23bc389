//! Image object detection.
//!
//! [`GeminiDetector`] sends an inline image plus a structured-output schema
//! and parses the returned `{label, box_2d}` list into [`DetectedObject`]s.
//! [`FallbackDetector`] wraps any detector and converts every error into an
//! empty list, so callers can treat "no objects" as the single terminal
//! outcome the results screen knows how to render.

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use crate::content::client::{first_text_part, strip_code_fences, GeminiClient};
use crate::content::{BoundingBox, ContentError, DetectedObject, ImagePayload};

// ---------------------------------------------------------------------------
// ObjectDetector trait
// ---------------------------------------------------------------------------

/// Async trait for image object detection.
///
/// Implementors must be `Send + Sync` so they can be shared across threads
/// (e.g. wrapped in `Arc<dyn ObjectDetector>`).
///
/// A successful call with zero detections and a failed call are distinct at
/// this seam; [`FallbackDetector`] is where the two are deliberately merged.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image: &ImagePayload) -> Result<Vec<DetectedObject>, ContentError>;
}

// ---------------------------------------------------------------------------
// GeminiDetector
// ---------------------------------------------------------------------------

/// Wire shape of one detection entry.
#[derive(Debug, Deserialize)]
struct RawDetection {
    label: String,
    box_2d: [i64; 4],
}

/// Calls the multimodal `generateContent` endpoint with an inline image and
/// a JSON response schema.
pub struct GeminiDetector {
    client: GeminiClient,
}

impl GeminiDetector {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn response_schema() -> serde_json::Value {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "label": {
                        "type": "STRING",
                        "description": "The English name of the object"
                    },
                    "box_2d": {
                        "type": "ARRAY",
                        "items": { "type": "INTEGER" },
                        "description": "Bounding box coordinates [ymin, xmin, ymax, xmax] normalized to 1000x1000 grid."
                    }
                },
                "required": ["label", "box_2d"]
            }
        })
    }

    /// Parse the model's JSON text into detections, skipping entries whose
    /// boxes violate the grid invariants.
    fn parse_detections(text: &str) -> Result<Vec<DetectedObject>, ContentError> {
        let clean = strip_code_fences(text);
        let raw: Vec<RawDetection> =
            serde_json::from_str(&clean).map_err(|e| ContentError::Parse(e.to_string()))?;

        let objects = raw
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match BoundingBox::from_wire(entry.box_2d) {
                Some(bounding_box) => Some(DetectedObject {
                    id: format!("obj-{}-{}", i, uuid::Uuid::new_v4()),
                    label: entry.label,
                    bounding_box,
                }),
                None => {
                    log::warn!(
                        "detect: dropping '{}' — box {:?} outside the 0-1000 grid",
                        entry.label,
                        entry.box_2d
                    );
                    None
                }
            })
            .collect();

        Ok(objects)
    }
}

#[async_trait]
impl ObjectDetector for GeminiDetector {
    async fn detect(&self, image: &ImagePayload) -> Result<Vec<DetectedObject>, ContentError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image.bytes.as_slice());

        let body = json!({
            "contents": [ {
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": image.mime_type,
                            "data": encoded
                        }
                    },
                    {
                        "text": "Detect the main objects in this image. Return a list of objects with their English labels and 2D bounding boxes."
                    }
                ]
            } ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": Self::response_schema(),
                "temperature": self.client.config().temperature
            }
        });

        let model = self.client.config().detect_model.clone();
        let response = self.client.generate(&model, body).await?;

        let text = first_text_part(&response).ok_or(ContentError::EmptyResponse)?;
        Self::parse_detections(text)
    }
}

// ---------------------------------------------------------------------------
// FallbackDetector
// ---------------------------------------------------------------------------

/// A transparent wrapper around any [`ObjectDetector`] that never returns an
/// error — on failure it returns an empty list.
///
/// Callers downstream of this wrapper cannot distinguish "nothing detected"
/// from "call failed"; the distinction survives only in the logs.
pub struct FallbackDetector<D: ObjectDetector> {
    inner: D,
}

impl<D: ObjectDetector> FallbackDetector<D> {
    /// Wrap `inner` with fallback behaviour.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<D: ObjectDetector + Send + Sync> ObjectDetector for FallbackDetector<D> {
    /// Attempt detection; return an empty list if any error occurs.
    ///
    /// This implementation **never** returns `Err(_)`.
    async fn detect(&self, image: &ImagePayload) -> Result<Vec<DetectedObject>, ContentError> {
        match self.inner.detect(image).await {
            Ok(objects) => Ok(objects),
            Err(err) => {
                log::warn!("detection failed — returning empty list: {err}");
                Ok(Vec::new())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn test_image() -> ImagePayload {
        ImagePayload::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg")
    }

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Always succeeds with the given detections.
    struct AlwaysOk(Vec<DetectedObject>);

    #[async_trait]
    impl ObjectDetector for AlwaysOk {
        async fn detect(
            &self,
            _image: &ImagePayload,
        ) -> Result<Vec<DetectedObject>, ContentError> {
            Ok(self.0.clone())
        }
    }

    /// Always returns the given error kind.
    struct AlwaysFails;

    #[async_trait]
    impl ObjectDetector for AlwaysFails {
        async fn detect(
            &self,
            _image: &ImagePayload,
        ) -> Result<Vec<DetectedObject>, ContentError> {
            Err(ContentError::Timeout)
        }
    }

    fn sample_object(label: &str) -> DetectedObject {
        DetectedObject {
            id: "obj-0-test".into(),
            label: label.into(),
            bounding_box: BoundingBox::from_wire([100, 200, 300, 400]).unwrap(),
        }
    }

    // -----------------------------------------------------------------------
    // parse_detections
    // -----------------------------------------------------------------------

    #[test]
    fn parse_valid_payload() {
        let text = r#"[{"label": "cup", "box_2d": [100, 200, 300, 400]}]"#;
        let objects = GeminiDetector::parse_detections(text).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].label, "cup");
        assert_eq!(
            objects[0].bounding_box,
            BoundingBox::from_wire([100, 200, 300, 400]).unwrap()
        );
    }

    #[test]
    fn parse_strips_code_fences() {
        let text = "```json\n[{\"label\": \"lamp\", \"box_2d\": [0, 0, 500, 500]}]\n```";
        let objects = GeminiDetector::parse_detections(text).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].label, "lamp");
    }

    #[test]
    fn parse_empty_array_yields_no_objects() {
        let objects = GeminiDetector::parse_detections("[]").unwrap();
        assert!(objects.is_empty());
    }

    #[test]
    fn parse_skips_invalid_boxes() {
        let text = r#"[
            {"label": "good", "box_2d": [100, 100, 200, 200]},
            {"label": "inverted", "box_2d": [300, 100, 100, 200]},
            {"label": "off-grid", "box_2d": [0, 0, 2000, 500]}
        ]"#;
        let objects = GeminiDetector::parse_detections(text).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].label, "good");
    }

    #[test]
    fn parse_non_json_is_a_parse_error() {
        let result = GeminiDetector::parse_detections("sorry, I cannot do that");
        assert!(matches!(result, Err(ContentError::Parse(_))));
    }

    #[test]
    fn parse_assigns_unique_ids() {
        let text = r#"[
            {"label": "a", "box_2d": [0, 0, 100, 100]},
            {"label": "b", "box_2d": [0, 0, 100, 100]}
        ]"#;
        let objects = GeminiDetector::parse_detections(text).unwrap();
        assert_ne!(objects[0].id, objects[1].id);
    }

    // -----------------------------------------------------------------------
    // FallbackDetector
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fallback_passes_through_success() {
        let detector = FallbackDetector::new(AlwaysOk(vec![sample_object("cup")]));
        let objects = detector.detect(&test_image()).await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].label, "cup");
    }

    #[tokio::test]
    async fn fallback_returns_empty_on_error() {
        let detector = FallbackDetector::new(AlwaysFails);
        let objects = detector.detect(&test_image()).await.unwrap();
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn fallback_never_returns_err() {
        let detector = FallbackDetector::new(AlwaysFails);
        assert!(detector.detect(&test_image()).await.is_ok());
    }

    /// FallbackDetector<D> must itself be a valid ObjectDetector (object-safe).
    #[test]
    fn fallback_is_object_safe() {
        let inner = AlwaysOk(Vec::new());
        let _: Box<dyn ObjectDetector> = Box::new(FallbackDetector::new(inner));
    }
}
