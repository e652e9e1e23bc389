//! Screen state machine.
//!
//! [`Screen`] carries each screen's payload in its variant, so illegal
//! combinations (a Detail view without a selected word, Results without an
//! image) are unrepresentable.  [`Flow`] is the single transition surface.
//!
//! The state machine transitions are:
//!
//! ```text
//! Home ──start capture──▶ Camera ──image obtained──▶ Analyzing
//!      Analyzing ──detection response──▶ Results   (possibly zero objects)
//!      Results ──box tap──▶ Detail ──back──▶ Results
//! Home ──▶ WordBook ──word tap──▶ Detail ──back──▶ WordBook
//! Home ──▶ Profile ──back──▶ Home
//! any state ──sign-out / reset──▶ Home  (payload cleared)
//! ```
//!
//! A monotonically increasing generation counter scopes each detection
//! request to the capture that issued it: responses carrying a stale
//! generation are discarded, which replaces the usual "apply only if the
//! view is still mounted" flag with something testable.

use crate::content::{DetectedObject, ImagePayload};

// ---------------------------------------------------------------------------
// DetailOrigin
// ---------------------------------------------------------------------------

/// Where the Detail screen was opened from, carrying what "back" restores.
#[derive(Debug, Clone)]
pub enum DetailOrigin {
    /// Opened by tapping a detection box — back returns to the same results.
    Results {
        image: ImagePayload,
        objects: Vec<DetectedObject>,
    },
    /// Opened from the word book, without an image context.
    WordBook,
}

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

/// The active screen and its payload.  Exactly one screen is active at a
/// time; transitions are synchronous.
#[derive(Debug, Clone)]
pub enum Screen {
    /// Landing screen with the capture / word-book entry points.
    Home,
    /// Image selection (file load or drag-drop stands in for the camera).
    Camera,
    /// An image was obtained; the detection call is in flight.
    Analyzing { image: ImagePayload },
    /// Detection finished.  `objects` may be empty — the screen shows an
    /// empty-state hint rather than an error.
    Results {
        image: ImagePayload,
        objects: Vec<DetectedObject>,
    },
    /// Word detail / pronunciation view.
    Detail { word: String, origin: DetailOrigin },
    /// The saved word list.
    WordBook,
    /// Profile editor.
    Profile,
}

impl Screen {
    /// A short human-readable label suitable for the window title bar.
    pub fn label(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Camera => "Camera",
            Screen::Analyzing { .. } => "Analyzing",
            Screen::Results { .. } => "Results",
            Screen::Detail { .. } => "Word Details",
            Screen::WordBook => "My Word Book",
            Screen::Profile => "Profile",
        }
    }

    /// Returns `true` while a detection request is in flight.
    pub fn is_analyzing(&self) -> bool {
        matches!(self, Screen::Analyzing { .. })
    }
}

impl Default for Screen {
    fn default() -> Self {
        Screen::Home
    }
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Owns the current screen and the detection-request generation counter.
#[derive(Debug, Default)]
pub struct Flow {
    screen: Screen,
    generation: u64,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Generation of the most recent capture.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// User starts a capture.
    pub fn start_capture(&mut self) {
        self.screen = Screen::Camera;
    }

    /// User abandons the capture before picking an image.
    pub fn cancel_capture(&mut self) {
        if matches!(self.screen, Screen::Camera) {
            self.screen = Screen::Home;
        }
    }

    /// An image was obtained; enter Analyzing and return the generation the
    /// caller must attach to the detection request.
    pub fn image_captured(&mut self, image: ImagePayload) -> u64 {
        self.generation += 1;
        self.screen = Screen::Analyzing { image };
        self.generation
    }

    /// Apply a detection response.  Returns `false` (dropping the response)
    /// when the generation is stale or the user has navigated away.
    pub fn detection_complete(&mut self, generation: u64, objects: Vec<DetectedObject>) -> bool {
        if generation != self.generation {
            log::debug!(
                "flow: dropping stale detection response (gen {generation}, current {})",
                self.generation
            );
            return false;
        }
        match std::mem::take(&mut self.screen) {
            Screen::Analyzing { image } => {
                self.screen = Screen::Results { image, objects };
                true
            }
            other => {
                // Navigated away while the request was in flight.
                self.screen = other;
                false
            }
        }
    }

    /// User taps a detection box or a word-book entry.  Returns `false` when
    /// the current screen has no word to select.
    pub fn select_word(&mut self, word: &str) -> bool {
        match std::mem::take(&mut self.screen) {
            Screen::Results { image, objects } => {
                self.screen = Screen::Detail {
                    word: word.to_string(),
                    origin: DetailOrigin::Results { image, objects },
                };
                true
            }
            Screen::WordBook => {
                self.screen = Screen::Detail {
                    word: word.to_string(),
                    origin: DetailOrigin::WordBook,
                };
                true
            }
            other => {
                self.screen = other;
                false
            }
        }
    }

    /// Back navigation.  Detail returns to its origin; list/editor screens
    /// return home; Results counts as "done with this photo".
    pub fn back(&mut self) {
        self.screen = match std::mem::take(&mut self.screen) {
            Screen::Detail {
                origin: DetailOrigin::Results { image, objects },
                ..
            } => Screen::Results { image, objects },
            Screen::Detail {
                origin: DetailOrigin::WordBook,
                ..
            } => Screen::WordBook,
            Screen::Camera
            | Screen::WordBook
            | Screen::Profile
            | Screen::Results { .. }
            | Screen::Home => Screen::Home,
            // No back while a request is in flight; reset covers it.
            analyzing @ Screen::Analyzing { .. } => analyzing,
        };
    }

    pub fn open_word_book(&mut self) {
        self.screen = Screen::WordBook;
    }

    pub fn open_profile(&mut self) {
        self.screen = Screen::Profile;
    }

    /// Return home and drop all transient payload (image, detections,
    /// selection).  Used by sign-out and "New Photo".
    pub fn reset(&mut self) {
        self.screen = Screen::Home;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::BoundingBox;

    fn test_image() -> ImagePayload {
        ImagePayload::new(vec![1, 2, 3], "image/jpeg")
    }

    fn test_object(label: &str) -> DetectedObject {
        DetectedObject {
            id: format!("obj-0-{label}"),
            label: label.into(),
            bounding_box: BoundingBox::from_wire([100, 200, 300, 400]).unwrap(),
        }
    }

    // ---- capture path ---

    #[test]
    fn starts_at_home() {
        let flow = Flow::new();
        assert!(matches!(flow.screen(), Screen::Home));
    }

    #[test]
    fn cancel_capture_only_leaves_the_camera() {
        let mut flow = Flow::new();
        flow.start_capture();
        flow.cancel_capture();
        assert!(matches!(flow.screen(), Screen::Home));

        // Cancelling outside the camera is a no-op.
        flow.open_word_book();
        flow.cancel_capture();
        assert!(matches!(flow.screen(), Screen::WordBook));
    }

    #[test]
    fn capture_path_reaches_results() {
        let mut flow = Flow::new();
        flow.start_capture();
        assert!(matches!(flow.screen(), Screen::Camera));

        let generation = flow.image_captured(test_image());
        assert!(flow.screen().is_analyzing());

        assert!(flow.detection_complete(generation, vec![test_object("cup")]));
        match flow.screen() {
            Screen::Results { objects, .. } => assert_eq!(objects.len(), 1),
            other => panic!("expected Results, got {other:?}"),
        }
    }

    #[test]
    fn zero_detections_is_a_valid_results_state() {
        let mut flow = Flow::new();
        let generation = flow.image_captured(test_image());
        assert!(flow.detection_complete(generation, Vec::new()));
        match flow.screen() {
            Screen::Results { objects, .. } => assert!(objects.is_empty()),
            other => panic!("expected Results, got {other:?}"),
        }
    }

    // ---- stale-response handling ---

    #[test]
    fn stale_generation_is_discarded() {
        let mut flow = Flow::new();
        let first = flow.image_captured(test_image());
        let second = flow.image_captured(test_image());
        assert_ne!(first, second);

        // The slow response for the first capture arrives late.
        assert!(!flow.detection_complete(first, vec![test_object("stale")]));
        assert!(flow.screen().is_analyzing());

        assert!(flow.detection_complete(second, vec![test_object("fresh")]));
        match flow.screen() {
            Screen::Results { objects, .. } => assert_eq!(objects[0].label, "fresh"),
            other => panic!("expected Results, got {other:?}"),
        }
    }

    #[test]
    fn detection_after_reset_is_discarded() {
        let mut flow = Flow::new();
        let generation = flow.image_captured(test_image());
        flow.reset();
        assert!(!flow.detection_complete(generation, vec![test_object("late")]));
        assert!(matches!(flow.screen(), Screen::Home));
    }

    // ---- detail navigation ---

    #[test]
    fn detail_from_results_returns_to_results_on_back() {
        let mut flow = Flow::new();
        let generation = flow.image_captured(test_image());
        flow.detection_complete(generation, vec![test_object("cup")]);

        assert!(flow.select_word("cup"));
        assert!(matches!(flow.screen(), Screen::Detail { .. }));

        flow.back();
        match flow.screen() {
            Screen::Results { objects, .. } => assert_eq!(objects[0].label, "cup"),
            other => panic!("expected Results, got {other:?}"),
        }
    }

    #[test]
    fn detail_from_word_book_returns_to_word_book_on_back() {
        let mut flow = Flow::new();
        flow.open_word_book();
        assert!(flow.select_word("lamp"));
        match flow.screen() {
            Screen::Detail { word, origin } => {
                assert_eq!(word, "lamp");
                assert!(matches!(origin, DetailOrigin::WordBook));
            }
            other => panic!("expected Detail, got {other:?}"),
        }

        flow.back();
        assert!(matches!(flow.screen(), Screen::WordBook));
    }

    #[test]
    fn select_word_is_ignored_outside_results_and_word_book() {
        let mut flow = Flow::new();
        assert!(!flow.select_word("cup"));
        assert!(matches!(flow.screen(), Screen::Home));

        flow.open_profile();
        assert!(!flow.select_word("cup"));
        assert!(matches!(flow.screen(), Screen::Profile));
    }

    // ---- back / reset ---

    #[test]
    fn back_from_lists_and_editor_goes_home() {
        let mut flow = Flow::new();
        flow.open_word_book();
        flow.back();
        assert!(matches!(flow.screen(), Screen::Home));

        flow.open_profile();
        flow.back();
        assert!(matches!(flow.screen(), Screen::Home));

        flow.start_capture();
        flow.back();
        assert!(matches!(flow.screen(), Screen::Home));
    }

    #[test]
    fn reset_clears_all_payload() {
        let mut flow = Flow::new();
        let generation = flow.image_captured(test_image());
        flow.detection_complete(generation, vec![test_object("cup")]);
        flow.select_word("cup");

        flow.reset();
        assert!(matches!(flow.screen(), Screen::Home));
    }

    // ---- labels ---

    #[test]
    fn labels_are_stable() {
        assert_eq!(Screen::Home.label(), "Home");
        assert_eq!(Screen::WordBook.label(), "My Word Book");
        assert_eq!(
            Screen::Detail {
                word: "x".into(),
                origin: DetailOrigin::WordBook
            }
            .label(),
            "Word Details"
        );
    }
}
