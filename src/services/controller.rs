//! Classification request lifecycle.
//!
//! The controller is the only writer of [`ClassificationState`]. It does no
//! I/O itself: `render_complete` hands back a [`ClassifyRequest`] for the host
//! to run, and the host feeds the outcome back through `apply_response`.
//!
//! ```text
//! Idle ──select──▶ HasImage ──render_complete──▶ Predicting ──ok──▶ Displayed
//!                      ▲                               └──err──▶ Failed
//!                      └──────── select (from any state) ─────────┘
//! reset: any state ──▶ Idle
//! ```

use crate::error::ClassifyError;
use crate::models::classify_types::{
    ClassificationState, ClassificationStatus, ClassifyRequest, ImageId, Phase, PredictionResult,
    UploadedImage,
};
use tracing::{debug, info, warn};

/// What happened to a response handed to [`ClassificationController::apply_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Displayed,
    Failed,
    /// The request's image is no longer the one being predicted.
    Stale,
}

#[derive(Debug)]
pub struct ClassificationController {
    state: ClassificationState,
}

impl Default for ClassificationController {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationController {
    pub fn new() -> Self {
        Self {
            state: ClassificationState::Idle,
        }
    }

    pub fn state(&self) -> &ClassificationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.state.image()
    }

    pub fn results(&self) -> &[PredictionResult] {
        self.state.results()
    }

    pub fn status(&self) -> ClassificationStatus {
        ClassificationStatus::from(&self.state)
    }

    /// Stores a freshly picked image, dropping whatever image, results or
    /// pending request came before it.
    pub fn select(&mut self, image: UploadedImage) {
        if let Some(previous) = self.state.image() {
            debug!(previous = %previous.id, phase = %self.phase(), "new selection supersedes current image");
        }
        info!(image = %image.id, file = %image.file_name, "image selected");
        self.state = ClassificationState::HasImage { image };
    }

    /// The preview of `image_id` finished rendering. Yields the classify
    /// request at most once per image; repeated signals, signals for an image
    /// that is no longer shown, and signals after a result are ignored.
    pub fn render_complete(&mut self, image_id: ImageId) -> Option<ClassifyRequest> {
        let ClassificationState::HasImage { image } = &self.state else {
            debug!(image = %image_id, phase = %self.phase(), "render signal ignored");
            return None;
        };

        if image.id != image_id {
            debug!(image = %image_id, active = %image.id, "render signal for replaced image ignored");
            return None;
        }

        let request = image.classify_request();
        self.state = match std::mem::replace(&mut self.state, ClassificationState::Idle) {
            ClassificationState::HasImage { image } => ClassificationState::Predicting { image },
            other => other,
        };
        info!(image = %image_id, "classification requested");
        Some(request)
    }

    /// Applies the outcome of the request made for `image_id`, unless that
    /// image has since been reset or replaced.
    pub fn apply_response(
        &mut self,
        image_id: ImageId,
        outcome: Result<Vec<PredictionResult>, ClassifyError>,
    ) -> ResponseOutcome {
        let image = match std::mem::replace(&mut self.state, ClassificationState::Idle) {
            ClassificationState::Predicting { image } if image.id == image_id => image,
            other => {
                self.state = other;
                debug!(image = %image_id, phase = %self.phase(), "stale response dropped");
                return ResponseOutcome::Stale;
            }
        };

        match outcome {
            Ok(results) if !results.is_empty() => {
                info!(image = %image_id, count = results.len(), top = %results[0].label, "predictions received");
                self.state = ClassificationState::Displayed { image, results };
                ResponseOutcome::Displayed
            }
            Ok(_) => {
                let error = ClassifyError::parse("no predictions in response");
                warn!(image = %image_id, kind = error.kind(), "classification failed: {}", error);
                self.state = ClassificationState::Failed { image, error };
                ResponseOutcome::Failed
            }
            Err(error) => {
                match &error {
                    ClassifyError::ServerError { status, body } => {
                        warn!(image = %image_id, kind = error.kind(), status, body = %body, "classification failed");
                    }
                    _ => warn!(image = %image_id, kind = error.kind(), "classification failed: {}", error),
                }
                self.state = ClassificationState::Failed { image, error };
                ResponseOutcome::Failed
            }
        }
    }

    /// Back to `Idle`. Image and results go away together; a request still in
    /// flight will be dropped when it answers.
    pub fn reset(&mut self) {
        if let Some(image) = self.state.image() {
            info!(image = %image.id, phase = %self.phase(), "reset");
        }
        self.state = ClassificationState::Idle;
    }
}
