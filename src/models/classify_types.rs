use crate::error::ClassifyError;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Selection counter. Every accepted pick gets a fresh, strictly larger id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub id: ImageId,
    pub file_name: String,
    pub media_type: String,
    pub raw_bytes: Arc<[u8]>,
    /// `data:<media type>;base64,<payload>`
    pub displayable: String,
}

impl UploadedImage {
    pub fn classify_request(&self) -> ClassifyRequest {
        ClassifyRequest {
            image_id: self.id,
            file_name: self.file_name.clone(),
            media_type: self.media_type.clone(),
            raw_bytes: Arc::clone(&self.raw_bytes),
        }
    }
}

/// One-shot command to classify a specific image. Produced by the controller,
/// carried out by a [`PredictionClient`](crate::services::classifier::client::PredictionClient).
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub image_id: ImageId,
    pub file_name: String,
    pub media_type: String,
    pub raw_bytes: Arc<[u8]>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub enum ClassificationState {
    Idle,
    HasImage {
        image: UploadedImage,
    },
    Predicting {
        image: UploadedImage,
    },
    Displayed {
        image: UploadedImage,
        results: Vec<PredictionResult>,
    },
    Failed {
        image: UploadedImage,
        error: ClassifyError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    HasImage,
    Predicting,
    Displayed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::HasImage => "has image",
            Phase::Predicting => "predicting",
            Phase::Displayed => "displayed",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl ClassificationState {
    pub fn phase(&self) -> Phase {
        match self {
            ClassificationState::Idle => Phase::Idle,
            ClassificationState::HasImage { .. } => Phase::HasImage,
            ClassificationState::Predicting { .. } => Phase::Predicting,
            ClassificationState::Displayed { .. } => Phase::Displayed,
            ClassificationState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        match self {
            ClassificationState::Idle => None,
            ClassificationState::HasImage { image }
            | ClassificationState::Predicting { image }
            | ClassificationState::Displayed { image, .. }
            | ClassificationState::Failed { image, .. } => Some(image),
        }
    }

    pub fn results(&self) -> &[PredictionResult] {
        match self {
            ClassificationState::Displayed { results, .. } => results,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&ClassifyError> {
        match self {
            ClassificationState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Serializable view of the controller, for hosts that forward state to a UI.
#[derive(Debug, Serialize, Clone)]
pub struct ClassificationStatus {
    pub phase: Phase,
    pub image_id: Option<ImageId>,
    pub file_name: Option<String>,
    pub results: Vec<PredictionResult>,
    pub error: Option<ClassifyError>,
}

impl From<&ClassificationState> for ClassificationStatus {
    fn from(state: &ClassificationState) -> Self {
        let image = state.image();
        ClassificationStatus {
            phase: state.phase(),
            image_id: image.map(|i| i.id),
            file_name: image.map(|i| i.file_name.clone()),
            results: state.results().to_vec(),
            error: state.error().cloned(),
        }
    }
}
