//! JSON bodies returned by the `/predict` route of the inference service.
//!
//! Two backend generations are deployed and neither advertises a version, so
//! both shapes are accepted.

use serde::Deserialize;

/// Top-k list returned by the CNN backend:
/// `{ "predictions": [ { "className": "...", "probability": 0.9 }, ... ] }`
#[derive(Debug, Deserialize)]
pub struct PredictionList {
    pub predictions: Vec<ClassProbability>,
}

#[derive(Debug, Deserialize)]
pub struct ClassProbability {
    #[serde(rename = "className")]
    pub class_name: String,
    pub probability: f64,
}

/// Arg-max answer returned by the gradient boosted backend:
/// `{ "prediction": "...", "confidence": 0.87 }`
#[derive(Debug, Deserialize)]
pub struct SinglePrediction {
    pub prediction: String,
    pub confidence: f64,
}

#[derive(Debug)]
pub enum PredictionResponse {
    List(PredictionList),
    Single(SinglePrediction),
}

/// Body of `GET /health`.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
