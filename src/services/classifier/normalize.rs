use crate::error::ClassifyError;
use crate::models::classify_types::PredictionResult;
use crate::models::prediction_wire::{PredictionList, PredictionResponse, SinglePrediction};
use serde_json::Value;

/// Picks the response shape by field presence. `predictions` wins when both
/// fields are present.
pub fn detect_shape(body: Value) -> Result<PredictionResponse, ClassifyError> {
    let Value::Object(map) = &body else {
        return Err(ClassifyError::parse("response body is not a JSON object"));
    };

    if map.contains_key("predictions") {
        let list: PredictionList = serde_json::from_value(body)
            .map_err(|e| ClassifyError::parse(format!("invalid prediction list: {}", e)))?;
        Ok(PredictionResponse::List(list))
    } else if map.contains_key("prediction") {
        let single: SinglePrediction = serde_json::from_value(body)
            .map_err(|e| ClassifyError::parse(format!("invalid single prediction: {}", e)))?;
        Ok(PredictionResponse::Single(single))
    } else {
        Err(ClassifyError::parse(
            "response has neither `predictions` nor `prediction`",
        ))
    }
}

impl PredictionResponse {
    /// Flattens either shape into an ordered, non-empty result list with every
    /// confidence inside `[0, 1]`.
    pub fn into_results(self) -> Result<Vec<PredictionResult>, ClassifyError> {
        let results: Vec<PredictionResult> = match self {
            PredictionResponse::List(list) => list
                .predictions
                .into_iter()
                .map(|p| PredictionResult {
                    label: p.class_name,
                    confidence: p.probability,
                })
                .collect(),
            PredictionResponse::Single(single) => vec![PredictionResult {
                label: single.prediction,
                confidence: single.confidence,
            }],
        };

        if results.is_empty() {
            return Err(ClassifyError::parse("prediction list is empty"));
        }

        if let Some(bad) = results
            .iter()
            .find(|r| !(0.0..=1.0).contains(&r.confidence))
        {
            return Err(ClassifyError::parse(format!(
                "confidence {} for {:?} is outside [0, 1]",
                bad.confidence, bad.label
            )));
        }

        Ok(results)
    }
}

pub fn normalize_body(body: &[u8]) -> Result<Vec<PredictionResult>, ClassifyError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ClassifyError::parse(format!("response is not JSON: {}", e)))?;
    detect_shape(value)?.into_results()
}
