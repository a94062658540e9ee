//! Judgment request/response types

use serde::{Deserialize, Serialize};

use crate::domain::judgment::Label;
use crate::infrastructure::services::JudgeOutcome;

/// Single judgment request body.
///
/// Fields are optional so that missing keys surface as a 400 with a
/// domain-specific message instead of a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeRequest {
    pub sentence1: Option<String>,
    pub sentence2: Option<String>,
}

/// Single judgment response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResponse {
    pub sentence1: String,
    pub sentence2: String,
    pub similarity: f64,
    pub label: Label,
    pub cached: bool,
}

impl From<JudgeOutcome> for JudgeResponse {
    fn from(outcome: JudgeOutcome) -> Self {
        Self {
            sentence1: outcome.sentence1,
            sentence2: outcome.sentence2,
            similarity: outcome.similarity,
            label: outcome.label,
            cached: outcome.cached,
        }
    }
}

/// Bulk judgment request body
#[derive(Debug, Clone, Deserialize)]
pub struct BulkJudgeRequest {
    pub pairs: Option<Vec<JudgeRequest>>,
}

/// One entry in a bulk judgment response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkJudgeItem {
    pub sentence1: String,
    pub sentence2: String,
    pub similarity: f64,
    pub label: Label,
}

impl From<JudgeOutcome> for BulkJudgeItem {
    fn from(outcome: JudgeOutcome) -> Self {
        Self {
            sentence1: outcome.sentence1,
            sentence2: outcome.sentence2,
            similarity: outcome.similarity,
            label: outcome.label,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_request_tolerates_missing_fields() {
        let request: JudgeRequest = serde_json::from_str(r#"{ "sentence1": "Hello" }"#).unwrap();
        assert_eq!(request.sentence1.as_deref(), Some("Hello"));
        assert!(request.sentence2.is_none());
    }

    #[test]
    fn test_judge_response_serialization() {
        let response = JudgeResponse {
            sentence1: "He bought a car.".to_string(),
            sentence2: "He purchased a vehicle.".to_string(),
            similarity: 0.9134,
            label: Label::Entail,
            cached: false,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["label"], "ENTAIL");
        assert_eq!(json["similarity"], 0.9134);
        assert_eq!(json["cached"], false);
    }

    #[test]
    fn test_bulk_item_serialization() {
        let item = BulkJudgeItem {
            sentence1: "a".to_string(),
            sentence2: "b".to_string(),
            similarity: 0.1,
            label: Label::NoEntail,
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["label"], "NO_ENTAIL");
        assert!(json.get("cached").is_none());
    }
}
