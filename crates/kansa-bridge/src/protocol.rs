//! Wire shapes exchanged with the analysis host.
//!
//! Two exchanges exist: one declares the active rules, environments and
//! globals; the other submits a code unit and receives issues plus the
//! engine's AST payload. The TypeScript dialect's raw responses carry
//! `ast` and `scopes` as nested JSON-encoded strings; decoding them into
//! native values is part of the adapter contract.

use serde::{Deserialize, Serialize};

use kansa_core::analysis::FileType;
use kansa_core::linter::Issue;

/// The rule-configuration payload. Declared before any analysis request.
pub use kansa_core::linter::{LinterConfig as InitLinterRequest, RuleActivation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub file_path: String,
    pub file_content: String,
    pub file_type: FileType,
    #[serde(default)]
    pub ts_configs: Vec<String>,
}

/// The uniform result both adapters return: issues enriched with
/// absolute offsets, and the engine's AST payload, decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeAnalysis {
    pub issues: Vec<Issue>,
    pub ast: serde_json::Value,
}

/// A raw TypeScript-dialect response, exactly as it crosses the wire:
/// `ast` and `scopes` are JSON documents encoded as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsRawResponse {
    pub issues: Vec<Issue>,
    pub ast: String,
    pub scopes: String,
}

/// A decoded TypeScript-dialect response.
#[derive(Debug, Clone, PartialEq)]
pub struct TsResponse {
    pub issues: Vec<Issue>,
    pub ast: serde_json::Value,
    pub scopes: serde_json::Value,
}

impl TsRawResponse {
    /// Decodes the nested payloads into their native form.
    pub fn decode(self) -> Result<TsResponse, serde_json::Error> {
        Ok(TsResponse {
            issues: self.issues,
            ast: serde_json::from_str(&self.ast)?,
            scopes: serde_json::from_str(&self.scopes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_request_uses_wire_field_names() {
        let request = AnalysisRequest {
            file_path: "inline.js".to_string(),
            file_content: "var x = 1;".to_string(),
            file_type: FileType::Main,
            ts_configs: Vec::new(),
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["filePath"], "inline.js");
        assert_eq!(json["fileContent"], "var x = 1;");
        assert_eq!(json["fileType"], "MAIN");
        assert_eq!(json["tsConfigs"], serde_json::json!([]));
    }

    #[test]
    fn init_request_round_trips_through_the_wire_shape() {
        let json = r#"{
            "rules": [
                {"key": "no-extra-semi", "configurations": [], "fileTypeTarget": ["MAIN"]}
            ],
            "environments": ["browser"],
            "globals": []
        }"#;

        let request: InitLinterRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.rules[0].key, "no-extra-semi");
        assert_eq!(request.environments, vec!["browser"]);
    }

    #[test]
    fn ts_raw_response_decodes_nested_payloads() {
        let raw = TsRawResponse {
            issues: Vec::new(),
            ast: r#"{"type":"Module","body":[]}"#.to_string(),
            scopes: r#"[{"type":"module","bindings":["x"]}]"#.to_string(),
        };

        let decoded = raw.decode().unwrap();

        assert_eq!(decoded.ast["type"], "Module");
        assert_eq!(decoded.scopes[0]["bindings"][0], "x");
    }

    #[test]
    fn malformed_nested_payloads_are_decode_errors() {
        let raw = TsRawResponse {
            issues: Vec::new(),
            ast: "{not json".to_string(),
            scopes: "[]".to_string(),
        };

        assert!(raw.decode().is_err());
    }

    #[test]
    fn issues_survive_a_serialization_round_trip() {
        let issue = Issue {
            rule_id: "no-extra-semi".to_string(),
            line: 1,
            column: 11,
            end_line: 1,
            end_column: 12,
            message: "Unnecessary semicolon.".to_string(),
            start: Some(10),
            end: Some(11),
        };
        let analysis = BridgeAnalysis {
            issues: vec![issue.clone()],
            ast: serde_json::Value::Null,
        };

        let json = serde_json::to_string(&analysis).unwrap();
        let parsed: BridgeAnalysis = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.issues, vec![issue]);
    }
}
