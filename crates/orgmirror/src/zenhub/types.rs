//! ZenHub REST payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZhPipeline {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZhEstimate {
    pub value: i64,
}

/// Response of `GET /p1/repositories/{repo_id}/issues/{issue_number}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZhIssueData {
    #[serde(default)]
    pub pipeline: ZhPipeline,
    #[serde(default)]
    pub estimate: Option<ZhEstimate>,
    #[serde(default)]
    pub is_epic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_issue_data_ignoring_unknown_fields() {
        let data: ZhIssueData = serde_json::from_value(serde_json::json!({
            "plus_ones": [],
            "pipeline": {"name": "In Progress", "pipeline_id": "5a1b", "workspace_id": "9f"},
            "pipelines": [],
            "estimate": {"value": 3},
            "is_epic": false
        }))
        .unwrap();

        assert_eq!(data.pipeline.name, "In Progress");
        assert_eq!(data.estimate, Some(ZhEstimate { value: 3 }));
        assert!(!data.is_epic);
    }

    #[test]
    fn missing_pipeline_decodes_to_empty_name() {
        let data: ZhIssueData = serde_json::from_str("{}").unwrap();
        assert!(data.pipeline.name.is_empty());
    }
}
