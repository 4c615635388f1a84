//! Header rule records, shaped like the host's dynamic rule JSON

use serde::{Deserialize, Serialize};

use sandtab_session::ContextId;

use crate::Result;

pub const COOKIE_HEADER: &str = "Cookie";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRule {
    pub id: ContextId,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub request_headers: Vec<HeaderModification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    ModifyHeaders,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderModification {
    pub header: String,
    pub operation: HeaderOperation,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderOperation {
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
}

impl HeaderRule {
    /// Set `Cookie` to `value` on every main-document request of `context`
    pub fn cookie(context: ContextId, priority: u32, value: String) -> Self {
        Self {
            id: context,
            priority,
            action: RuleAction {
                kind: ActionType::ModifyHeaders,
                request_headers: vec![HeaderModification {
                    header: COOKIE_HEADER.to_string(),
                    operation: HeaderOperation::Set,
                    value,
                }],
            },
            condition: RuleCondition {
                url_filter: "*".to_string(),
                resource_types: vec![ResourceType::MainFrame],
            },
        }
    }

    /// Value set for the `Cookie` header, if this rule sets one
    pub fn cookie_value(&self) -> Option<&str> {
        self.action
            .request_headers
            .iter()
            .find(|h| h.header.eq_ignore_ascii_case(COOKIE_HEADER))
            .map(|h| h.value.as_str())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
