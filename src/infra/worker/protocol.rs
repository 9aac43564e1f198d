use serde::{Deserialize, Serialize};

use crate::domain::entities::cell::{Dataset, Row};
use crate::domain::entities::rule::Rule;

/// Messages sent to the rule worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerInbound {
    Run {
        /// Rule with column names already resolved.
        #[serde(rename = "ruleConfig")]
        rule_config: Rule,
        data: Dataset,
        #[serde(rename = "batchSize", default, skip_serializing_if = "Option::is_none")]
        batch_size: Option<usize>,
        /// Merge sources; empty for every other rule.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        files: Vec<Dataset>,
    },
    /// Abandon the current run at the next batch boundary.
    Stop,
    Shutdown,
}

/// Messages the rule worker sends back. Every run ends with exactly one of
/// `Result`, `Error` or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerOutbound {
    Progress {
        percent: u8,
        #[serde(rename = "partialResult", default, skip_serializing_if = "Option::is_none")]
        partial_result: Option<Vec<Row>>,
    },
    Result {
        data: Vec<Row>,
    },
    Error {
        message: String,
    },
    Cancelled,
}

impl WorkerOutbound {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerOutbound::Progress { .. })
    }
}
