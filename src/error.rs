use thiserror::Error;

/// Failures of a rule application. A cancelled run is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("invalid rule: {0}")]
    Validation(String),
    #[error("no data has been uploaded")]
    NoData,
    #[error("no previous result is available")]
    NoPreviousResult,
    #[error("no uploaded files to merge")]
    NoUploads,
    #[error("rule processing failed: {0}")]
    Processing(String),
    #[error("another rule is still running")]
    Busy,
    #[error("nothing to undo")]
    NothingToUndo,
}

impl RuleError {
    /// Message shown in the status bar.
    pub fn user_message(&self) -> String {
        match self {
            RuleError::Validation(reason) => format!("規則設定有誤：{reason}"),
            RuleError::NoData => "請先上傳資料檔".to_string(),
            RuleError::NoPreviousResult => "目前沒有上一步結果可用，請改用原始資料".to_string(),
            RuleError::NoUploads => "沒有可合併的已上傳檔案".to_string(),
            RuleError::Processing(reason) => format!("規則執行失敗：{reason}"),
            RuleError::Busy => "上一個規則仍在執行中".to_string(),
            RuleError::NothingToUndo => "沒有可復原的步驟".to_string(),
        }
    }
}
