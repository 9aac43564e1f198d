use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::cell::Row;
use crate::domain::rules::CancelToken;
use crate::ui::state::rule_form::RuleForm;
use crate::usecase::ports::sheet::ExportFormat;
use crate::usecase::services::dispatcher::LineageStats;

/// One line of the upload list: file name, sheet count, primary row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub name: String,
    pub sheets: usize,
    pub rows: usize,
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub uploads: Signal<Vec<UploadSummary>>,
    pub letters: Signal<Vec<(String, String)>>,
    pub all_columns: Signal<Vec<String>>,
    pub preview: Signal<Vec<Row>>,
    pub stats: Signal<LineageStats>,
    pub form: Signal<RuleForm>,
    pub progress: Signal<Option<u8>>,
    pub cancel: Signal<Option<CancelToken>>,
    pub export_format: Signal<ExportFormat>,
    pub date_columns: Signal<Vec<String>>,
    pub busy: Signal<bool>,
    pub status: Signal<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            uploads: use_signal(Vec::<UploadSummary>::new),
            letters: use_signal(Vec::<(String, String)>::new),
            all_columns: use_signal(Vec::<String>::new),
            preview: use_signal(Vec::<Row>::new),
            stats: use_signal(|| LineageStats {
                original_rows: 0,
                current_rows: None,
                history_depth: 0,
            }),
            form: use_signal(RuleForm::default),
            progress: use_signal(|| None::<u8>),
            cancel: use_signal(|| None::<CancelToken>),
            export_format: use_signal(|| ExportFormat::Xlsx),
            date_columns: use_signal(Vec::<String>::new),
            busy: use_signal(|| false),
            status: use_signal(|| "就緒".to_string()),
        }
    }
}
