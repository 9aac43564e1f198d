use std::sync::mpsc;
use std::sync::Arc;

use dioxus::prelude::*;
use rfd::FileDialog;

use crate::config::{load_config, EngineConfig};
use crate::domain::entities::rule::{CompareOp, DataSource, FilterOp, MergeType, SortOrder};
use crate::domain::rules::CancelToken;
use crate::infra::export::default_filename;
use crate::infra::import::FileParser;
use crate::infra::worker::columns::discover_columns;
use crate::platform::desktop::blocking::{run_blocking, spawn_blocking, wait_for};
use crate::platform::desktop::dirs::default_config_path;
use crate::ui::state::app_state::{AppState, UploadSummary};
use crate::ui::state::rule_form::{filter_op_label, RuleKind};
use crate::usecase::ports::sheet::{ExportFormat, ExportOptions};
use crate::usecase::services::dispatcher::{ApplyOutcome, Route, RuleDispatcher};
use crate::usecase::services::export_service::{ExportOutcome, ExportService};
use crate::usecase::services::import_service::ImportService;

const FILTER_OPS: [FilterOp; 8] = [
    FilterOp::Eq,
    FilterOp::Neq,
    FilterOp::Gt,
    FilterOp::Lt,
    FilterOp::Contains,
    FilterOp::NotContains,
    FilterOp::Empty,
    FilterOp::NotEmpty,
];

pub fn table_container_style() -> &'static str {
    "flex: 1; min-height: 0; overflow: auto; border: 1px solid #ddd;"
}

pub fn table_header_cell_style() -> &'static str {
    "border: 1px solid #bbb; padding: 4px 8px; background: #f3f3f3; position: sticky; top: 0; white-space: nowrap;"
}

pub fn route_label(route: Route) -> &'static str {
    match route {
        Route::Sync => "直接執行",
        Route::Worker => "背景執行",
    }
}

pub fn outcome_message(outcome: &ApplyOutcome) -> String {
    match outcome {
        ApplyOutcome::Applied { rows, route } => {
            format!("規則已套用，共 {} 筆（{}）", rows.len(), route_label(*route))
        }
        ApplyOutcome::ZeroMatches { route } => {
            format!("沒有符合條件的資料（{}）", route_label(*route))
        }
        ApplyOutcome::Cancelled => "已取消，資料維持不變".to_string(),
    }
}

fn load_engine_config() -> (EngineConfig, Option<String>) {
    match default_config_path().and_then(|path| load_config(&path)) {
        Ok(config) => (config, None),
        Err(err) => {
            log::warn!("falling back to default config: {err:#}");
            (EngineConfig::default(), Some(format!("設定檔讀取失敗，使用預設值：{err:#}")))
        }
    }
}

/// Pulls everything the window shows out of the dispatcher.
fn refresh_view(dispatcher: &RuleDispatcher, state: AppState) {
    let AppState {
        mut uploads,
        mut letters,
        mut all_columns,
        mut preview,
        mut stats,
        mut date_columns,
        form,
        ..
    } = state;

    uploads.set(
        dispatcher
            .uploads()
            .files()
            .iter()
            .map(|file| UploadSummary {
                name: file.name.clone(),
                sheets: file.sheets.len(),
                rows: file.row_count(),
            })
            .collect(),
    );

    let source = form.read().data_source;
    letters.set(dispatcher.column_letters(source).unwrap_or_default());

    let rows = dispatcher.display_rows();
    let preview_len = rows.len().min(dispatcher.config().preview_rows);
    preview.set(rows[..preview_len].to_vec());
    stats.set(dispatcher.stats());

    let known: Vec<String> = letters.read().iter().map(|(_, column)| column.clone()).collect();
    date_columns.write().retain(|column| known.contains(column));

    match discover_columns(rows) {
        Ok(rx) => {
            spawn(async move {
                if let Some(columns) = wait_for(rx, || {}).await {
                    all_columns.set(columns);
                }
            });
        }
        Err(err) => log::warn!("column discovery unavailable: {err:#}"),
    }
}

#[component]
pub fn App() -> Element {
    let (dispatcher, startup_warning) = use_hook(|| {
        let (config, warning) = load_engine_config();
        (Arc::new(RuleDispatcher::new(config)), warning)
    });

    let state = AppState::new();
    let AppState {
        uploads,
        mut letters,
        all_columns,
        preview,
        stats,
        mut form,
        progress,
        cancel,
        mut export_format,
        mut date_columns,
        mut busy,
        mut status,
    } = state;

    use_effect(move || {
        if let Some(warning) = startup_warning.clone() {
            status.set(warning);
        }
    });

    let dispatcher_for_upload = dispatcher.clone();
    let dispatcher_for_clear = dispatcher.clone();
    let dispatcher_for_source = dispatcher.clone();
    let dispatcher_for_apply = dispatcher.clone();
    let dispatcher_for_undo = dispatcher.clone();
    let dispatcher_for_reset = dispatcher.clone();
    let dispatcher_for_export = dispatcher.clone();
    let dispatcher_for_compare = dispatcher.clone();

    let on_upload = move |_: MouseEvent| {
        let Some(paths) = FileDialog::new()
            .add_filter("Excel", &["xlsx", "xls"])
            .add_filter("CSV", &["csv"])
            .add_filter("所有檔案", &["*"])
            .pick_files()
        else {
            return;
        };
        busy.set(true);
        status.set(format!("正在匯入 {} 個檔案", paths.len()));
        let dispatcher = dispatcher_for_upload.clone();
        spawn(async move {
            let importer = ImportService::new(FileParser::new(dispatcher.config()));
            let results = run_blocking(move || {
                paths
                    .iter()
                    .map(|path| importer.import_path(path))
                    .collect::<Vec<_>>()
            })
            .await
            .unwrap_or_default();

            let mut imported = 0;
            let mut failures = Vec::new();
            for result in results {
                match result {
                    Ok(file) => {
                        dispatcher.add_upload(file);
                        imported += 1;
                    }
                    Err(err) => {
                        log::warn!("import failed: {err:#}");
                        failures.push(format!("{err:#}"));
                    }
                }
            }
            status.set(if failures.is_empty() {
                format!("已匯入 {imported} 個檔案")
            } else {
                format!("已匯入 {imported} 個檔案，失敗：{}", failures.join("；"))
            });
            refresh_view(&dispatcher, state);
            busy.set(false);
        });
    };

    let on_apply = move |_: MouseEvent| {
        let letter_keys: Vec<String> = letters.read().iter().map(|(letter, _)| letter.clone()).collect();
        let descriptor = match form.read().build(&letter_keys) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                status.set(err.user_message());
                return;
            }
        };

        let token = CancelToken::new();
        let mut cancel = cancel;
        let mut progress = progress;
        cancel.set(Some(token.clone()));
        progress.set(Some(0));
        busy.set(true);
        status.set("規則執行中…".to_string());

        let dispatcher = dispatcher_for_apply.clone();
        spawn(async move {
            let (progress_tx, progress_rx) = mpsc::channel::<u8>();
            let runner = dispatcher.clone();
            let rx = spawn_blocking(move || {
                runner.apply_rule(&descriptor, &token, &mut |percent, _| {
                    let _ = progress_tx.send(percent);
                })
            });
            let result = wait_for(rx, || {
                while let Ok(percent) = progress_rx.try_recv() {
                    progress.set(Some(percent));
                }
            })
            .await;

            match result {
                Some(Ok(outcome)) => status.set(outcome_message(&outcome)),
                Some(Err(err)) => status.set(err.user_message()),
                None => status.set("規則執行中斷".to_string()),
            }
            cancel.set(None);
            progress.set(None);
            refresh_view(&dispatcher, state);
            busy.set(false);
        });
    };

    let on_export = move |_: MouseEvent| {
        let format = export_format();
        let options = ExportOptions {
            date_columns: date_columns(),
            ..ExportOptions::default()
        };
        let service = ExportService;
        let suggested = service.suggested_filename(format, &options);
        let target = FileDialog::new()
            .set_file_name(suggested.as_str())
            .add_filter(format.extension(), &[format.extension()])
            .save_file();
        let rows = dispatcher_for_export.display_rows();
        match service.export_rows(&rows, format, &options, target.as_deref()) {
            Ok(ExportOutcome::Saved(path)) => status.set(format!("已匯出：{}", path.display())),
            Ok(ExportOutcome::Cancelled) => status.set("已取消匯出".to_string()),
            Err(err) => status.set(format!("匯出失敗：{err:#}")),
        }
    };

    let on_export_comparison = move |_: MouseEvent| {
        let Some(processed) = dispatcher_for_compare.current_rows() else {
            status.set("尚未套用任何規則".to_string());
            return;
        };
        let original = dispatcher_for_compare.original_rows();
        let options = ExportOptions {
            date_columns: date_columns(),
            ..ExportOptions::default()
        };
        let target = FileDialog::new()
            .set_file_name(default_filename("資料對比", ExportFormat::Xlsx).as_str())
            .add_filter("Excel", &["xlsx"])
            .save_file();
        match ExportService.export_comparison(&original, &processed, &options, target.as_deref()) {
            Ok(ExportOutcome::Saved(path)) => status.set(format!("已匯出對比：{}", path.display())),
            Ok(ExportOutcome::Cancelled) => status.set("已取消匯出".to_string()),
            Err(err) => status.set(format!("匯出失敗：{err:#}")),
        }
    };

    let current_form = form();
    let current_letters = letters();
    let current_stats = stats();
    let preview_rows = preview();
    let preview_headers: Vec<String> = preview_rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    let needs_column = !matches!(current_form.kind, RuleKind::Merge);
    let column_summary = all_columns().join(", ");

    rsx! {
        div {
            style: "font-family: 'Noto Sans TC', sans-serif; padding: 12px; background: #fff; height: 100vh; display: flex; flex-direction: column; gap: 8px; box-sizing: border-box;",

            h2 { {crate::APP_TITLE} }

            div {
                style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap;",
                button { disabled: busy(), onclick: on_upload, "上傳檔案" }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        match dispatcher_for_clear.clear_uploads() {
                            Ok(()) => status.set("已清除所有上傳".to_string()),
                            Err(err) => status.set(err.user_message()),
                        }
                        refresh_view(&dispatcher_for_clear, state);
                    },
                    "清除上傳"
                }
                for upload in uploads() {
                    span { style: "padding: 2px 6px; background: #eef4ff; border-radius: 4px;",
                        "{upload.name}（{upload.sheets} 個工作表，{upload.rows} 筆）"
                    }
                }
            }

            div {
                style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; padding: 8px; border: 1px solid #ddd; border-radius: 6px;",
                label { "規則" }
                select {
                    disabled: busy(),
                    onchange: move |event| {
                        if let Some(kind) = RuleKind::from_key(&event.value()) {
                            form.write().kind = kind;
                        }
                    },
                    for kind in RuleKind::ALL {
                        option { value: kind.key(), selected: kind == current_form.kind, "{kind.label()}" }
                    }
                }

                label { "資料來源" }
                select {
                    disabled: busy(),
                    onchange: move |event| {
                        let Ok(source) = event.value().parse::<DataSource>() else {
                            return;
                        };
                        form.write().data_source = source;
                        match dispatcher_for_source.column_letters(source) {
                            Ok(next) => letters.set(next),
                            Err(err) => {
                                letters.set(Vec::new());
                                status.set(err.user_message());
                            }
                        }
                    },
                    option { value: "original", selected: current_form.data_source == DataSource::Original, "原始資料" }
                    option { value: "previous", selected: current_form.data_source == DataSource::Previous, "上一步結果" }
                }

                if needs_column {
                    label { "欄位" }
                    select {
                        disabled: busy(),
                        onchange: move |event| form.write().col = event.value(),
                        option { value: "", "(未選擇)" }
                        for (letter, column) in current_letters.clone() {
                            option { value: "{letter}", selected: letter == current_form.col, "{letter}：{column}" }
                        }
                    }
                }

                if current_form.kind == RuleKind::Filter {
                    select {
                        disabled: busy(),
                        onchange: move |event| {
                            if let Ok(op) = event.value().parse::<FilterOp>() {
                                form.write().filter_op = op;
                            }
                        },
                        for op in FILTER_OPS {
                            option { value: "{op}", selected: op == current_form.filter_op, "{filter_op_label(op)}" }
                        }
                    }
                    input {
                        disabled: busy(),
                        value: "{current_form.value}",
                        placeholder: "比較值",
                        oninput: move |event| form.write().value = event.value(),
                    }
                }

                if current_form.kind == RuleKind::Sort {
                    select {
                        disabled: busy(),
                        onchange: move |event| {
                            if let Ok(order) = event.value().parse::<SortOrder>() {
                                form.write().order = order;
                            }
                        },
                        option { value: "asc", selected: current_form.order == SortOrder::Asc, "遞增" }
                        option { value: "desc", selected: current_form.order == SortOrder::Desc, "遞減" }
                    }
                }

                if current_form.kind == RuleKind::Compare {
                    select {
                        disabled: busy(),
                        onchange: move |event| {
                            if let Ok(cmp) = event.value().parse::<CompareOp>() {
                                form.write().cmp = cmp;
                            }
                        },
                        option { value: "gt", selected: current_form.cmp == CompareOp::Gt, "大於" }
                        option { value: "eq", selected: current_form.cmp == CompareOp::Eq, "等於" }
                        option { value: "lt", selected: current_form.cmp == CompareOp::Lt, "小於" }
                    }
                    label { "比對欄位" }
                    select {
                        disabled: busy(),
                        onchange: move |event| form.write().col2 = event.value(),
                        option { value: "", "(未選擇)" }
                        for (letter, column) in current_letters.clone() {
                            option { value: "{letter}", selected: letter == current_form.col2, "{letter}：{column}" }
                        }
                    }
                }

                if current_form.kind == RuleKind::Merge {
                    select {
                        disabled: busy(),
                        onchange: move |event| {
                            if let Ok(merge_type) = event.value().parse::<MergeType>() {
                                form.write().merge_type = merge_type;
                            }
                        },
                        option { value: "files", selected: current_form.merge_type == MergeType::Files, "合併多個檔案" }
                        option { value: "sheets", selected: current_form.merge_type == MergeType::Sheets, "合併工作表" }
                    }
                }

                button { disabled: busy(), onclick: on_apply, "套用規則" }
                if let Some(percent) = progress() {
                    progress { max: "100", value: "{percent}" }
                    span { "{percent}%" }
                    button {
                        onclick: move |_| {
                            if let Some(token) = cancel.read().as_ref() {
                                token.cancel();
                            }
                        },
                        "取消"
                    }
                }
            }

            div {
                style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap;",
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        match dispatcher_for_undo.undo() {
                            Ok(rows) => status.set(format!("已復原，目前 {} 筆", rows.len())),
                            Err(err) => status.set(err.user_message()),
                        }
                        refresh_view(&dispatcher_for_undo, state);
                    },
                    "復原"
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        match dispatcher_for_reset.reset_to_original() {
                            Ok(()) => status.set("已回到原始資料".to_string()),
                            Err(err) => status.set(err.user_message()),
                        }
                        refresh_view(&dispatcher_for_reset, state);
                    },
                    "回到原始資料"
                }

                label { "匯出格式" }
                select {
                    disabled: busy(),
                    onchange: move |event| {
                        if let Ok(format) = event.value().parse::<ExportFormat>() {
                            export_format.set(format);
                        }
                    },
                    option { value: "xlsx", selected: export_format() == ExportFormat::Xlsx, "Excel (.xlsx)" }
                    option { value: "csv", selected: export_format() == ExportFormat::Csv, "CSV (.csv)" }
                }
                button { disabled: busy(), onclick: on_export, "匯出結果" }
                button { disabled: busy(), onclick: on_export_comparison, "匯出對比" }
            }

            if !current_letters.is_empty() {
                div {
                    style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap; font-size: 13px;",
                    span { "日期欄位（匯出時保留原樣）：" }
                    for (_, column) in current_letters.clone() {
                        label {
                            input {
                                r#type: "checkbox",
                                checked: date_columns.read().contains(&column),
                                onchange: {
                                    let column = column.clone();
                                    move |_| {
                                        let mut selected = date_columns.write();
                                        if let Some(pos) = selected.iter().position(|c| c == &column) {
                                            selected.remove(pos);
                                        } else {
                                            selected.push(column.clone());
                                        }
                                    }
                                },
                            }
                            "{column}"
                        }
                    }
                }
            }

            div {
                style: "font-size: 13px; color: #555;",
                "原始 {current_stats.original_rows} 筆"
                if let Some(current) = current_stats.current_rows {
                    "，目前 {current} 筆"
                }
                "，步驟 {current_stats.history_depth}"
                if !column_summary.is_empty() {
                    "，欄位：{column_summary}"
                }
            }

            div {
                style: "{table_container_style()}",
                table { style: "border-collapse: collapse; width: 100%; background: #fff;",
                    thead {
                        tr {
                            for header in preview_headers.iter() {
                                th { style: "{table_header_cell_style()}", "{header}" }
                            }
                        }
                    }
                    tbody {
                        for row in preview_rows.iter() {
                            tr {
                                for header in preview_headers.iter() {
                                    td { style: "border: 1px solid #ddd; padding: 4px 8px;",
                                        {row.get(header).map(|cell| cell.as_display().into_owned()).unwrap_or_default()}
                                    }
                                }
                            }
                        }
                    }
                }
            }

            div { style: "padding: 4px 0; color: #333;", "{status}" }
        }
    }
}
