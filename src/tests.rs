use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::{outcome_message, table_container_style, table_header_cell_style};
use crate::domain::entities::cell::row_from;
use crate::domain::entities::rule::{CompareOp, FilterOp, MergeType, ProcessOp, SortOrder};
use crate::domain::entities::upload::UploadedFile;
use crate::infra::import::FileParser;
use crate::usecase::ports::engine::{BackgroundEngine, RunRequest};
use crate::usecase::ports::sheet::{ExportFormat, ExportOptions};
use crate::usecase::services::export_service::{ExportOutcome, ExportService};
use crate::usecase::services::import_service::ImportService;
use crate::*;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("rulexcel-{prefix}-{nanos}"))
}

fn numbered_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            row_from([
                ("編號", Cell::Number(i as f64)),
                ("類別", Cell::text(if i % 2 == 0 { "偶數" } else { "奇數" })),
            ])
        })
        .collect()
}

fn dispatcher_with(rows: Vec<Row>) -> RuleDispatcher {
    let dispatcher = RuleDispatcher::new(EngineConfig::default());
    dispatcher.add_upload(UploadedFile::single("data.csv", "data", rows));
    dispatcher
}

fn filter(letter: &str, op: FilterOp, value: &str, source: DataSource) -> RuleDescriptor {
    RuleDescriptor::new(
        Rule::Filter {
            col: letter.to_string(),
            op,
            value: value.to_string(),
        },
        source,
    )
}

fn apply(dispatcher: &RuleDispatcher, descriptor: &RuleDescriptor) -> Result<ApplyOutcome, RuleError> {
    dispatcher.apply_rule(descriptor, &CancelToken::new(), &mut |_, _| {})
}

fn applied_rows(outcome: ApplyOutcome) -> (Dataset, Route) {
    match outcome {
        ApplyOutcome::Applied { rows, route } => (rows, route),
        other => panic!("expected rows, got {other:?}"),
    }
}

struct FailingEngine;

impl BackgroundEngine for FailingEngine {
    fn run(
        &mut self,
        _request: RunRequest,
        _cancel: &CancelToken,
        _on_progress: &mut dyn FnMut(u8, Option<&[Row]>),
    ) -> Result<RunOutcome, RuleError> {
        Err(RuleError::Processing("worker exploded".to_string()))
    }

    fn shutdown(&mut self) {}
}

#[test]
fn undo_restores_the_previous_result_once() {
    let dispatcher = dispatcher_with(numbered_rows(10));

    let (first, _) = applied_rows(
        apply(&dispatcher, &filter("B", FilterOp::Eq, "偶數", DataSource::Original))
            .expect("first rule should apply"),
    );
    let (second, _) = applied_rows(
        apply(&dispatcher, &filter("A", FilterOp::Gt, "4", DataSource::Previous))
            .expect("second rule should apply"),
    );
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 2);

    let restored = dispatcher.undo().expect("undo should succeed");
    assert_eq!(restored, first);
    assert_eq!(dispatcher.current_rows(), Some(first));

    assert_eq!(dispatcher.undo(), Err(RuleError::NothingToUndo));
    assert_eq!(dispatcher.stats().history_depth, 1);
}

#[test]
fn rows_above_threshold_run_on_the_worker_with_identical_output() {
    let descriptor = RuleDescriptor::new(
        Rule::Sort {
            col: "A".to_string(),
            order: SortOrder::Desc,
        },
        DataSource::Original,
    );

    for (len, expected) in [(1999, Route::Sync), (2000, Route::Sync), (2001, Route::Worker)] {
        let rows = numbered_rows(len);
        let dispatcher = dispatcher_with(rows.clone());
        let (sorted, route) =
            applied_rows(apply(&dispatcher, &descriptor).expect("sort should apply"));

        assert_eq!(route, expected, "{len} rows");
        let mut reference = rows;
        reference.reverse();
        assert_eq!(sorted.as_slice(), reference.as_slice(), "{len} rows");
        dispatcher.shutdown_worker();
    }
}

#[test]
fn every_rule_kind_gives_the_same_rows_on_both_paths() {
    let cases = [
        (
            filter("C", FilterOp::Eq, "偶數", DataSource::Original),
            Rule::Filter {
                col: "類別".to_string(),
                op: FilterOp::Eq,
                value: "偶數".to_string(),
            },
        ),
        (
            RuleDescriptor::new(
                Rule::Process(ProcessOp::Add {
                    col: "B".to_string(),
                }),
                DataSource::Original,
            ),
            Rule::Process(ProcessOp::Add {
                col: "餘數".to_string(),
            }),
        ),
        (
            RuleDescriptor::new(
                Rule::Process(ProcessOp::Compare {
                    col1: "A".to_string(),
                    col2: "B".to_string(),
                    cmp: CompareOp::Lt,
                }),
                DataSource::Original,
            ),
            Rule::Process(ProcessOp::Compare {
                col1: "編號".to_string(),
                col2: "餘數".to_string(),
                cmp: CompareOp::Lt,
            }),
        ),
    ];

    for (len, expected_route) in [(1999, Route::Sync), (2001, Route::Worker)] {
        let rows: Vec<Row> = (0..len)
            .map(|i| {
                row_from([
                    ("編號", Cell::Number((i % 10) as f64)),
                    ("餘數", Cell::Number((i * 7 % 13) as f64)),
                    ("類別", Cell::text(if i % 2 == 0 { "偶數" } else { "奇數" })),
                ])
            })
            .collect();
        let dispatcher = dispatcher_with(rows.clone());

        for (descriptor, resolved) in &cases {
            let outcome = apply(&dispatcher, descriptor).expect("rule should apply");
            let (result, route) = applied_rows(outcome);
            let reference = domain::rules::apply(resolved, &rows, &[]);

            assert_eq!(route, expected_route, "{} over {len} rows", resolved.kind());
            assert_eq!(result.as_slice(), reference.as_slice(), "{} over {len} rows", resolved.kind());
        }
        dispatcher.shutdown_worker();
    }
}

#[test]
fn previous_source_without_result_is_rejected() {
    let dispatcher = dispatcher_with(numbered_rows(3));
    assert_eq!(
        apply(&dispatcher, &filter("A", FilterOp::NotEmpty, "", DataSource::Previous)),
        Err(RuleError::NoPreviousResult)
    );

    let empty = RuleDispatcher::new(EngineConfig::default());
    assert_eq!(
        apply(&empty, &filter("A", FilterOp::NotEmpty, "", DataSource::Original)),
        Err(RuleError::NoData)
    );
}

#[test]
fn second_rule_during_a_run_is_busy() {
    let dispatcher = dispatcher_with(numbered_rows(50));
    let descriptor = filter("B", FilterOp::Contains, "數", DataSource::Original);
    let mut nested = None;

    let outcome = dispatcher
        .apply_rule(&descriptor, &CancelToken::new(), &mut |_, _| {
            if nested.is_none() {
                nested = Some(apply(&dispatcher, &descriptor));
            }
        })
        .expect("outer rule should apply");

    assert_eq!(nested, Some(Err(RuleError::Busy)));
    assert!(matches!(outcome, ApplyOutcome::Applied { ref rows, .. } if rows.len() == 50));
    assert!(!dispatcher.is_busy());
}

#[test]
fn merge_replaces_uploads_and_records_the_result() {
    let dispatcher = RuleDispatcher::new(EngineConfig::default());
    dispatcher.add_upload(UploadedFile::single("a.csv", "a", numbered_rows(3)));
    dispatcher.add_upload(UploadedFile::single("b.csv", "b", numbered_rows(4)));

    let descriptor = RuleDescriptor::new(
        Rule::Merge {
            merge_type: MergeType::Files,
        },
        DataSource::Previous,
    );
    let (merged, _) = applied_rows(apply(&dispatcher, &descriptor).expect("merge should apply"));

    assert_eq!(merged.len(), 7);
    let uploads = dispatcher.uploads();
    assert_eq!(uploads.files().len(), 1);
    assert_eq!(uploads.files()[0].name, "merged");
    assert_eq!(dispatcher.original_rows(), merged);
    assert_eq!(dispatcher.stats().history_depth, 1);
}

#[test]
fn empty_result_is_reported_and_kept() {
    let dispatcher = dispatcher_with(numbered_rows(6));
    let outcome = apply(&dispatcher, &filter("B", FilterOp::Eq, "質數", DataSource::Original))
        .expect("filter should run");

    assert_eq!(outcome, ApplyOutcome::ZeroMatches { route: Route::Sync });
    assert_eq!(dispatcher.current_rows().map(|rows| rows.len()), Some(0));
    assert_eq!(
        apply(&dispatcher, &filter("A", FilterOp::NotEmpty, "", DataSource::Previous)),
        Err(RuleError::NoPreviousResult)
    );
}

#[test]
fn cancelled_run_leaves_lineage_untouched() {
    let dispatcher = dispatcher_with(numbered_rows(20));
    let token = CancelToken::new();
    token.cancel();

    let outcome = dispatcher
        .apply_rule(
            &filter("B", FilterOp::Eq, "奇數", DataSource::Original),
            &token,
            &mut |_, _| {},
        )
        .expect("cancel is not an error");

    assert_eq!(outcome, ApplyOutcome::Cancelled);
    assert_eq!(dispatcher.current_rows(), None);
    assert_eq!(dispatcher.stats().history_depth, 0);
}

#[test]
fn engine_failure_is_a_processing_error() {
    let config = EngineConfig {
        route_threshold: 0,
        ..EngineConfig::default()
    };
    let dispatcher = RuleDispatcher::with_engine(config, Box::new(FailingEngine));
    dispatcher.add_upload(UploadedFile::single("data.csv", "data", numbered_rows(5)));

    let err = apply(&dispatcher, &filter("A", FilterOp::Gt, "1", DataSource::Original))
        .expect_err("engine failure should surface");

    assert_eq!(err, RuleError::Processing("worker exploded".to_string()));
    assert_eq!(dispatcher.current_rows(), None);
    assert!(!dispatcher.is_busy());
}

#[test]
fn filter_applied_twice_changes_nothing() {
    let dispatcher = dispatcher_with(numbered_rows(30));
    let descriptor = filter("B", FilterOp::Eq, "奇數", DataSource::Original);
    let (once, _) = applied_rows(apply(&dispatcher, &descriptor).expect("filter should apply"));

    let again = filter("B", FilterOp::Eq, "奇數", DataSource::Previous);
    let (twice, _) = applied_rows(apply(&dispatcher, &again).expect("filter should apply"));

    assert_eq!(once, twice);
}

#[test]
fn progress_is_monotonic_and_only_the_full_result_reports_done() {
    let config = EngineConfig {
        batch_size: 100,
        ..EngineConfig::default()
    };
    let dispatcher = RuleDispatcher::new(config);
    dispatcher.add_upload(UploadedFile::single("data.csv", "data", numbered_rows(201)));

    let descriptor = RuleDescriptor::new(
        Rule::Process(ProcessOp::Add {
            col: "A".to_string(),
        }),
        DataSource::Original,
    );
    let mut percents = Vec::new();
    let mut done_lengths = Vec::new();
    dispatcher
        .apply_rule(&descriptor, &CancelToken::new(), &mut |percent, rows| {
            percents.push(percent);
            if percent == 100 {
                done_lengths.push(rows.map(<[Row]>::len));
            }
        })
        .expect("add should apply");

    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]), "{percents:?}");
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(done_lengths, vec![Some(202)], "{percents:?}");
}

#[test]
fn reset_and_clear_return_to_earlier_states() {
    let dispatcher = dispatcher_with(numbered_rows(4));
    apply(&dispatcher, &filter("B", FilterOp::Eq, "偶數", DataSource::Original))
        .expect("filter should apply");

    dispatcher.reset_to_original().expect("reset should succeed");
    assert_eq!(dispatcher.current_rows(), None);
    assert_eq!(dispatcher.display_rows().len(), 4);

    dispatcher.clear_uploads().expect("clear should succeed");
    assert_eq!(
        dispatcher.column_letters(DataSource::Original),
        Err(RuleError::NoData)
    );
}

#[test]
fn imported_csv_is_filtered_and_exported_as_workbook() {
    let temp_dir = unique_test_dir("import-export");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("訂單.csv");
    fs::write(
        &csv_path,
        "日期,客戶,金額\n2024-01-05,台北,120\n2024-02-10,高雄,80\n2024-03-15,台北,45\n",
    )
    .expect("should write csv");

    let dispatcher = RuleDispatcher::new(EngineConfig::default());
    let importer = ImportService::new(FileParser::new(dispatcher.config()));
    let file = importer.import_path(&csv_path).expect("csv should import");
    dispatcher.add_upload(file);

    let letters = dispatcher
        .column_letters(DataSource::Original)
        .expect("letters should be available");
    assert_eq!(letters[1], ("B".to_string(), "客戶".to_string()));

    let (rows, _) = applied_rows(
        apply(&dispatcher, &filter("B", FilterOp::Eq, "台北", DataSource::Original))
            .expect("filter should apply"),
    );
    assert_eq!(rows.len(), 2);

    let options = ExportOptions {
        date_columns: vec!["日期".to_string()],
        ..ExportOptions::default()
    };
    let xlsx_path = temp_dir.join("result.xlsx");
    let outcome = ExportService
        .export_comparison(
            &dispatcher.original_rows(),
            &rows,
            &options,
            Some(xlsx_path.as_path()),
        )
        .expect("comparison should export");
    assert_eq!(outcome, ExportOutcome::Saved(xlsx_path.clone()));

    let workbook = importer.import_path(&xlsx_path).expect("workbook should import");
    let sheet_lengths: Vec<usize> = workbook.sheets.iter().map(|sheet| sheet.rows.len()).collect();
    assert_eq!(sheet_lengths, vec![3, 2]);
    assert_eq!(
        workbook.sheets[1].rows[0].get("日期"),
        Some(&Cell::text("2024-01-05"))
    );

    let csv_out = temp_dir.join("result.csv");
    ExportService
        .export_rows(&rows, ExportFormat::Csv, &options, Some(csv_out.as_path()))
        .expect("csv should export");
    let written = fs::read_to_string(&csv_out).expect("should read exported csv");
    assert!(written.contains("'2024-03-15,台北,45"), "{written}");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn dismissed_save_dialog_writes_nothing() {
    let rows = numbered_rows(2);
    let outcome = ExportService
        .export_rows(&rows, ExportFormat::Xlsx, &ExportOptions::default(), None)
        .expect("cancel is not an error");
    assert_eq!(outcome, ExportOutcome::Cancelled);
}

#[test]
fn outcome_messages_name_the_route() {
    let rows: Dataset = Arc::new(numbered_rows(3));
    assert!(outcome_message(&ApplyOutcome::Applied {
        rows,
        route: Route::Worker
    })
    .contains("3 筆"));
    assert!(outcome_message(&ApplyOutcome::ZeroMatches { route: Route::Sync })
        .contains("沒有符合條件"));
}

#[test]
fn table_container_style_allows_scroll() {
    assert!(table_container_style().contains("overflow: auto"));
}

#[test]
fn header_cells_stick_to_the_top() {
    let style = table_header_cell_style();
    assert!(style.contains("position: sticky"));
    assert!(style.contains("top: 0"));
}
