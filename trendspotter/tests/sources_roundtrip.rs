//! File-to-report tests: register a data file, run the panel, check the
//! verdict.

use std::io::Write;

use datafusion::prelude::SessionContext;

use trendspotter::config::DetectionConfig;
use trendspotter::runner::DetectionRunner;
use trendspotter::sources::register_path;

#[tokio::test]
async fn test_csv_file_end_to_end() {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    writeln!(file, "amount,volume").unwrap();
    for i in 0..11 {
        writeln!(file, "{:.1},{:.1}", 10.0 + i as f64 * 0.1, 5.0 + i as f64 * 0.2).unwrap();
    }
    // One row that is wildly out of range in both columns.
    writeln!(file, "1000.0,-800.0").unwrap();
    file.flush().unwrap();

    let ctx = SessionContext::new();
    register_path(&ctx, "data", &file.path().to_string_lossy())
        .await
        .unwrap();

    let runner = DetectionRunner::builder()
        .config(DetectionConfig::default().with_seed(3))
        .build();
    let report = runner.run(&ctx).await.unwrap();

    assert_eq!(report.row_count, 12);
    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);

    let expected: Vec<bool> = (0..12).map(|i| i == 11).collect();
    assert_eq!(report.anomaly_any, expected);
    assert!(report.votes[11] >= 2);
    assert!(report.flags("outlier_zscore").unwrap()[11]);
    assert!(report.flags("outlier_iqr").unwrap()[11]);
}

#[tokio::test]
async fn test_ndjson_file_end_to_end() {
    let mut file = tempfile::Builder::new()
        .suffix(".ndjson")
        .tempfile()
        .unwrap();
    for i in 0..6 {
        writeln!(
            file,
            r#"{{"x": {}, "y": {}, "label": "row-{}"}}"#,
            1.0 + i as f64,
            (i as f64 * 1.7) % 5.0,
            i
        )
        .unwrap();
    }
    file.flush().unwrap();

    let ctx = SessionContext::new();
    register_path(&ctx, "events", &file.path().to_string_lossy())
        .await
        .unwrap();

    let runner = DetectionRunner::builder().table("events").build();
    let report = runner.run(&ctx).await.unwrap();

    // The string column is ignored; both numeric columns feed the panel.
    assert_eq!(report.table, "events");
    assert_eq!(report.row_count, 6);
    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
    assert_eq!(report.detectors.len(), 5);
    for detector in &report.detectors {
        assert_eq!(detector.flags.len(), 6);
    }
}
