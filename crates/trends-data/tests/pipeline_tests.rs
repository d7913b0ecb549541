//! End-to-end runs of the cleaning pipeline over a fabricated export folder.

use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use trends_data::core::models::{MissingPolicy, MonthLabel};
use trends_data::core::settings::PipelineConfig;
use trends_data::pipeline::{run_pipeline, MetricStatus};
use trends_data::reader::load_cleaned_table;
use trends_data::schema::Metric;
use trends_data::stats::{monthly_series, summarize_table, JoinKind, MonthJoin};

fn write_csv(dir: &Path, name: &str, lines: &[&str]) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
}

fn read(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).unwrap()
}

/// Every export except Steps, plus a Stress file that fails its schema.
fn seed_exports(data: &Path) {
    std::fs::create_dir_all(data).unwrap();
    write_csv(
        data,
        "Activities.csv",
        &["Col A,Col B", "Month,Activity Type", "Jan,Running", "Feb,Cycling"],
    );
    write_csv(
        data,
        "Average Heart Rate.csv",
        &["Date,Resting HR", "2024-01-03,60 bpm", "2024-01-20,64 bpm", "2024-02-02,58 bpm"],
    );
    write_csv(
        data,
        "Max Heart Rate.csv",
        &["Date,Max HR", "2024-01-03,171 bpm"],
    );
    write_csv(
        data,
        "Calories.csv",
        &[
            "Date,Active,Resting,Total",
            "Jan,\"1,200\",1800,\"3,000\"",
            "Jan,800,1800,2600",
            "Feb,500,1700,2200",
        ],
    );
    write_csv(
        data,
        "Floors Climbed.csv",
        &["Date,Up,Down", "Jan,10,8", "Jan,20,12", "Feb,5,5"],
    );
    write_csv(
        data,
        "Intensity Minutes.csv",
        &["Date,Actual,Goal", "2024-01-08,60,150", "2024-01-15,90,150", "2024-02-05,30,150"],
    );
    write_csv(
        data,
        "Sleep.csv",
        &[
            "Date,Avg Duration,Avg Bedtime,Avg Wake Time,Avg Score",
            "Jan,8h 0min,10:00 PM,6:00 AM,80",
            "Jan,garbled,11:00 PM,7:00 AM,70",
            "Feb,7h 30min,10:30 PM,6:00 AM,75",
        ],
    );
    write_csv(data, "Stress.csv", &["Date,Stress,Extra", "Jan,30,1"]);
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    let out = dir.path().join("cleaned");
    seed_exports(&data);

    let report = run_pipeline(&PipelineConfig::new(&data, &out, 2024)).unwrap();

    assert_eq!(report.written(), 7);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcome(Metric::Steps),
        Some(MetricStatus::Skipped { .. })
    ));
    assert!(matches!(
        report.outcome(Metric::Stress),
        Some(MetricStatus::Failed { reason }) if reason.contains("Schema mismatch")
    ));

    assert_eq!(
        read(&out, "Activities.csv"),
        "month,activity_type\nJanuary 2024,Running\nFebruary 2024,Cycling\n"
    );
    assert_eq!(
        read(&out, "Average Heart Rate.csv"),
        "date,heart_rate\nJanuary 2024,60\nJanuary 2024,64\nFebruary 2024,58\n"
    );
    assert_eq!(
        read(&out, "Calories.csv"),
        "date,active_calories,resting_calories,total_calories\n\
         January 2024,2000,3600,5600\n\
         February 2024,500,1700,2200\n"
    );
    assert_eq!(
        read(&out, "Floors Climbed.csv"),
        "date,climbed_floors,descended_floors\nJanuary 2024,30,20\nFebruary 2024,5,5\n"
    );
    assert_eq!(
        read(&out, "Intensity Minutes.csv"),
        "date,actual\nJanuary 2024,150\nFebruary 2024,30\n"
    );
    assert_eq!(
        read(&out, "Sleep.csv"),
        "date,avg_duration,avg_bedtime,avg_wake_time\n\
         January 2024,8h 0min,1350,390\n\
         February 2024,7h 30min,1350,360\n"
    );
    assert!(!out.join("Stress.csv").exists());
    assert!(!out.join("Steps.csv").exists());
}

#[test]
fn test_pipeline_fill_zero_and_metric_filter() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    let out = dir.path().join("cleaned");
    std::fs::create_dir_all(&data).unwrap();
    write_csv(
        &data,
        "Steps.csv",
        &["Date,Steps", "2024-03-01,\"10,000\"", "2024-04-01,--"],
    );
    write_csv(&data, "Stress.csv", &["Date,Stress", "Jan,30"]);

    let config = PipelineConfig::new(&data, &out, 2024)
        .with_missing_sums(MissingPolicy::FillZero)
        .with_metrics(vec!["steps".into()]);
    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(
        read(&out, "Steps.csv"),
        "date,steps\nMarch 2024,10000\nApril 2024,0\n"
    );
    assert!(!out.join("Stress.csv").exists());
}

#[test]
fn test_cleaned_tables_feed_statistics() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    let out = dir.path().join("cleaned");
    seed_exports(&data);
    run_pipeline(&PipelineConfig::new(&data, &out, 2024)).unwrap();

    let sleep = load_cleaned_table(&out.join(Metric::Sleep.file_name())).unwrap();
    let summary = summarize_table(&sleep);
    let duration = summary.iter().find(|s| s.column == "avg_duration").unwrap();
    assert_eq!(duration.count, 2);
    assert_eq!(duration.highest, MonthLabel::month(2024, 1).unwrap());
    assert_eq!(duration.lowest, MonthLabel::month(2024, 2).unwrap());

    let intensity = load_cleaned_table(&out.join(Metric::IntensityMinutes.file_name())).unwrap();
    let heart = load_cleaned_table(&out.join(Metric::AverageHeartRate.file_name())).unwrap();

    let joined = MonthJoin::new("actual", &monthly_series(&intensity, "actual").unwrap())
        .join(
            "avg_duration",
            &monthly_series(&sleep, "avg_duration").unwrap(),
            JoinKind::Inner,
        )
        .join(
            "heart_rate",
            &monthly_series(&heart, "heart_rate").unwrap(),
            JoinKind::Left,
        );

    assert_eq!(joined.len(), 2);
    let matrix = joined.correlation_matrix();
    assert_eq!(matrix.len(), 3);
    // Two months, both series strictly ordered the same way.
    assert!((matrix[0][1].unwrap() - 1.0).abs() < 1e-9);
}
