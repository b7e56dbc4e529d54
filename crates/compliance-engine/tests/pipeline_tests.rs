//! End-to-end audit runs over files on disk

mod common;

use common::{bundled_regulations, regulations_dir, write_file, ABC_AGENCY, CPCB_PM25_ONLY};
use compliance_engine::{
    load_dataset, Aggregator, AuditPipeline, AuditRequest, ComplianceClassifier,
    DisabledNarrator, ExplainabilityInspector, ExplainabilityReportFile, FeatureValidator,
    PerformanceEvaluator, PerformanceReportFile, RegulationCache, RegulationStore, StageReports,
    TemplateNarrator,
};
use pretty_assertions::assert_eq;
use shared_types::{Grade, ReportStatus};
use std::collections::{BTreeMap, BTreeSet};

fn names(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

#[test]
fn category_scenario_from_csv() {
    let regs = regulations_dir(&[("cpcb_standards.json", CPCB_PM25_ONLY)]);
    let store = RegulationStore::load(regs.path());
    let data = tempfile::tempdir().unwrap();
    let csv = write_file(
        data.path(),
        "air.csv",
        "PM2_5,Temperature\n25,30.1\n75,31.4\n150,29.8\n",
    );

    let performance = PerformanceReportFile::default();
    let explainability = ExplainabilityReportFile::default();
    let pipeline = AuditPipeline::new(&store, &performance, &explainability, &TemplateNarrator);
    let report = pipeline.run(&AuditRequest::new(&csv, "cpcb_standards"));

    assert_eq!(report.validation_report.status, ReportStatus::Success);
    let classification = &report.classification_report;
    assert_eq!(classification.status, ReportStatus::Success);
    assert_eq!(classification.compliance_score_percent, Some(66.67));
    let expected: BTreeMap<String, usize> = [("Good", 1), ("Satisfactory", 1), ("Severe", 1)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(classification.category_distribution, expected);

    assert_eq!(report.component_scores.feature_compliance, 100.0);
    assert_eq!(report.component_scores.threshold_accuracy, 66.67);
    // 40 + 20.001 + 0 + 0
    assert_eq!(report.final_weighted_score, 60.0);
    assert_eq!(report.final_grade, Grade::D);
    assert_eq!(report.dataset_sha256.as_ref().map(String::len), Some(64));
}

#[test]
fn missing_feature_scenario() {
    let regs = regulations_dir(&[("abc.json", ABC_AGENCY)]);
    let store = RegulationStore::load(regs.path());
    let data = tempfile::tempdir().unwrap();
    let csv = write_file(data.path(), "abc.csv", "A,C,D\n1,2,3\n");

    let performance = PerformanceReportFile::default();
    let explainability = ExplainabilityReportFile::default();
    let pipeline = AuditPipeline::new(&store, &performance, &explainability, &DisabledNarrator);
    let report = pipeline.run(&AuditRequest::new(&csv, "abc"));

    let validation = &report.validation_report;
    assert_eq!(validation.status, ReportStatus::Failure);
    assert_eq!(names(&validation.present_features), vec!["A", "C"]);
    assert_eq!(names(&validation.missing_features), vec!["B"]);
    assert_eq!(names(&validation.extra_features), vec!["D"]);
    assert_eq!(report.classification_report.status, ReportStatus::Skipped);
    assert!(report
        .narrative_summary
        .starts_with("Narrative summary unavailable"));
}

#[test]
fn failed_classification_with_good_model_scenario() {
    let regs = regulations_dir(&[("cpcb_standards.json", CPCB_PM25_ONLY)]);
    let store = RegulationStore::load(regs.path());
    let data = tempfile::tempdir().unwrap();
    let csv = write_file(data.path(), "air.csv", "PM2_5\n10\n");
    let perf = write_file(
        data.path(),
        "performance.json",
        r#"{"status": "SUCCESS", "accuracy": 0.9}"#,
    );
    let performance = PerformanceReportFile::new(Some(perf));
    let explainability = ExplainabilityReportFile::default();

    let dataset = load_dataset(&csv).unwrap();
    let validation = FeatureValidator::new(&store).validate(&dataset, "cpcb_standards", "air.csv");
    assert_eq!(validation.status, ReportStatus::Success);
    let (mut classification, _) =
        ComplianceClassifier::new(&store).classify(&dataset, "cpcb_standards");
    classification.status = ReportStatus::Failure;

    let features: BTreeSet<String> = ["PM2_5".to_string()].into_iter().collect();
    let report = Aggregator::new(&TemplateNarrator).aggregate(
        StageReports {
            validation,
            classification,
            performance: performance.evaluate(&dataset, &[]),
            explainability: explainability.inspect(&dataset, &[]),
        },
        &features,
        None,
    );

    assert_eq!(report.component_scores.feature_compliance, 100.0);
    assert_eq!(report.component_scores.threshold_accuracy, 0.0);
    assert_eq!(report.component_scores.xai_trust_score, 85.0);
    assert_eq!(report.component_scores.performance_metrics, 90.0);
    assert_eq!(report.final_weighted_score, 66.0);
    assert_eq!(report.final_grade, Grade::D);

    // Same collaborators, real classification: 40 + 30 + 17 + 9
    let pipeline = AuditPipeline::new(&store, &performance, &explainability, &TemplateNarrator);
    let full = pipeline.run(&AuditRequest::new(&csv, "cpcb_standards"));
    assert_eq!(full.final_weighted_score, 96.0);
    assert_eq!(full.final_grade, Grade::A);
}

#[test]
fn unsupported_extension_is_graded_not_raised() {
    let regs = regulations_dir(&[("cpcb_standards.json", CPCB_PM25_ONLY)]);
    let store = RegulationStore::load(regs.path());
    let data = tempfile::tempdir().unwrap();
    let txt = write_file(data.path(), "air.txt", "PM2_5\n10\n");

    let performance = PerformanceReportFile::default();
    let explainability = ExplainabilityReportFile::default();
    let pipeline = AuditPipeline::new(&store, &performance, &explainability, &DisabledNarrator);
    let report = pipeline.run(&AuditRequest::new(&txt, "cpcb_standards"));

    assert_eq!(report.validation_report.status, ReportStatus::Failure);
    assert!(report.validation_report.message.contains("Unsupported file type"));
    assert_eq!(report.final_grade, Grade::F);
}

#[test]
fn json_dataset_against_bundled_epa_standards() {
    let store = RegulationStore::load(bundled_regulations());
    assert_eq!(store.agency_keys(), vec!["cpcb_standards", "epa_standards"]);

    let data = tempfile::tempdir().unwrap();
    let json = write_file(
        data.path(),
        "air.json",
        r#"[
            {"PM2_5": 12, "PM10": 40, "O3": 0.05, "NO2": 30, "SO2": 5, "CO": 1.2},
            {"PM2_5": 40, "PM10": 160, "O3": 0.08, "NO2": 120, "SO2": 5, "CO": 10}
        ]"#,
    );

    let performance = PerformanceReportFile::default();
    let explainability = ExplainabilityReportFile::default();
    let pipeline = AuditPipeline::new(&store, &performance, &explainability, &TemplateNarrator);
    let report = pipeline.run(&AuditRequest::new(&json, "epa_standards"));

    assert_eq!(report.validation_report.status, ReportStatus::Success);
    let classification = &report.classification_report;
    assert_eq!(classification.status, ReportStatus::Success);
    assert_eq!(classification.compliance_score_percent, None);
    assert_eq!(classification.violation_counts.get("PM2_5"), Some(&1));
    assert_eq!(classification.violation_counts.get("NO2"), Some(&1));
    assert_eq!(classification.violation_counts.get("SO2"), Some(&0));
    // Null score counts as zero: 40 + 0 + 0 + 0
    assert_eq!(report.final_weighted_score, 40.0);
}

#[test]
fn cache_is_shared_between_threads() {
    static CACHE: RegulationCache = RegulationCache::new();
    let dir = bundled_regulations();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let store = CACHE.get_or_load(&dir);
                assert!(store.get("cpcb_standards").is_some());
            });
        }
    });

    assert!(CACHE.is_loaded());
}
