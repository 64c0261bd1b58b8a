use crate::common::{RecordingService, TestProject, add_shapes};
use chunkforge::chunk::{CodeChunk, Sink};
use chunkforge::error::{SinkError, SinkResult};
use chunkforge::{LanguageAnalyzer, Settings};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_broken_file_does_not_stop_the_run() {
    let project = TestProject::new();
    add_shapes(&project);
    project.add_file(
        "src/main/java/shapes/Square.java",
        "package shapes;\n\npublic class Square implements Shape {\n    public double area( {\n}\n",
    );

    let (report, sink) = project.analyze(Settings::default()).await;

    assert!(sink.find("shapes.Circle").is_some());
    assert!(sink.find("shapes.Shape").is_some());
    assert!(sink.find("shapes.Square").is_none());
    assert_eq!(report.files_discovered, 3);
    assert_eq!(report.unindexed.len(), 1);
    assert!(report.unindexed[0].path.ends_with("Square.java"));
    assert_eq!(report.diagnostics_with_code("UNINDEXED_FILE").count(), 1);
    assert_eq!(report.files_analyzed, 2);
}

#[tokio::test]
async fn test_broken_class_does_not_take_its_file_down() {
    let project = TestProject::new();
    add_shapes(&project);
    project.add_file(
        "src/main/java/shapes/Extras.java",
        "package shapes;\n\nclass Good implements Shape {\n    public double area() { return 1; }\n}\n\nclass Bad { void broken( { } }\n",
    );

    let (report, sink) = project.analyze(Settings::default()).await;

    let good = sink.find("shapes.Good").expect("intact class is still emitted");
    assert_eq!(good.implements, vec!["shapes.Shape"]);
    assert!(sink.find("shapes.Bad").is_none());
    assert!(report.unindexed.is_empty());
    assert_eq!(report.files_analyzed, 3);

    let malformed: Vec<_> = report.diagnostics_with_code("MALFORMED_DECLARATION").collect();
    assert_eq!(malformed.len(), 1);
    assert!(malformed[0]
        .path
        .as_ref()
        .is_some_and(|p| p.ends_with("Extras.java")));
}

#[tokio::test]
async fn test_other_languages_are_ignored() {
    let project = TestProject::new();
    add_shapes(&project);
    project.add_file("src/main/kotlin/Util.kt", "fun main() {}\n");
    project.add_file("README.md", "# shapes\n");

    let (report, sink) = project.analyze(Settings::default()).await;
    assert_eq!(report.files_discovered, 2);
    assert_eq!(sink.chunks().len(), 2);
    assert!(report.is_clean());
}

/// Rejects one chunk by name and keeps the rest
#[derive(Default)]
struct PickySink {
    reject: String,
    accepted: Vec<String>,
}

impl Sink for PickySink {
    fn accept(&mut self, chunk: &CodeChunk) -> SinkResult<()> {
        if chunk.full_class_name == self.reject {
            return Err(SinkError::Rejected {
                name: chunk.full_class_name.clone(),
                reason: "quota".to_string(),
            });
        }
        self.accepted.push(chunk.full_class_name.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_sink_rejection_marks_only_that_file() {
    let project = TestProject::new();
    add_shapes(&project);

    let analyzer = LanguageAnalyzer::new(Arc::new(Settings::default())).unwrap();
    let mut sink = PickySink {
        reject: "shapes.Circle".to_string(),
        ..PickySink::default()
    };
    let report = analyzer.analyze(project.path(), &mut sink).await.unwrap();

    assert_eq!(sink.accepted, vec!["shapes.Shape"]);
    assert_eq!(report.chunks_emitted, 1);
    assert_eq!(report.sink_failures.len(), 1);
    assert_eq!(report.sink_failures[0].chunk, "shapes.Circle");
    assert_eq!(report.failed_exports.len(), 1);
    assert!(report.failed_exports[0].ends_with("Circle.java"));
}

#[tokio::test]
async fn test_fail_fast_sink_stops_the_run() {
    let project = TestProject::new();
    add_shapes(&project);

    let mut settings = Settings::default();
    settings.analysis.fail_fast_sink = true;
    let analyzer = LanguageAnalyzer::new(Arc::new(settings)).unwrap();
    let mut sink = PickySink {
        reject: "shapes.Circle".to_string(),
        ..PickySink::default()
    };
    let err = analyzer.analyze(project.path(), &mut sink).await.unwrap_err();

    assert_eq!(err.status_code(), "SINK_REJECTED");
    assert!(sink.accepted.is_empty());
}

#[tokio::test]
async fn test_time_budget_cancels_in_flight_files() {
    let project = TestProject::new();
    add_shapes(&project);

    let service = Arc::new(RecordingService {
        hang_open: true,
        ..RecordingService::default()
    });
    let mut settings = Settings::default();
    settings.analysis.time_budget_secs = Some(1);
    settings.analysis.parallel_workers = 2;
    settings.semantic.open_timeout_ms = 60_000;
    let analyzer = LanguageAnalyzer::new(Arc::new(settings))
        .unwrap()
        .with_semantic_service(service.clone());

    let (report, sink) = project.analyze_with(analyzer).await;

    assert!(report.cancelled);
    assert!(report.budget_exhausted);
    assert!(sink.chunks().is_empty());
    assert!(sink.is_finished());
    assert_eq!(report.files_cancelled, 2);
    assert_eq!(report.files_analyzed, 0);

    // Interrupted opens are closed from the session drop guard
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.closes(), 2);
}
