use crate::common::{RecordingService, TestProject, add_shapes};
use chunkforge::semantic::NullSemanticService;
use chunkforge::types::{InheritanceStatus, ResolvedKind};
use chunkforge::{LanguageAnalyzer, SemanticMode, Settings};
use std::sync::Arc;

fn analyzer_with(service: Arc<RecordingService>, workers: usize) -> LanguageAnalyzer {
    let mut settings = Settings::default();
    settings.analysis.parallel_workers = workers;
    LanguageAnalyzer::new(Arc::new(settings))
        .unwrap()
        .with_semantic_service(service)
}

fn add_layers(project: &TestProject) {
    project.add_file("app/Base.java", "package app;\n\npublic class Base {}\n");
    for name in ["Alpha", "Beta", "Gamma", "Delta"] {
        project.add_file(
            &format!("app/{name}.java"),
            &format!("package app;\n\npublic class {name} extends Base {{\n    void run() {{}}\n}}\n"),
        );
    }
}

#[tokio::test]
async fn test_every_session_is_closed() {
    let project = TestProject::new();
    add_layers(&project);
    let service = Arc::new(RecordingService::default());

    let (report, sink) = project
        .analyze_with(analyzer_with(service.clone(), 3))
        .await;

    assert_eq!(report.semantic, SemanticMode::Enabled);
    assert_eq!(sink.chunks().len(), 5);
    assert_eq!(service.opens(), 5);
    assert_eq!(service.closes(), 5);
    assert_eq!(service.still_open(), 0);
    assert_eq!(report.sessions_opened, 5);
    assert_eq!(report.sessions_failed, 0);
    // Injected services belong to the caller
    assert_eq!(
        service.shutdowns.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn test_open_failure_degrades_only_that_file() {
    let project = TestProject::new();
    add_layers(&project);
    let service = Arc::new(RecordingService::failing_open_for(&["Beta.java"]));

    let (report, sink) = project
        .analyze_with(analyzer_with(service.clone(), 2))
        .await;

    let beta = sink.find("app.Beta").expect("Beta is still emitted");
    assert_eq!(beta.extends.as_deref(), Some("app.Base"));
    assert_eq!(beta.inheritance_status, InheritanceStatus::Incomplete);

    let alpha = sink.find("app.Alpha").expect("Alpha chunk");
    assert_eq!(alpha.inheritance_status, InheritanceStatus::Complete);
    // No supertypes, nothing to flag
    assert!(!sink.find("app.Base").unwrap().is_incomplete());

    assert_eq!(report.sessions_failed, 1);
    assert_eq!(report.sessions_opened, 4);
    assert_eq!(report.diagnostics_with_code("SESSION_OPEN_FAILED").count(), 1);
    assert_eq!(report.incomplete_chunks, vec!["app.Beta"]);
    assert_eq!(service.opens(), service.closes());
}

#[tokio::test]
async fn test_semantic_definition_overrides_syntax() {
    let project = TestProject::new();
    project.add_file(
        "p/Target.java",
        "package p;\n\npublic class Target {\n    public void go() {}\n}\n",
    );
    project.add_file(
        "p/Caller.java",
        r#"package p;

public class Caller {
    Object lookup() { return null; }

    void call() {
        lookup().go();
    }
}
"#,
    );
    let service = Arc::new(RecordingService::answering_definition("Target.java", 3, 16));

    let (_, sink) = project
        .analyze_with(analyzer_with(service.clone(), 1))
        .await;

    let call = sink
        .find("p.Caller")
        .and_then(|c| c.method("p.Caller.call"))
        .expect("call method");
    assert_eq!(call.calls.len(), 2);
    let lookup = call
        .calls
        .iter()
        .find(|c| c.name == "p.Caller.lookup")
        .expect("same-class call");
    assert_eq!(lookup.display_name, None);

    let go = call
        .calls
        .iter()
        .find(|c| c.name == "p.Target.go")
        .expect("semantic answer");
    assert_eq!(go.resolved_kind, ResolvedKind::Local);
    assert_eq!(go.display_name.as_deref(), Some("lookup().go"));
    assert!(service.queries() >= 1);
}

#[tokio::test]
async fn test_query_failures_fall_back_to_syntax() {
    let project = TestProject::new();
    add_shapes(&project);
    project.add_file(
        "src/main/java/shapes/Canvas.java",
        "package shapes;\n\npublic class Canvas {\n    private Circle circle;\n\n    double paint() {\n        return circle.area();\n    }\n}\n",
    );
    let service = Arc::new(RecordingService {
        fail_queries: true,
        ..RecordingService::default()
    });

    let (report, sink) = project
        .analyze_with(analyzer_with(service.clone(), 2))
        .await;

    let paint = sink
        .find("shapes.Canvas")
        .and_then(|c| c.method("shapes.Canvas.paint"))
        .expect("paint method");
    assert_eq!(paint.calls[0].name, "shapes.Circle.area");
    assert_eq!(paint.calls[0].resolved_kind, ResolvedKind::Local);
    assert!(report.diagnostics_with_code("SEMANTIC_QUERY_FAILED").count() >= 1);
    assert_eq!(service.still_open(), 0);
}

#[tokio::test]
async fn test_unavailable_service_is_not_degradation() {
    let project = TestProject::new();
    add_layers(&project);
    let analyzer = LanguageAnalyzer::new(Arc::new(Settings::default()))
        .unwrap()
        .with_semantic_service(Arc::new(NullSemanticService));

    let (report, sink) = project.analyze_with(analyzer).await;

    assert_eq!(report.semantic, SemanticMode::Disabled);
    assert!(sink.chunks().iter().all(|c| !c.is_incomplete()));
    assert_eq!(report.sessions_opened, 0);
    assert_eq!(report.sessions_failed, 0);
}

#[tokio::test]
async fn test_unstartable_service_marks_run_degraded() {
    let project = TestProject::new();
    add_layers(&project);

    let mut settings = Settings::default();
    settings.semantic.enabled = true;
    settings.semantic.command = "chunkforge-no-such-language-server".to_string();
    settings.semantic.init_timeout_ms = 2_000;
    let (report, sink) = project.analyze(settings).await;

    assert_eq!(report.semantic, SemanticMode::Unavailable);
    assert_eq!(report.diagnostics_with_code("SEMANTIC_UNAVAILABLE").count(), 1);
    assert_eq!(sink.chunks().len(), 5);
    assert_eq!(report.incomplete_chunks.len(), 4);
    assert!(!sink.find("app.Base").unwrap().is_incomplete());
}

#[tokio::test]
async fn test_local_supertypes_need_no_hierarchy_query() {
    let project = TestProject::new();
    add_shapes(&project);
    let service = Arc::new(RecordingService::default());

    let (_, sink) = project
        .analyze_with(analyzer_with(service.clone(), 1))
        .await;

    let circle = sink.find("shapes.Circle").expect("circle chunk");
    assert_eq!(circle.implements, vec!["shapes.Shape"]);
    assert_eq!(circle.inheritance_status, InheritanceStatus::Complete);
    assert_eq!(service.hierarchy_queries(), 0);
}

#[tokio::test]
async fn test_platform_supertype_asks_the_service_once() {
    let project = TestProject::new();
    project.add_file(
        "p/Worker.java",
        "package p;\n\npublic class Worker extends Thread implements Runnable {\n    public void run() {}\n}\n",
    );
    let service = Arc::new(RecordingService::default());

    let (_, sink) = project
        .analyze_with(analyzer_with(service.clone(), 1))
        .await;

    let worker = sink.find("p.Worker").expect("worker chunk");
    assert_eq!(worker.extends.as_deref(), Some("Thread"));
    assert_eq!(worker.inheritance_status, InheritanceStatus::Incomplete);
    assert_eq!(service.hierarchy_queries(), 1);
}
