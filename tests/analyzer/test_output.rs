use crate::common::{TestProject, add_shapes};
use chunkforge::chunk::{EdgeKind, JsonFileSink, sink_for};
use chunkforge::config::{OutputConfig, OutputFormat};
use chunkforge::{LanguageAnalyzer, Settings};
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn settings(project_id: &str, branch: &str) -> Settings {
    let mut settings = Settings::default();
    settings.analysis.project_id = project_id.to_string();
    settings.analysis.branch = branch.to_string();
    settings
}

#[tokio::test]
async fn test_json_export_has_the_record_shape() {
    let project = TestProject::new();
    add_shapes(&project);
    let out = TempDir::new().unwrap();

    let analyzer = LanguageAnalyzer::new(Arc::new(settings("geometry", "main"))).unwrap();
    let mut sink = JsonFileSink::new(out.path(), "geometry", "main");
    analyzer.analyze(project.path(), &mut sink).await.unwrap();

    let written = fs::read_to_string(out.path().join("geometry/main/chunks.json")).unwrap();
    let chunks: Vec<Value> = serde_json::from_str(&written).unwrap();
    assert_eq!(chunks.len(), 2);

    let circle = chunks
        .iter()
        .find(|c| c["fullClassName"] == "shapes.Circle")
        .unwrap();
    assert_eq!(circle["package"], "shapes");
    assert_eq!(circle["className"], "Circle");
    assert_eq!(circle["implements"][0], "shapes.Shape");
    assert_eq!(circle["extends"], Value::Null);
    assert_eq!(circle["type"], "regular");
    assert_eq!(circle["isNested"], false);
    assert_eq!(circle["isAnnotation"], false);
    assert_eq!(circle["inheritanceStatus"], "complete");
    assert_eq!(circle["projectId"], "geometry");
    assert_eq!(circle["branch"], "main");
    assert_eq!(circle["astHash"].as_str().unwrap().len(), 64);

    let methods = circle["methods"].as_array().unwrap();
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0]["name"], "shapes.Circle.Circle(double radius)");
    assert_eq!(methods[0]["type"], "constructor");
    assert_eq!(methods[1]["type"], "override");
    assert_eq!(methods[1]["annotations"][0], "@Override");
}

#[tokio::test]
async fn test_jsonl_export_streams_in_discovery_order() {
    let project = TestProject::new();
    for name in ["Delta", "Alpha", "Charlie", "Bravo"] {
        project.add_file(
            &format!("fleet/{name}.java"),
            &format!("package fleet;\n\npublic class {name} {{}}\n"),
        );
    }
    let out = TempDir::new().unwrap();

    let mut settings = settings("fleet", "release");
    settings.analysis.parallel_workers = 4;
    settings.output = OutputConfig {
        dir: out.path().to_path_buf(),
        format: OutputFormat::Jsonl,
    };
    let analyzer = LanguageAnalyzer::new(Arc::new(settings.clone())).unwrap();
    let mut sink = sink_for(&settings.output, "fleet", "release").unwrap();
    let report = analyzer.analyze(project.path(), &mut sink).await.unwrap();
    assert_eq!(report.chunks_emitted, 4);

    let written = fs::read_to_string(out.path().join("fleet/release/chunks.jsonl")).unwrap();
    let names: Vec<String> = written
        .lines()
        .map(|line| {
            let chunk: Value = serde_json::from_str(line).unwrap();
            chunk["fullClassName"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        names,
        vec!["fleet.Alpha", "fleet.Bravo", "fleet.Charlie", "fleet.Delta"]
    );
}

#[tokio::test]
async fn test_edges_reflect_resolved_relationships() {
    let project = TestProject::new();
    add_shapes(&project);

    let (_, sink) = project.analyze(Settings::default()).await;
    let circle = sink.find("shapes.Circle").unwrap();
    let edges = circle.edges();

    assert!(edges.iter().any(|e| e.kind == EdgeKind::Implements
        && e.from == "shapes.Circle"
        && e.to == "shapes.Shape"));
    assert!(edges.iter().any(|e| e.kind == EdgeKind::AccessesField
        && e.to == "shapes.Circle.radius"));
    assert!(edges.iter().all(|e| e.kind != EdgeKind::Extends));
}
