use crate::common::{TestProject, add_shapes};
use chunkforge::types::{InheritanceStatus, ResolvedKind};
use chunkforge::Settings;

#[tokio::test]
async fn test_local_interface_resolves_completely() {
    let project = TestProject::new();
    add_shapes(&project);

    let (report, sink) = project.analyze(Settings::default()).await;
    let circle = sink.find("shapes.Circle").expect("Circle chunk");

    assert_eq!(circle.implements, vec!["shapes.Shape"]);
    assert_eq!(circle.extends, None);
    assert_eq!(circle.inheritance_status, InheritanceStatus::Complete);
    assert!(circle.used_types.contains(&"shapes.Shape".to_string()));
    assert_eq!(circle.file_path, "src/main/java/shapes/Circle.java");

    let area = circle.method("shapes.Circle.area").expect("area method");
    assert_eq!(area.inheritance_info, vec!["shapes.Shape.area"]);
    let constructor = circle.method("shapes.Circle.Circle").expect("constructor");
    assert_eq!(constructor.field_access, vec!["radius"]);
    assert!(constructor.inheritance_info.is_empty());
    assert!(report.incomplete_chunks.is_empty());
}

#[tokio::test]
async fn test_missing_interface_is_kept_and_flagged() {
    let project = TestProject::new();
    add_shapes(&project);
    project.remove_file("src/main/java/shapes/Shape.java");

    let (report, sink) = project.analyze(Settings::default()).await;
    let circle = sink.find("shapes.Circle").expect("Circle chunk");

    assert_eq!(circle.implements.len(), 1);
    assert!(circle.implements[0].ends_with("Shape"));
    assert_eq!(circle.inheritance_status, InheritanceStatus::Incomplete);
    assert_eq!(report.incomplete_chunks, vec!["shapes.Circle"]);
}

#[tokio::test]
async fn test_platform_supertypes_are_flagged_incomplete() {
    let project = TestProject::new();
    project.add_file(
        "app/Worker.java",
        "package app;\n\npublic class Worker extends Thread implements Runnable, java.io.Serializable {\n    public void run() {}\n}\n",
    );

    let (_, sink) = project.analyze(Settings::default()).await;
    let worker = sink.find("app.Worker").expect("Worker chunk");

    assert_eq!(worker.extends.as_deref(), Some("Thread"));
    assert_eq!(worker.implements, vec!["Runnable", "java.io.Serializable"]);
    // Kept as written but not in the index
    assert!(worker.is_incomplete());
    assert!(worker.used_types.is_empty());
}

#[tokio::test]
async fn test_calls_resolve_through_field_types() {
    let project = TestProject::new();
    project.add_file(
        "shop/OrderRepository.java",
        "package shop;\n\npublic class OrderRepository {\n    public void save(Order order) {}\n}\n",
    );
    project.add_file("shop/Order.java", "package shop;\n\npublic class Order {}\n");
    project.add_file(
        "shop/OrderService.java",
        r#"package shop;

import java.util.List;

public class OrderService {
    private final OrderRepository repository = new OrderRepository();

    public void place(Order order) {
        validate(order);
        repository.save(order);
        List<Order> pending = List.of(order);
        pending.size();
        mystery.doIt();
    }

    private void validate(Order order) {}
}
"#,
    );

    let (_, sink) = project.analyze(Settings::default()).await;
    let service = sink.find("shop.OrderService").expect("OrderService chunk");
    let place = service.method("shop.OrderService.place").expect("place method");

    let calls: Vec<(&str, ResolvedKind)> = place
        .calls
        .iter()
        .map(|c| (c.name.as_str(), c.resolved_kind))
        .collect();
    assert!(calls.contains(&("shop.OrderService.validate", ResolvedKind::Local)));
    assert!(calls.contains(&("shop.OrderRepository.save", ResolvedKind::Local)));
    assert!(calls.contains(&("mystery.doIt", ResolvedKind::Unresolved)));
    assert!(
        calls
            .iter()
            .any(|(name, kind)| name.ends_with("List.size") && *kind == ResolvedKind::External)
    );
    assert_eq!(place.calls.len(), 5);

    assert!(place.used_types.contains(&"shop.Order".to_string()));
    assert!(service.used_types.contains(&"shop.OrderRepository".to_string()));
}

#[tokio::test]
async fn test_nested_types_become_their_own_chunks() {
    let project = TestProject::new();
    project.add_file(
        "p/Outer.java",
        "package p;\n\npublic class Outer {\n    static class Inner extends Outer {}\n    interface Callback {}\n}\n",
    );

    let (_, sink) = project.analyze(Settings::default()).await;
    let names: Vec<&str> = sink
        .chunks()
        .iter()
        .map(|c| c.full_class_name.as_str())
        .collect();
    assert_eq!(names, vec!["p.Outer", "p.Outer.Inner", "p.Outer.Callback"]);

    let inner = sink.find("p.Outer.Inner").expect("Inner chunk");
    assert!(inner.is_nested);
    assert_eq!(inner.parent_class.as_deref(), Some("p.Outer"));
    assert_eq!(inner.extends.as_deref(), Some("p.Outer"));
    assert!(!inner.is_incomplete());
}
