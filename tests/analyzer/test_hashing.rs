use crate::common::TestProject;
use chunkforge::Settings;

const ORIGINAL: &str = r#"package calc;

public class Adder {
    public int add(int a, int b) {
        return a + b;
    }

    public int twice(int a) {
        return add(a, a);
    }
}
"#;

const REFORMATTED: &str = r#"package calc;

/** Adds things. */
public class Adder
{
    // sum of both
    public int add( int a,
                    int b ) { return a+b; }

    public int twice(int a) { return add(a, a); }
}
"#;

const EDITED: &str = r#"package calc;

public class Adder {
    public int add(int a, int b) {
        return a - b;
    }

    public int twice(int a) {
        return add(a, a);
    }
}
"#;

async fn adder_hashes(source: &str) -> (String, Vec<String>) {
    let project = TestProject::new();
    project.add_file("calc/Adder.java", source);
    let (_, sink) = project.analyze(Settings::default()).await;
    let chunk = sink.find("calc.Adder").expect("Adder chunk");
    (
        chunk.ast_hash.to_string(),
        chunk.methods.iter().map(|m| m.ast_hash.to_string()).collect(),
    )
}

#[tokio::test]
async fn test_repeated_runs_produce_identical_hashes() {
    let first = adder_hashes(ORIGINAL).await;
    let second = adder_hashes(ORIGINAL).await;
    assert_eq!(first, second);
    assert_eq!(first.0.len(), 64);
}

#[tokio::test]
async fn test_formatting_and_comments_do_not_change_hashes() {
    let original = adder_hashes(ORIGINAL).await;
    let reformatted = adder_hashes(REFORMATTED).await;
    assert_eq!(original, reformatted);
}

#[tokio::test]
async fn test_one_token_change_only_touches_its_method() {
    let (class_before, methods_before) = adder_hashes(ORIGINAL).await;
    let (class_after, methods_after) = adder_hashes(EDITED).await;

    assert_ne!(class_before, class_after);
    assert_ne!(methods_before[0], methods_after[0]);
    assert_eq!(methods_before[1], methods_after[1]);
}
