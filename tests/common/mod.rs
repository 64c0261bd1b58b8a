#![allow(dead_code)]

use async_trait::async_trait;
use chunkforge::chunk::MemorySink;
use chunkforge::error::{SessionError, SessionResult};
use chunkforge::semantic::{Location, SemanticService, TypeHierarchy};
use chunkforge::types::Position;
use chunkforge::{LanguageAnalyzer, RunReport, Settings};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn remove_file(&self, path: &str) {
        fs::remove_file(self.dir.path().join(path)).expect("Failed to remove file");
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run a full analysis into a memory sink
    pub async fn analyze(&self, settings: Settings) -> (RunReport, MemorySink) {
        let analyzer = LanguageAnalyzer::new(Arc::new(settings)).expect("Java analyzer");
        self.analyze_with(analyzer).await
    }

    pub async fn analyze_with(&self, analyzer: LanguageAnalyzer) -> (RunReport, MemorySink) {
        let mut sink = MemorySink::new();
        let report = analyzer
            .analyze(self.path(), &mut sink)
            .await
            .expect("analysis should succeed");
        (report, sink)
    }
}

/// Scripted semantic service that records every call it receives
#[derive(Default)]
pub struct RecordingService {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub queries: AtomicUsize,
    /// Supertype lookups alone; also counted in `queries`
    pub hierarchy_queries: AtomicUsize,
    pub shutdowns: AtomicUsize,
    /// Files whose open fails
    pub fail_open: HashSet<String>,
    pub fail_queries: bool,
    /// Every open waits far past any timeout
    pub hang_open: bool,
    /// `(file name, line, column)` every definition query answers with,
    /// relative to the queried file's directory
    pub definition: Option<(String, u32, u32)>,
    pub open_now: Mutex<HashSet<PathBuf>>,
}

impl RecordingService {
    pub fn failing_open_for(files: &[&str]) -> Self {
        Self {
            fail_open: files.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn answering_definition(file: &str, line: u32, column: u32) -> Self {
        Self {
            definition: Some((file.to_string(), line, column)),
            ..Self::default()
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn hierarchy_queries(&self) -> usize {
        self.hierarchy_queries.load(Ordering::SeqCst)
    }

    /// Files opened and not closed yet
    pub fn still_open(&self) -> usize {
        self.open_now.lock().len()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl SemanticService for RecordingService {
    fn name(&self) -> &str {
        "recording"
    }

    async fn open_file(&self, path: &Path, _content: &str) -> SessionResult<()> {
        if self.hang_open {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_open.contains(&file_name(path)) {
            return Err(SessionError::unavailable("scripted open failure"));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open_now.lock().insert(path.to_path_buf());
        Ok(())
    }

    async fn close_file(&self, path: &Path) -> SessionResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.open_now.lock().remove(path);
        Ok(())
    }

    async fn definition(&self, path: &Path, _position: Position) -> SessionResult<Option<Location>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(SessionError::transport("scripted query failure"));
        }
        Ok(self.definition.as_ref().map(|(file, line, column)| {
            let position = Position::new(*line, *column);
            Location {
                path: path.with_file_name(file),
                start: position,
                end: position,
            }
        }))
    }

    async fn type_hierarchy(
        &self,
        _path: &Path,
        _type_name: &str,
        _position: Position,
    ) -> SessionResult<Option<TypeHierarchy>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.hierarchy_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(SessionError::transport("scripted query failure"));
        }
        Ok(None)
    }

    async fn implementations(
        &self,
        _path: &Path,
        _position: Position,
    ) -> SessionResult<Vec<Location>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn shutdown(&self) -> SessionResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Interface plus implementing class in package `shapes`
pub fn add_shapes(project: &TestProject) {
    project.add_file(
        "src/main/java/shapes/Shape.java",
        "package shapes;\n\npublic interface Shape {\n    double area();\n}\n",
    );
    project.add_file(
        "src/main/java/shapes/Circle.java",
        r#"package shapes;

public class Circle implements Shape {
    private final double radius;

    public Circle(double radius) {
        this.radius = radius;
    }

    @Override
    public double area() {
        return Math.PI * radius * radius;
    }
}
"#,
    );
}
