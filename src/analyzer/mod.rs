//! Language analyzer
//!
//! Runs the two phases of an analysis:
//!
//! 1. Build the [`SourceIndex`] over the whole project on the blocking pool.
//!    Nothing else starts until it is complete.
//! 2. Process target files on a bounded pool of tokio tasks. Each task owns
//!    one semantic session, parses and extracts on the blocking pool,
//!    resolves, assembles and sends its chunks over a channel. The consumer
//!    re-sequences results so the sink sees files in discovery order.
//!
//! Cancellation (Ctrl-C, time budget, fail-fast sink errors) goes through a
//! [`CancellationToken`]: queued files are never started and in-flight files
//! close their session and drop partial results.

pub mod report;

pub use report::{RunReport, SemanticMode, SinkFailure, SkippedFile};

use crate::chunk::{ChunkAssembler, ChunkParts, CodeChunk, Sink};
use crate::config::Settings;
use crate::error::{AnalysisError, AnalysisResult, ParseResult, ScanError, ScanResult, SinkError};
use crate::indexing::{FileWalker, SourceIndex, SourceIndexBuilder};
use crate::parsing::{ExtractorFactory, FileFacts, Language, LanguageExtractor, SyntaxParser};
use crate::resolution::RelationshipResolver;
use crate::semantic::{FileSession, LspService, SemanticService, SessionTimeouts};
use crate::types::Diagnostic;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
enum FileStatus {
    Analyzed { chunks: Vec<CodeChunk> },
    Skipped { reason: String },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionUse {
    None,
    Opened,
    Failed,
}

/// Everything phase 2 produced for one file
#[derive(Debug)]
struct FileOutcome {
    /// Position in discovery order
    seq: usize,
    path: PathBuf,
    status: FileStatus,
    diagnostics: Vec<Diagnostic>,
    session: SessionUse,
}

impl FileOutcome {
    fn new(seq: usize, path: PathBuf) -> Self {
        Self {
            seq,
            path,
            status: FileStatus::Cancelled,
            diagnostics: Vec::new(),
            session: SessionUse::None,
        }
    }

    fn cancelled(mut self) -> Self {
        self.status = FileStatus::Cancelled;
        self
    }

    fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.status = FileStatus::Skipped {
            reason: reason.into(),
        };
        self
    }

    fn analyzed(mut self, chunks: Vec<CodeChunk>) -> Self {
        self.status = FileStatus::Analyzed { chunks };
        self
    }
}

/// Parse and extract one file; runs on the blocking pool
fn extract(
    language: Language,
    extractor: &dyn LanguageExtractor,
    bytes: &[u8],
) -> ParseResult<(FileFacts, String)> {
    let mut parser = SyntaxParser::new(language)?;
    let tree = parser.parse(bytes)?;
    let facts = extractor.extract_file(&tree);
    Ok((facts, tree.original().to_string()))
}

/// Shared state of phase-2 tasks
struct FileWorker {
    index: Arc<SourceIndex>,
    language: Language,
    extractor: Arc<dyn LanguageExtractor>,
    assembler: ChunkAssembler,
    semantic: Option<Arc<dyn SemanticService>>,
    /// Semantic analysis was configured but the service never came up
    degraded: bool,
    timeouts: SessionTimeouts,
    cancel: CancellationToken,
}

impl FileWorker {
    async fn process(&self, seq: usize, path: PathBuf) -> FileOutcome {
        let mut outcome = FileOutcome::new(seq, path.clone());
        if self.cancel.is_cancelled() {
            return outcome.cancelled();
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => return outcome.skipped(format!("read failed: {e}")),
        };

        let language = self.language;
        let extractor = self.extractor.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extract(language, extractor.as_ref(), &bytes))
                .await;
        let (mut facts, original) = match extracted {
            Ok(Ok(parsed)) => parsed,
            Ok(Err(e)) => {
                warn!("Skipping {}: {e}", path.display());
                outcome.diagnostics.push(
                    Diagnostic::warning("PARSE_SKIPPED", format!("{} ({})", e, e.status_code()))
                        .with_path(&path),
                );
                return outcome.skipped(e.to_string());
            }
            Err(e) => return outcome.skipped(format!("extraction task failed: {e}")),
        };
        outcome.diagnostics.extend(facts.diagnostics.drain(..).map(|mut diagnostic| {
            diagnostic.path.get_or_insert_with(|| path.clone());
            diagnostic
        }));

        let mut session = self
            .semantic
            .as_ref()
            .map(|service| FileSession::new(service.clone(), path.clone(), self.timeouts));
        let mut degraded = self.degraded;

        if let Some(session) = session.as_mut() {
            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                opened = session.open(&original) => Some(opened),
            };
            match opened {
                None => return outcome.cancelled(),
                Some(Ok(())) => outcome.session = SessionUse::Opened,
                Some(Err(e)) => {
                    warn!(
                        "Semantic session failed for {}: {e}; using syntax only",
                        path.display()
                    );
                    outcome.session = SessionUse::Failed;
                    outcome.diagnostics.push(
                        Diagnostic::warning("SESSION_OPEN_FAILED", e.to_string()).with_path(&path),
                    );
                    degraded = true;
                }
            }
        }

        let work = self.resolve_file(
            &path,
            &original,
            &facts,
            session.as_mut(),
            degraded,
            &mut outcome.diagnostics,
        );
        let chunks = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            chunks = work => Some(chunks),
        };

        if let Some(session) = session.as_mut() {
            if let Err(e) = session.close().await {
                // A cancelled query leaves the session querying; Drop closes it
                debug!("close for {} failed: {e}", path.display());
            }
        }

        match chunks {
            Some(chunks) => outcome.analyzed(chunks),
            None => outcome.cancelled(),
        }
    }

    async fn resolve_file(
        &self,
        path: &Path,
        original: &str,
        facts: &FileFacts,
        session: Option<&mut FileSession>,
        degraded: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<CodeChunk> {
        let mut resolver = RelationshipResolver::new(
            &self.index,
            self.extractor.as_ref(),
            path,
            original,
            &facts.header,
        );
        if let Some(session) = session.filter(|s| s.is_open()) {
            resolver = resolver.with_session(session);
        }
        if degraded {
            resolver = resolver.degraded();
        }

        let mut chunks = Vec::with_capacity(facts.classes.len());
        for class in &facts.classes {
            let resolved = resolver.resolve_class(class).await;
            match self
                .assembler
                .assemble(ChunkParts::hashed(path, class, resolved), diagnostics)
            {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => {
                    warn!("Dropping chunk {}: {e}", class.fqn);
                    diagnostics.push(
                        Diagnostic::error(
                            "ASSEMBLY_FAILED",
                            format!("{}: {e} ({})", class.fqn, e.status_code()),
                        )
                        .with_path(path),
                    );
                }
            }
        }
        debug!("{}: {} chunks", path.display(), chunks.len());
        chunks
    }
}

/// Spawn one task per target file, at most `permits` at a time.
///
/// Every target gets exactly one outcome on `tx`, including files that were
/// never started and tasks that panicked.
async fn dispatch(
    worker: Arc<FileWorker>,
    targets: Vec<PathBuf>,
    permits: usize,
    tx: mpsc::Sender<FileOutcome>,
    cancel: CancellationToken,
) {
    let semaphore = Arc::new(Semaphore::new(permits));
    let mut tasks = JoinSet::new();
    let mut in_flight = HashMap::new();
    let mut queue = targets.into_iter().enumerate();

    for (seq, path) in queue.by_ref() {
        while let Some(result) = tasks.try_join_next_with_id() {
            supervise(result, &mut in_flight, &tx).await;
        }

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = semaphore.clone().acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            let _ = tx.send(FileOutcome::new(seq, path).cancelled()).await;
            break;
        };

        let worker = worker.clone();
        let task_tx = tx.clone();
        let task_path = path.clone();
        let handle = tasks.spawn(async move {
            let _permit = permit;
            let outcome = worker.process(seq, task_path).await;
            let _ = task_tx.send(outcome).await;
        });
        in_flight.insert(handle.id(), (seq, path));
    }

    for (seq, path) in queue {
        let _ = tx.send(FileOutcome::new(seq, path).cancelled()).await;
    }

    while let Some(result) = tasks.join_next_with_id().await {
        supervise(result, &mut in_flight, &tx).await;
    }
}

async fn supervise(
    result: Result<(tokio::task::Id, ()), tokio::task::JoinError>,
    in_flight: &mut HashMap<tokio::task::Id, (usize, PathBuf)>,
    tx: &mpsc::Sender<FileOutcome>,
) {
    match result {
        Ok((id, ())) => {
            in_flight.remove(&id);
        }
        Err(e) => {
            let Some((seq, path)) = in_flight.remove(&e.id()) else {
                return;
            };
            error!("Worker for {} failed: {e}", path.display());
            let mut outcome = FileOutcome::new(seq, path.clone());
            outcome
                .diagnostics
                .push(Diagnostic::error("WORKER_FAILED", e.to_string()).with_path(&path));
            let _ = tx.send(outcome.skipped("worker failed")).await;
        }
    }
}

/// Hand one file's outcome to the sink and the report
fn deliver<S: Sink + ?Sized>(
    outcome: FileOutcome,
    sink: &mut S,
    report: &mut RunReport,
    emitted: &mut HashSet<String>,
    fail_fast: bool,
) -> Result<(), SinkError> {
    let FileOutcome {
        path,
        status,
        diagnostics,
        session,
        ..
    } = outcome;
    report.diagnostics.extend(diagnostics);
    match session {
        SessionUse::Opened => report.sessions_opened += 1,
        SessionUse::Failed => report.sessions_failed += 1,
        SessionUse::None => {}
    }

    let chunks = match status {
        FileStatus::Analyzed { chunks } => chunks,
        FileStatus::Skipped { reason } => {
            report.skipped.push(SkippedFile { path, reason });
            return Ok(());
        }
        FileStatus::Cancelled => {
            report.files_cancelled += 1;
            return Ok(());
        }
    };

    report.files_analyzed += 1;
    for chunk in chunks {
        if !emitted.insert(chunk.full_class_name.clone()) {
            report.diagnostics.push(
                Diagnostic::warning(
                    "DUPLICATE_CHUNK",
                    format!("{} already emitted; dropping this copy", chunk.full_class_name),
                )
                .with_path(&path),
            );
            continue;
        }
        if let Err(e) = sink.accept(&chunk) {
            if fail_fast {
                return Err(e);
            }
            warn!("Sink rejected {}: {e}", chunk.full_class_name);
            report.record_sink_failure(path.clone(), chunk.full_class_name, e.to_string());
            continue;
        }
        report.chunks_emitted += 1;
        if chunk.is_incomplete() {
            report.incomplete_chunks.push(chunk.full_class_name);
        }
    }
    Ok(())
}

fn canonical_root(root: &Path) -> ScanResult<PathBuf> {
    root.canonicalize().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScanError::RootNotFound {
                path: root.to_path_buf(),
            }
        } else {
            ScanError::Unreadable {
                path: root.to_path_buf(),
                source,
            }
        }
    })
}

/// Semantic service for one run
struct SemanticSetup {
    service: Option<Arc<dyn SemanticService>>,
    /// Started by this run and shut down at its end
    owned: bool,
    degraded: bool,
}

/// Orchestrates indexing and per-file analysis for one language
pub struct LanguageAnalyzer {
    settings: Arc<Settings>,
    language: Language,
    extractor: Arc<dyn LanguageExtractor>,
    semantic: Option<Arc<dyn SemanticService>>,
    cancel: CancellationToken,
}

impl LanguageAnalyzer {
    /// Java analyzer
    pub fn new(settings: Arc<Settings>) -> ScanResult<Self> {
        Self::for_language(settings, Language::Java)
    }

    pub fn for_language(settings: Arc<Settings>, language: Language) -> ScanResult<Self> {
        let extractor = ExtractorFactory::new(settings.clone()).create_extractor(language)?;
        Ok(Self {
            settings,
            language,
            extractor,
            semantic: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `service` instead of starting one from the settings
    pub fn with_semantic_service(mut self, service: Arc<dyn SemanticService>) -> Self {
        self.semantic = Some(service);
        self
    }

    /// Cancelling this token stops the current and every later run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Phase 1 only
    pub async fn build_index(&self, root: &Path) -> AnalysisResult<SourceIndex> {
        let builder = SourceIndexBuilder::new(self.settings.clone());
        let root = root.to_path_buf();
        let index = tokio::task::spawn_blocking(move || builder.build(&root))
            .await
            .map_err(|e| AnalysisError::Worker {
                reason: format!("indexing task failed: {e}"),
            })??;
        Ok(index)
    }

    async fn start_semantic(&self, root: &Path, report: &mut RunReport) -> SemanticSetup {
        if let Some(service) = &self.semantic {
            let available = service.is_available();
            report.semantic = if available {
                SemanticMode::Enabled
            } else {
                SemanticMode::Disabled
            };
            return SemanticSetup {
                service: available.then(|| service.clone()),
                owned: false,
                degraded: false,
            };
        }

        let config = &self.settings.semantic;
        if !config.enabled {
            return SemanticSetup {
                service: None,
                owned: false,
                degraded: false,
            };
        }

        info!("Starting semantic service: {}", config.command);
        match LspService::start(config, root).await {
            Ok(service) => {
                report.semantic = SemanticMode::Enabled;
                SemanticSetup {
                    service: Some(Arc::new(service)),
                    owned: true,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!("Semantic service unavailable: {e}; continuing with syntax only");
                report.semantic = SemanticMode::Unavailable;
                report.diagnostics.push(Diagnostic::warning(
                    "SEMANTIC_UNAVAILABLE",
                    format!("{}: {e}", config.command),
                ));
                SemanticSetup {
                    service: None,
                    owned: false,
                    degraded: true,
                }
            }
        }
    }

    /// Run both phases over `root`, streaming chunks into `sink`.
    ///
    /// Only a scan failure, or a sink failure with `fail_fast_sink` set,
    /// returns an error; everything else is recorded in the report.
    pub async fn analyze<S: Sink + ?Sized>(
        &self,
        root: &Path,
        sink: &mut S,
    ) -> AnalysisResult<RunReport> {
        let started = Instant::now();
        let analysis = &self.settings.analysis;
        let mut report = RunReport::new(&analysis.project_id, &analysis.branch);
        let run = self.cancel.child_token();

        let root = canonical_root(root)?;
        info!("Phase 1: indexing {}", root.display());
        let index = Arc::new(self.build_index(&root).await?);
        report.files_discovered = index.discovered();
        report.diagnostics.extend(index.diagnostics().iter().cloned());
        report.unindexed = index
            .unindexed()
            .iter()
            .map(|file| SkippedFile {
                path: file.path.clone(),
                reason: file.reason.clone(),
            })
            .collect();
        info!(
            "Indexed {} types from {} files ({} unindexed)",
            index.len(),
            index.files().len(),
            report.unindexed.len()
        );

        let walker = FileWalker::new(self.settings.clone());
        let targets: Vec<PathBuf> = index
            .files()
            .iter()
            .map(|file| file.path.clone())
            .filter(|path| walker.is_target(path))
            .collect();

        let semantic = self.start_semantic(&root, &mut report).await;

        let budget_hit = Arc::new(AtomicBool::new(false));
        let budget_guard = analysis.time_budget().map(|budget| {
            let token = run.clone();
            let hit = budget_hit.clone();
            tokio::spawn(async move {
                tokio::time::sleep(budget).await;
                warn!("Time budget of {budget:?} exhausted; cancelling");
                hit.store(true, Ordering::SeqCst);
                token.cancel();
            })
        });

        let workers = analysis.effective_workers();
        info!(
            "Phase 2: analyzing {} files with {workers} workers",
            targets.len()
        );
        let worker = Arc::new(FileWorker {
            index: index.clone(),
            language: self.language,
            extractor: self.extractor.clone(),
            assembler: ChunkAssembler::from_settings(&self.settings, &root),
            semantic: semantic.service.clone(),
            degraded: semantic.degraded,
            timeouts: SessionTimeouts::from_config(&self.settings.semantic),
            cancel: run.clone(),
        });

        let (tx, mut rx) = mpsc::channel(workers * 2);
        let dispatcher = tokio::spawn(dispatch(worker, targets, workers, tx, run.clone()));

        let mut pending = BTreeMap::new();
        let mut next = 0;
        let mut emitted = HashSet::new();
        let mut fatal = None;
        while let Some(outcome) = rx.recv().await {
            pending.insert(outcome.seq, outcome);
            while let Some(outcome) = pending.remove(&next) {
                next += 1;
                if fatal.is_some() {
                    continue;
                }
                if let Err(e) = deliver(
                    outcome,
                    sink,
                    &mut report,
                    &mut emitted,
                    analysis.fail_fast_sink,
                ) {
                    error!("Sink failed: {e}; stopping run");
                    run.cancel();
                    fatal = Some(e);
                }
            }
        }

        let dispatched = dispatcher.await;
        if let Some(guard) = budget_guard {
            guard.abort();
        }
        if semantic.owned {
            if let Some(service) = &semantic.service {
                if let Err(e) = service.shutdown().await {
                    warn!("Semantic service shutdown failed: {e}");
                }
            }
        }

        if let Err(e) = dispatched {
            return Err(AnalysisError::Worker {
                reason: format!("dispatcher failed: {e}"),
            });
        }
        if let Some(e) = fatal {
            return Err(AnalysisError::Sink(e));
        }

        if let Err(e) = sink.finish() {
            if analysis.fail_fast_sink {
                return Err(AnalysisError::Sink(e));
            }
            error!("Sink failed to finish: {e}");
            report.record_sink_failure(root.clone(), String::new(), e.to_string());
        }

        report.cancelled = run.is_cancelled();
        report.budget_exhausted = budget_hit.load(Ordering::SeqCst);
        report.elapsed = started.elapsed();
        info!(
            "Emitted {} chunks from {} files in {:.2}s",
            report.chunks_emitted,
            report.files_analyzed,
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}
