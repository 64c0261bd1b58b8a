//! Chunk consumers
//!
//! The analyzer hands every assembled chunk to a [`Sink`] in discovery
//! order. A failing `accept` marks the chunk's file as failed to export;
//! it never retracts chunks already accepted.

use super::model::CodeChunk;
use crate::config::{OutputConfig, OutputFormat};
use crate::error::{SinkError, SinkResult};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub trait Sink: Send {
    fn accept(&mut self, chunk: &CodeChunk) -> SinkResult<()>;

    /// Called once after the last chunk
    fn finish(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn accept(&mut self, chunk: &CodeChunk) -> SinkResult<()> {
        (**self).accept(chunk)
    }

    fn finish(&mut self) -> SinkResult<()> {
        (**self).finish()
    }
}

/// Keeps every chunk in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    chunks: Vec<CodeChunk>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> &[CodeChunk] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<CodeChunk> {
        self.chunks
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn find(&self, fqn: &str) -> Option<&CodeChunk> {
        self.chunks.iter().find(|c| c.full_class_name == fqn)
    }
}

impl Sink for MemorySink {
    fn accept(&mut self, chunk: &CodeChunk) -> SinkResult<()> {
        self.chunks.push(chunk.clone());
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// `<dir>/<project>/<branch>/<file_name>`
pub fn output_path(dir: &Path, project_id: &str, branch: &str, file_name: &str) -> PathBuf {
    dir.join(project_id).join(branch).join(file_name)
}

fn create_parent(path: &Path) -> SinkResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SinkError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Writes all chunks as one pretty-printed JSON array on `finish`
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    chunks: Vec<CodeChunk>,
}

impl JsonFileSink {
    pub fn new(dir: &Path, project_id: &str, branch: &str) -> Self {
        Self::at(output_path(dir, project_id, branch, "chunks.json"))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunks: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for JsonFileSink {
    fn accept(&mut self, chunk: &CodeChunk) -> SinkResult<()> {
        self.chunks.push(chunk.clone());
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        create_parent(&self.path)?;
        let io_error = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.chunks).map_err(|source| {
            SinkError::Serialize {
                name: self.path.display().to_string(),
                source,
            }
        })?;
        writer.write_all(b"\n").map_err(io_error)?;
        writer.flush().map_err(io_error)?;
        info!(
            "Exported {} chunks to {}",
            self.chunks.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Streams one JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    label: String,
    written: usize,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Stream to `<dir>/<project>/<branch>/chunks.jsonl`
    pub fn create(dir: &Path, project_id: &str, branch: &str) -> SinkResult<Self> {
        let path = output_path(dir, project_id, branch, "chunks.jsonl");
        create_parent(&path)?;
        let file = File::create(&path).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self::with_label(
            BufWriter::new(file),
            path.display().to_string(),
        ))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self::with_label(writer, "<writer>")
    }

    fn with_label(writer: W, label: impl Into<String>) -> Self {
        Self {
            writer,
            label: label.into(),
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: PathBuf::from(&self.label),
            source,
        }
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn accept(&mut self, chunk: &CodeChunk) -> SinkResult<()> {
        let line = serde_json::to_string(chunk).map_err(|source| SinkError::Serialize {
            name: chunk.full_class_name.clone(),
            source,
        })?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| self.io_error(e))?;
        self.written += 1;
        debug!("wrote chunk {}", chunk.full_class_name);
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.writer.flush().map_err(|e| self.io_error(e))
    }
}

/// Sink described by the output settings
pub fn sink_for(
    output: &OutputConfig,
    project_id: &str,
    branch: &str,
) -> SinkResult<Box<dyn Sink>> {
    Ok(match output.format {
        OutputFormat::Json => Box::new(JsonFileSink::new(&output.dir, project_id, branch)),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(&output.dir, project_id, branch)?),
    })
}
