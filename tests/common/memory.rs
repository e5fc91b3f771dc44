//! In-memory document backend.
//!
//! Pages are lists of spans. Committing marks blanks every character whose
//! horizontal centre falls inside a mark on the same line, so text never
//! reflows and later extractions see the removal.

use pdf_scrub::redaction::{Optimizer, OptimizerStatus, SaveOptions};
use pdf_scrub::{
    DocumentBackend, DocumentSession, Rect, RedactorError, RedactorResult, Span, SpanTextModel,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Everything a session did, shared with the test after the session is gone.
#[derive(Debug, Default)]
pub struct SessionLog {
    pub extractions: Vec<usize>,
    pub marks: Vec<(usize, Rect)>,
    pub commits: Vec<usize>,
    pub saves: usize,
    /// Page text as of the last commit.
    pub final_pages: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    pub pages: Vec<Vec<Span>>,
}

impl MemoryDocument {
    /// One span per line, 10 units per character, lines 20 units apart.
    pub fn from_lines(pages: &[&[&str]]) -> Self {
        let pages = pages
            .iter()
            .map(|lines| {
                lines
                    .iter()
                    .enumerate()
                    .map(|(i, text)| {
                        let y = 100.0 + i as f32 * 20.0;
                        let width = text.chars().count() as f32 * 10.0;
                        Span::new(*text, Rect::new(50.0, y, 50.0 + width, y + 12.0))
                    })
                    .collect()
            })
            .collect();
        Self { pages }
    }
}

pub struct MemorySession {
    pages: Vec<Vec<Span>>,
    pending: Vec<(usize, Rect)>,
    fail_commit_on: Option<usize>,
    log: Arc<Mutex<SessionLog>>,
}

impl MemorySession {
    pub fn new(document: MemoryDocument) -> Self {
        Self {
            pages: document.pages,
            pending: Vec::new(),
            fail_commit_on: None,
            log: Arc::new(Mutex::new(SessionLog::default())),
        }
    }

    pub fn failing_commit_on(mut self, page_index: usize) -> Self {
        self.fail_commit_on = Some(page_index);
        self
    }

    pub fn log(&self) -> Arc<Mutex<SessionLog>> {
        Arc::clone(&self.log)
    }

    pub fn page_texts(&self, page_index: usize) -> Vec<String> {
        self.pages[page_index].iter().map(|s| s.text.clone()).collect()
    }

    fn blank(span: &mut Span, mark: &Rect) {
        let overlaps_line = mark.y0 < span.bbox.y1 && mark.y1 > span.bbox.y0;
        if !overlaps_line {
            return;
        }
        let len = span.text.chars().count();
        if len == 0 {
            return;
        }
        let width = span.bbox.width() / len as f32;
        span.text = span
            .text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let centre = span.bbox.x0 + (i as f32 + 0.5) * width;
                if centre > mark.x0 && centre < mark.x1 {
                    ' '
                } else {
                    c
                }
            })
            .collect();
    }
}

impl DocumentSession for MemorySession {
    fn page_count(&self) -> RedactorResult<usize> {
        Ok(self.pages.len())
    }

    fn extract_spans(&self, page_index: usize) -> RedactorResult<SpanTextModel> {
        self.log.lock().unwrap().extractions.push(page_index);
        Ok(SpanTextModel::new(self.pages[page_index].clone()))
    }

    fn mark_for_removal(&mut self, page_index: usize, rect: Rect) -> RedactorResult<()> {
        self.log.lock().unwrap().marks.push((page_index, rect));
        self.pending.push((page_index, rect));
        Ok(())
    }

    fn commit_marks(&mut self, page_index: usize) -> RedactorResult<usize> {
        if self.fail_commit_on == Some(page_index) {
            return Err(RedactorError::PdfProcessing {
                message: "simulated commit failure".to_string(),
                page: Some(page_index + 1),
                source: None,
            });
        }

        let (mine, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(p, _)| *p == page_index);
        self.pending = rest;

        for (_, mark) in &mine {
            for span in &mut self.pages[page_index] {
                Self::blank(span, mark);
            }
        }

        let mut log = self.log.lock().unwrap();
        log.commits.push(page_index);
        log.final_pages = (0..self.pages.len()).map(|p| self.page_texts(p)).collect();
        Ok(mine.len())
    }

    fn save(&mut self, path: &Path, _options: SaveOptions) -> RedactorResult<()> {
        self.log.lock().unwrap().saves += 1;
        let body: Vec<String> = self.pages.iter().flatten().map(|s| s.text.clone()).collect();
        std::fs::write(path, body.join("\n")).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Backend handing out fresh sessions over the same document.
pub struct MemoryBackend {
    document: MemoryDocument,
    fail_commit_on: Option<usize>,
    last_log: Arc<Mutex<Option<Arc<Mutex<SessionLog>>>>>,
}

impl MemoryBackend {
    pub fn new(document: MemoryDocument) -> Self {
        Self {
            document,
            fail_commit_on: None,
            last_log: Arc::new(Mutex::new(None)),
        }
    }

    pub fn failing_commit_on(mut self, page_index: usize) -> Self {
        self.fail_commit_on = Some(page_index);
        self
    }

    /// Handle to the log of the most recently opened session.
    pub fn log_handle(&self) -> Arc<Mutex<Option<Arc<Mutex<SessionLog>>>>> {
        Arc::clone(&self.last_log)
    }
}

impl DocumentBackend for MemoryBackend {
    fn open(&self, _path: &Path) -> RedactorResult<Box<dyn DocumentSession>> {
        let mut session = MemorySession::new(self.document.clone());
        if let Some(page) = self.fail_commit_on {
            session = session.failing_commit_on(page);
        }
        *self.last_log.lock().unwrap() = Some(session.log());
        Ok(Box::new(session))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Optimizer that copies its input and reports a fixed exit code.
pub struct CopyOptimizer {
    pub exit_code: i32,
}

impl Optimizer for CopyOptimizer {
    fn optimize(&self, input: &Path, output: &Path) -> RedactorResult<OptimizerStatus> {
        std::fs::copy(input, output).map_err(|e| RedactorError::Io {
            path: output.to_path_buf(),
            source: e,
        })?;
        OptimizerStatus::from_exit_code(Some(self.exit_code), "simulated failure")
    }

    fn name(&self) -> &str {
        "copy"
    }
}
