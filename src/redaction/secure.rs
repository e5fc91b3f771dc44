//! MuPDF-backed document session.
//!
//! Text layout comes from MuPDF's structured text. Removal uses redaction
//! annotations applied with `pdf_redact_page`, so covered text is physically
//! deleted from the content streams rather than painted over.

use super::session::{DocumentBackend, DocumentSession, SaveOptions};
use crate::domain::{LayoutBlock, LayoutLine, Rect, Span, SpanTextModel};
use crate::error::{RedactorError, RedactorResult};
use std::collections::BTreeMap;
use std::path::Path;

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage, PdfWriteOptions};
use mupdf::{Page, Rect as MuRect, TextBlockType, TextLine, TextPageFlags};

/// Garbage collection level used when `garbage_collect` is requested:
/// drop unused objects, compact, renumber and merge duplicates.
const FULL_GARBAGE_LEVEL: i32 = 4;

/// Opens documents with MuPDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBackend for MupdfBackend {
    fn open(&self, path: &Path) -> RedactorResult<Box<dyn DocumentSession>> {
        Ok(Box::new(MupdfSession::open(path)?))
    }

    fn name(&self) -> &str {
        "MuPDF"
    }
}

/// An open PDF plus the removal marks queued per page.
pub struct MupdfSession {
    doc: PdfDocument,
    pending: BTreeMap<usize, Vec<Rect>>,
}

impl MupdfSession {
    pub fn open(path: &Path) -> RedactorResult<Self> {
        let path_str = utf8_path(path, "input")?;
        let doc = PdfDocument::open(path_str).map_err(|e| RedactorError::DocumentOpen {
            path: path.to_path_buf(),
            message: "MuPDF could not open the document".to_string(),
            source: Some(Box::new(e)),
        })?;

        Ok(Self {
            doc,
            pending: BTreeMap::new(),
        })
    }

    fn load_page(&self, page_index: usize) -> RedactorResult<Page> {
        self.doc
            .load_page(page_index as i32)
            .map_err(|e| RedactorError::PdfProcessing {
                message: format!("Failed to load page {}", page_index + 1),
                page: Some(page_index + 1),
                source: Some(Box::new(e)),
            })
    }
}

impl DocumentSession for MupdfSession {
    fn page_count(&self) -> RedactorResult<usize> {
        let count = self
            .doc
            .page_count()
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to get page count".to_string(),
                page: None,
                source: Some(Box::new(e)),
            })?;
        Ok(count.max(0) as usize)
    }

    fn extract_spans(&self, page_index: usize) -> RedactorResult<SpanTextModel> {
        let page = self.load_page(page_index)?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to extract text layout".to_string(),
                page: Some(page_index + 1),
                source: Some(Box::new(e)),
            })?;

        let blocks = text_page.blocks().map(|block| match block.r#type() {
            TextBlockType::Text => LayoutBlock::Text {
                lines: block.lines().map(|line| line_spans(&line)).collect(),
            },
            _ => LayoutBlock::Other,
        });

        Ok(SpanTextModel::from_blocks(blocks))
    }

    fn mark_for_removal(&mut self, page_index: usize, rect: Rect) -> RedactorResult<()> {
        self.pending.entry(page_index).or_default().push(rect);
        Ok(())
    }

    fn commit_marks(&mut self, page_index: usize) -> RedactorResult<usize> {
        let rects = match self.pending.remove(&page_index) {
            Some(rects) if !rects.is_empty() => rects,
            _ => return Ok(0),
        };

        let page = self.load_page(page_index)?;
        let mut pdf_page = PdfPage::try_from(page).map_err(|e| RedactorError::PdfProcessing {
            message: "Page does not support annotations".to_string(),
            page: Some(page_index + 1),
            source: Some(Box::new(e)),
        })?;

        for rect in &rects {
            let annot = pdf_page
                .create_annotation(PdfAnnotationType::Redact)
                .map_err(|e| RedactorError::PdfProcessing {
                    message: "Failed to create redaction annotation".to_string(),
                    page: Some(page_index + 1),
                    source: Some(Box::new(e)),
                })?;

            let mu_rect = MuRect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };
            // SAFETY: `annot` was just created on this page and outlives the call.
            unsafe {
                ffi::set_annotation_rect(&annot, mu_rect);
            }
        }

        pdf_page
            .redact()
            .map_err(|e| RedactorError::PdfProcessing {
                message: format!("Failed to apply redactions on page {}", page_index + 1),
                page: Some(page_index + 1),
                source: Some(Box::new(e)),
            })?;

        Ok(rects.len())
    }

    fn save(&mut self, path: &Path, options: SaveOptions) -> RedactorResult<()> {
        let path_str = utf8_path(path, "output")?;

        let mut write_options = PdfWriteOptions::default();
        write_options.set_garbage_level(if options.garbage_collect {
            FULL_GARBAGE_LEVEL
        } else {
            0
        });
        write_options.set_compress(options.deflate);
        write_options.set_clean(options.clean);

        self.doc
            .save_with_options(path_str, write_options)
            .map_err(|e| RedactorError::DocumentSave {
                path: path.to_path_buf(),
                message: "MuPDF failed to write the document".to_string(),
                source: Some(Box::new(e)),
            })
    }
}

fn utf8_path<'a>(path: &'a Path, parameter: &str) -> RedactorResult<&'a str> {
    path.to_str().ok_or_else(|| RedactorError::InvalidInput {
        parameter: parameter.to_string(),
        reason: "Path contains invalid UTF-8".to_string(),
    })
}

/// Splits a structured-text line into runs of equal font size. Each run
/// becomes one span whose bbox covers all of its glyph quads.
fn line_spans(line: &TextLine) -> LayoutLine {
    let mut spans = Vec::new();
    let mut current: Option<(f32, String, Rect)> = None;

    for ch in line.chars() {
        let Some(c) = ch.char() else { continue };
        let quad = ch.quad();
        let glyph = Rect::new(
            quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
            quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
            quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
            quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
        );
        let size = ch.size();

        match current.as_mut() {
            Some((run_size, text, bbox)) if *run_size == size => {
                text.push(c);
                *bbox = bbox.union(&glyph);
            }
            _ => {
                if let Some((_, text, bbox)) = current.take() {
                    spans.push(Span::new(text, bbox));
                }
                current = Some((size, c.to_string(), glyph));
            }
        }
    }

    if let Some((_, text, bbox)) = current {
        spans.push(Span::new(text, bbox));
    }

    LayoutLine { spans }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// The annotation must be valid. A fresh base context is created and
    /// dropped around the call.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}
