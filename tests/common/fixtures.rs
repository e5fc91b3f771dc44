//! Test fixtures and PDF builders.

use anyhow::Result;
use printpdf::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Builder for small text-only PDFs. Every line is written with its own
/// text operator so it ends up as a separate line in the layout.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// TestPdfBuilder::new()
///     .with_line("Contact John Doe")
///     .new_page()
///     .with_line("SSN: 123-45-6789")
///     .build(Path::new("/tmp/test.pdf"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    font_size: f32,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: vec![Vec::new()],
            font_size: 12.0,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Appends a line to the current page.
    pub fn with_line(mut self, text: &str) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(text.to_string());
        }
        self
    }

    /// Starts a new page; following lines go there.
    pub fn new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    /// Writes the PDF and returns its path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, Mm(210.0), Mm(297.0), "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        for (index, lines) in self.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
                doc.get_page(page).get_layer(layer)
            };

            let mut y = 270.0;
            for line in lines {
                layer.use_text(line.as_str(), self.font_size, Mm(20.0), Mm(y), &font);
                y -= 12.0;
            }
        }

        let mut writer = BufWriter::new(File::create(output_path)?);
        doc.save(&mut writer)?;
        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-page document with a mix of sensitive and ordinary lines.
pub fn create_sample_pdf(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_title("Sample")
        .with_line("Invoice for John Doe")
        .with_line("SSN: 123-45-6789")
        .with_line("Contact: john.doe@example.com")
        .with_line("Thank you for your business")
        .build(path)
}

/// Three pages; "CONFIDENTIAL" appears on the first and third only.
pub fn create_multi_page_pdf(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_line("CONFIDENTIAL report")
        .with_line("Quarterly numbers")
        .new_page()
        .with_line("Public appendix")
        .new_page()
        .with_line("More CONFIDENTIAL material")
        .build(path)
}
