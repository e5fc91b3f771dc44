//! Custom assertions for PDF redaction testing.

use std::path::Path;

/// Extracts the text layer, panicking with the path on failure.
pub fn extract_text_or_panic(pdf_path: &Path) -> String {
    pdf_extract::extract_text(pdf_path).unwrap_or_else(|e| {
        panic!(
            "Failed to extract text from '{}': {}",
            pdf_path.display(),
            e
        )
    })
}

/// Asserts that `pattern` no longer appears in the extracted text.
pub fn assert_redacted(pdf_path: &Path, pattern: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        !text.contains(pattern),
        "Pattern '{}' should be redacted but was found in '{}'",
        pattern,
        pdf_path.display()
    );
}

/// Asserts that `pattern` still appears in the extracted text.
pub fn assert_preserved(pdf_path: &Path, pattern: &str) {
    let text = extract_text_or_panic(pdf_path);
    assert!(
        text.contains(pattern),
        "Pattern '{}' should be preserved but was not found in '{}'",
        pattern,
        pdf_path.display()
    );
}

/// Asserts that the file exists, is non-empty and parses as a PDF.
pub fn assert_valid_pdf(pdf_path: &Path) {
    assert!(pdf_path.exists(), "PDF should exist at '{}'", pdf_path.display());
    let len = std::fs::metadata(pdf_path).map(|m| m.len()).unwrap_or(0);
    assert!(len > 0, "PDF should not be empty at '{}'", pdf_path.display());
    assert!(
        lopdf::Document::load(pdf_path).is_ok(),
        "'{}' is not a loadable PDF",
        pdf_path.display()
    );
}

/// Asserts that no scratch files from a run were left in `dir`.
pub fn assert_no_temp_files(dir: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with(".pdf-scrub-"))
                .collect()
        })
        .unwrap_or_default();
    assert!(
        leftovers.is_empty(),
        "temporary files left behind in '{}': {:?}",
        dir.display(),
        leftovers
    );
}
