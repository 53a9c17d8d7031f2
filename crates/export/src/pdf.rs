//! A4 PDF rendering of a [`ReportModel`] via `printpdf`.

use crate::error::{ExportError, ExportResult};
use crate::report::ReportModel;
use cellcount_core::VisitRecord;
use printpdf::*;
use std::io::BufWriter;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const LEFT: f32 = 20.0;
const COLUMNS: [f32; 4] = [LEFT, 85.0, 110.0, 140.0];
const COMMENT_WRAP: usize = 95;

/// Writes lines top to bottom, starting a new page when the bottom margin is reached.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl Cursor<'_> {
    fn advance(&mut self, step: f32) {
        self.y -= step;
        if self.y < BOTTOM {
            let (page, layer) = doc_page(self.doc);
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }
}

fn doc_page(doc: &PdfDocumentReference) -> (PdfPageIndex, PdfLayerIndex) {
    doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.chars().count() + word.chars().count() + 1 > max_chars
                && !current.is_empty()
            {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Render the report of one saved record. Returns PDF bytes.
pub fn render_report_pdf(record: &VisitRecord) -> ExportResult<Vec<u8>> {
    let (bytes, pages) = render_model(&ReportModel::from_record(record))?;
    tracing::debug!(
        record_id = %record.id(),
        bytes = bytes.len(),
        pages,
        "Rendered PDF report"
    );
    Ok(bytes)
}

/// Lays out the model and returns the PDF bytes with the number of pages written.
fn render_model(model: &ReportModel) -> ExportResult<(Vec<u8>, usize)> {
    let (doc, page1, layer1) =
        PdfDocument::new(&model.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

    let mut cursor = Cursor {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        y: TOP,
        pages: 1,
    };

    // Title block
    cursor.text(&model.title, 16.0, LEFT, &bold);
    cursor.advance(9.0);
    cursor.text(&model.patient_line, 10.0, LEFT, &font);
    cursor.advance(5.0);
    cursor.text(&model.timestamp_line, 10.0, LEFT, &font);
    cursor.advance(5.0);
    cursor.text(&model.panel_line, 10.0, LEFT, &font);
    cursor.advance(10.0);

    // Counts
    for (x, heading) in COLUMNS.iter().zip(["Cell type", "Count", "Percent", "Reference"]) {
        cursor.text(heading, 10.0, *x, &bold);
    }
    cursor.advance(6.0);
    for row in &model.rows {
        let cells = [&row.cell_type, &row.count, &row.percent, &row.reference];
        for (x, value) in COLUMNS.iter().zip(cells) {
            cursor.text(value, 10.0, *x, &font);
        }
        cursor.advance(5.0);
    }
    cursor.advance(1.0);
    cursor.text(&model.total_line, 10.0, LEFT, &bold);
    cursor.advance(10.0);

    // Morphology
    cursor.text("Red cell morphology", 12.0, LEFT, &bold);
    cursor.advance(6.0);
    for line in &model.morphology {
        cursor.text(line, 10.0, LEFT + 5.0, &font);
        cursor.advance(5.0);
    }
    cursor.advance(5.0);

    // Comment
    cursor.text("Comment", 12.0, LEFT, &bold);
    cursor.advance(6.0);
    for line in wrap_text(&model.comment, COMMENT_WRAP) {
        cursor.text(&line, 10.0, LEFT + 5.0, &font);
        cursor.advance(5.0);
    }

    let pages = cursor.pages;
    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
    let bytes = buf
        .into_inner()
        .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))?;
    Ok((bytes, pages))
}
