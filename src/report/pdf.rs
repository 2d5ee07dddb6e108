use anyhow::Context;
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream,
};
use time::OffsetDateTime;

use crate::pages::views::format_timestamp;

/// A4 in PDF points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const LEFT_MARGIN: i64 = 100;
const FIRST_LINE_Y: i64 = 750;
const LINE_STEP: i64 = 30;

pub struct ReportData<'a> {
    pub username: &'a str,
    pub diagnosis: &'a str,
    pub generated_at: OffsetDateTime,
}

impl ReportData<'_> {
    fn lines(&self) -> Vec<(String, i64)> {
        vec![
            ("Patient Prediction Report".to_string(), 18),
            (format!("User: {}", self.username), 12),
            (format!("Diagnosis: {}", self.diagnosis), 12),
            (format!("Generated: {}", format_timestamp(self.generated_at)), 10),
        ]
    }
}

/// Single-page PDF with one text line per report field.
pub fn render_report(data: &ReportData<'_>) -> anyhow::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = Vec::new();
    for (i, (text, size)) in data.lines().into_iter().enumerate() {
        let y = FIRST_LINE_Y - LINE_STEP * i as i64;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), size.into()]));
        operations.push(Operation::new("Td", vec![LEFT_MARGIN.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().context("encode report content")?,
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).context("write report pdf")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn report_has_header_user_and_diagnosis() {
        let pdf = render_report(&ReportData {
            username: "alice",
            diagnosis: "N/A",
            generated_at: datetime!(2024-05-01 12:00 UTC),
        })
        .unwrap();

        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert!(contains(&pdf, "Patient Prediction Report"));
        assert!(contains(&pdf, "User: alice"));
        assert!(contains(&pdf, "Diagnosis: N/A"));
        assert!(contains(&pdf, "2024-05-01 12:00:00 UTC"));
    }

    #[test]
    fn report_is_a_loadable_single_page_document() {
        let pdf = render_report(&ReportData {
            username: "bob",
            diagnosis: "Positive for Pneumonia (82.00%)",
            generated_at: OffsetDateTime::now_utc(),
        })
        .unwrap();

        assert!(contains(&pdf, "Positive for Pneumonia"));
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }
}
