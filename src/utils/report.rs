use chrono::Local;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use serde::Serialize;

use crate::error::ReportError;
use crate::model::attendance::AttendanceRecord;
use crate::remote::{AttendanceApi, ReportMail};

/// Multipart field the attendance service reads the attachment from.
pub const MAIL_FIELD: &str = "pdf";
pub const PDF_FILE_NAME: &str = "attendance_report.pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const CSV_FILE_NAME: &str = "attendance_report.csv";
pub const CSV_CONTENT_TYPE: &str = "text/csv";

const COLUMNS: [&str; 8] = [
    "Student Name",
    "Register No",
    "Department",
    "Year",
    "Status",
    "Verification",
    "Time In",
    "Verified By",
];

// A4 landscape, millimetres
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const COLUMN_WIDTHS: [f32; 8] = [52.0, 32.0, 34.0, 16.0, 24.0, 32.0, 28.0, 52.0];
const ROW_HEIGHT: f32 = 6.5;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 14.0;

/// One line of the attendance report.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Student Name")]
    name: &'a str,
    #[serde(rename = "Register No")]
    register_no: &'a str,
    #[serde(rename = "Department")]
    department: &'a str,
    #[serde(rename = "Year")]
    year: &'a str,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Verification")]
    verification: &'a str,
    #[serde(rename = "Time In")]
    time_in: String,
    #[serde(rename = "Verified By")]
    verified_by: &'a str,
}

impl<'a> From<&'a AttendanceRecord> for ReportRow<'a> {
    fn from(record: &'a AttendanceRecord) -> Self {
        Self {
            name: &record.name,
            register_no: record.register_no.as_deref().unwrap_or_default(),
            department: record.department.as_deref().unwrap_or_default(),
            year: record.year.as_deref().unwrap_or_default(),
            status: record.status.to_string(),
            verification: record.verification_method.as_deref().unwrap_or_default(),
            time_in: record
                .time_in
                .map(|ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            verified_by: record.verified_by.display_name(),
        }
    }
}

impl ReportRow<'_> {
    fn cells(&self) -> [&str; 8] {
        [
            self.name,
            self.register_no,
            self.department,
            self.year,
            &self.status,
            self.verification,
            &self.time_in,
            self.verified_by,
        ]
    }
}

/// Render records as CSV with a header row.
pub fn render_csv(records: &[AttendanceRecord]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for record in records {
        writer.serialize(ReportRow::from(record))?;
    }
    writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))
}

/// Render records as a paged PDF table, header repeated on every page.
pub fn render_pdf(records: &[AttendanceRecord]) -> Result<Vec<u8>, ReportError> {
    let title = format!("Attendance Report ({})", Local::now().format("%Y-%m-%d"));
    let (doc, page, layer) = PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;

    let mut layer = doc.get_page(page).get_layer(layer);
    layer.use_text(title.as_str(), TITLE_SIZE, Mm(MARGIN), Mm(PAGE_HEIGHT - MARGIN), &bold);
    let mut y = PAGE_HEIGHT - MARGIN - 2.0 * ROW_HEIGHT;
    draw_row(&layer, &COLUMNS, y, &bold);

    for record in records {
        y -= ROW_HEIGHT;
        if y < MARGIN {
            let (page, next) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
            layer = doc.get_page(page).get_layer(next);
            y = PAGE_HEIGHT - MARGIN;
            draw_row(&layer, &COLUMNS, y, &bold);
            y -= ROW_HEIGHT;
        }
        draw_row(&layer, &ReportRow::from(record).cells(), y, &regular);
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn draw_row(layer: &PdfLayerReference, cells: &[&str; 8], y: f32, font: &IndirectFontRef) {
    let mut x = MARGIN;
    for (cell, width) in cells.iter().zip(COLUMN_WIDTHS) {
        layer.use_text(fit(cell, width), FONT_SIZE, Mm(x), Mm(y), font);
        x += width;
    }
}

/// Cut `text` to roughly what fits in `width` mm of 9pt Helvetica.
fn fit(text: &str, width: f32) -> String {
    let max = (width / 1.8) as usize;
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn pdf_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(e.to_string())
}

/// Split a comma separated recipient list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Result<Vec<String>, ReportError> {
    let recipients: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();

    if recipients.is_empty() {
        return Err(ReportError::NoRecipients);
    }
    Ok(recipients)
}

/// Render `records` as PDF and mail them through the attendance service.
pub async fn send_report(
    api: &dyn AttendanceApi,
    records: &[AttendanceRecord],
    recipients: &str,
    message: String,
) -> Result<usize, ReportError> {
    let recipients = parse_recipients(recipients)?;
    let count = recipients.len();
    let body = render_pdf(records)?;

    api.send_report(ReportMail {
        recipients,
        message,
        field_name: MAIL_FIELD,
        file_name: PDF_FILE_NAME.to_string(),
        content_type: PDF_CONTENT_TYPE,
        body,
    })
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceStatus, Verifier};
    use crate::remote::stub::StubApi;

    fn record(id: &str, verified_by: Verifier) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            student_id: None,
            name: format!("Student {id}"),
            register_no: Some("R-1".to_string()),
            department: Some("CSE".to_string()),
            year: Some("2".to_string()),
            status: AttendanceStatus::Present,
            time_in: None,
            verification_method: Some("face".to_string()),
            verified_by,
            sync_error: None,
        }
    }

    #[test]
    fn csv_uses_report_placeholders() {
        let bytes = render_csv(&[
            record("a", Verifier::Pending),
            record("b", Verifier::Resolved("Dr. Rao".into())),
        ])
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Student Name,Register No,Department,Year,Status,Verification,Time In,Verified By"
        );
        assert_eq!(lines[1], "Student a,R-1,CSE,2,Present,face,N/A,Pending");
        assert_eq!(lines[2], "Student b,R-1,CSE,2,Present,face,N/A,Dr. Rao");
    }

    #[test]
    fn empty_report_still_has_a_header() {
        let text = String::from_utf8(render_csv(&[]).unwrap()).unwrap();
        assert!(text.starts_with("Student Name,"));
    }

    #[test]
    fn recipients_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_recipients(" a@x.io, ,b@x.io ,").unwrap(),
            ["a@x.io", "b@x.io"]
        );
        assert!(matches!(parse_recipients(" , "), Err(ReportError::NoRecipients)));
    }

    #[tokio::test]
    async fn report_is_mailed_as_pdf() {
        let api = StubApi::new();

        let sent = send_report(api.as_ref(), &[record("a", Verifier::Pending)], "a@x.io,b@x.io", "Today".into())
            .await
            .unwrap();

        assert_eq!(sent, 2);
        let mails = api.sent_reports.lock().unwrap();
        assert_eq!(mails[0].field_name, "pdf");
        assert_eq!(mails[0].file_name, "attendance_report.pdf");
        assert_eq!(mails[0].content_type, "application/pdf");
        assert_eq!(mails[0].recipients, ["a@x.io", "b@x.io"]);
        assert!(mails[0].body.starts_with(b"%PDF"));
    }

    #[test]
    fn pdf_spans_pages_for_long_reports() {
        let records: Vec<_> = (0..60).map(|i| record(&i.to_string(), Verifier::Pending)).collect();

        let short = render_pdf(&records[..1]).unwrap();
        let long = render_pdf(&records).unwrap();

        assert!(short.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn long_cells_are_cut_to_the_column() {
        assert_eq!(fit("Asha", 52.0), "Asha");
        let cut = fit(&"x".repeat(80), 16.0);
        assert_eq!(cut.chars().count(), 8);
        assert!(cut.ends_with("..."));
    }
}
