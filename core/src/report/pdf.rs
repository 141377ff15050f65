//! Plain-text PDF export of a plan.
//!
//! Uses the built-in Helvetica faces with WinAnsi encoding, so nothing is
//! embedded. Characters the encoding cannot represent are written as `?`.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const HEADER_SIZE: f32 = 15.0;
const FOOTER_SIZE: f32 = 8.0;
/// Helvetica averages a little over half an em per glyph.
const AVG_GLYPH_EM: f32 = 0.52;
const TAB_WIDTH: usize = 4;

const FIRST_PAGE_ID: usize = 7;

#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub title: String,
    pub font_size: f32,
    pub generated_at: Option<String>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: "Autonomous Travel Plan".to_string(),
            font_size: 11.0,
            generated_at: None,
        }
    }
}

impl PdfOptions {
    /// Default layout plus a "Generated on" line under the header.
    pub fn stamped() -> Self {
        Self {
            generated_at: Some(format!(
                "Generated on {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M")
            )),
            ..Default::default()
        }
    }

    fn leading(&self) -> f32 {
        self.font_size * 1.3
    }

    fn body_top(&self) -> f32 {
        let stamp = if self.generated_at.is_some() { FOOTER_SIZE * 2.0 } else { 0.0 };
        PAGE_HEIGHT - MARGIN - HEADER_SIZE * 2.0 - stamp
    }

    fn lines_per_page(&self) -> usize {
        let usable = self.body_top() - MARGIN - FOOTER_SIZE * 2.0;
        ((usable / self.leading()).floor() as usize).max(1)
    }

    fn chars_per_line(&self) -> usize {
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        ((usable / (self.font_size * AVG_GLYPH_EM)).floor() as usize).max(10)
    }
}

/// Maps text to WinAnsi bytes. Unrepresentable characters become `?`.
pub fn to_latin1_lossy(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

fn wrap_paragraph(line: &[u8], width: usize, out: &mut Vec<Vec<u8>>) {
    if line.iter().all(|b| *b == b' ') {
        out.push(Vec::new());
        return;
    }

    // List indentation survives on the first wrapped line only.
    let indent = line.iter().take_while(|b| **b == b' ').count().min(width / 2);
    let mut current: Vec<u8> = vec![b' '; indent];
    let mut has_word = false;

    for word in line.split(|b| *b == b' ').filter(|w| !w.is_empty()) {
        if has_word && current.len() + 1 + word.len() > width {
            out.push(std::mem::take(&mut current));
            has_word = false;
        }

        let mut word = word;
        while !has_word && current.len() + word.len() > width {
            let (head, tail) = word.split_at(width - current.len());
            current.extend_from_slice(head);
            out.push(std::mem::take(&mut current));
            word = tail;
        }
        if word.is_empty() {
            continue;
        }

        if has_word {
            current.push(b' ');
        }
        current.extend_from_slice(word);
        has_word = true;
    }

    if has_word {
        out.push(current);
    }
}

fn layout_lines(text: &str, width: usize) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    for raw in text.trim_end().lines() {
        let expanded = raw.replace('\t', &" ".repeat(TAB_WIDTH)).replace('\r', "");
        wrap_paragraph(&to_latin1_lossy(&expanded), width, &mut lines);
    }
    lines
}

fn push_pdf_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            0x20..=0x7e => out.push(b),
            _ => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
        }
    }
    out.push(b')');
}

fn centered_x(text: &[u8], size: f32) -> f32 {
    let width = text.len() as f32 * size * AVG_GLYPH_EM;
    ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
}

fn page_content(lines: &[Vec<u8>], page_number: usize, options: &PdfOptions) -> Vec<u8> {
    let mut out = Vec::new();
    let title = to_latin1_lossy(&options.title);
    let header_y = PAGE_HEIGHT - MARGIN - HEADER_SIZE;

    out.extend_from_slice(
        format!(
            "BT /F2 {} Tf {:.1} {:.1} Td ",
            HEADER_SIZE,
            centered_x(&title, HEADER_SIZE),
            header_y
        )
        .as_bytes(),
    );
    push_pdf_string(&mut out, &title);
    out.extend_from_slice(b" Tj ET\n");

    if let Some(stamp) = &options.generated_at {
        let stamp = to_latin1_lossy(stamp);
        out.extend_from_slice(
            format!(
                "BT /F3 {} Tf {:.1} {:.1} Td ",
                FOOTER_SIZE,
                centered_x(&stamp, FOOTER_SIZE),
                header_y - FOOTER_SIZE * 2.0
            )
            .as_bytes(),
        );
        push_pdf_string(&mut out, &stamp);
        out.extend_from_slice(b" Tj ET\n");
    }

    out.extend_from_slice(
        format!(
            "BT /F1 {} Tf {:.1} TL {:.1} {:.1} Td\n",
            options.font_size,
            options.leading(),
            MARGIN,
            options.body_top()
        )
        .as_bytes(),
    );
    for line in lines {
        push_pdf_string(&mut out, line);
        out.extend_from_slice(b" Tj T*\n");
    }
    out.extend_from_slice(b"ET\n");

    let footer = format!("Page {}", page_number);
    out.extend_from_slice(
        format!(
            "BT /F3 {} Tf {:.1} {:.1} Td ",
            FOOTER_SIZE,
            centered_x(footer.as_bytes(), FOOTER_SIZE),
            MARGIN / 2.0
        )
        .as_bytes(),
    );
    push_pdf_string(&mut out, footer.as_bytes());
    out.extend_from_slice(b" Tj ET\n");

    out
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, body: &[u8]) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, data: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(&body);
    }

    fn finish(mut self, info_id: usize) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.offsets.len() + 1,
            info_id,
            xref_offset
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

fn font(base: &str) -> Vec<u8> {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base
    )
    .into_bytes()
}

/// Lays the plan out on as many A4 pages as it needs.
pub fn render_pdf(text: &str, options: &PdfOptions) -> Vec<u8> {
    let lines = layout_lines(text, options.chars_per_line());
    let pages: Vec<&[Vec<u8>]> = if lines.is_empty() {
        vec![&lines[..]]
    } else {
        lines.chunks(options.lines_per_page()).collect()
    };

    let page_id = |i: usize| FIRST_PAGE_ID + 2 * i;
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut writer = PdfWriter::new();
    writer.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()).as_bytes());
    writer.object(&font("Helvetica"));
    writer.object(&font("Helvetica-Bold"));
    writer.object(&font("Helvetica-Oblique"));

    let mut info = b"<< /Producer ".to_vec();
    push_pdf_string(&mut info, b"tripwise");
    info.extend_from_slice(b" /Title ");
    push_pdf_string(&mut info, &to_latin1_lossy(&options.title));
    info.extend_from_slice(b" >>");
    writer.object(&info);

    for (i, page_lines) in pages.iter().enumerate() {
        writer.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH,
                PAGE_HEIGHT,
                page_id(i) + 1
            )
            .as_bytes(),
        );
        writer.stream(&page_content(page_lines, i + 1, options));
    }

    writer.finish(6)
}

pub fn write_pdf(text: &str, path: &Path, options: &PdfOptions) -> Result<()> {
    let bytes = render_pdf(text, options);
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write PDF to {}", path.display()))
}
