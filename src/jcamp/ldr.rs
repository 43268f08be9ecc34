//! JCAMP-DX labeled data record scanning
//!
//! A JCAMP-DX file is a sequence of `##LABEL=value` records; a value runs
//! from the `=` to the line preceding the next `##` label. `$$` starts a
//! comment that extends to the end of the line.

/// One labeled data record.
#[derive(Debug, Clone, PartialEq)]
pub struct Ldr {
    /// Label as written, without the leading `##` or trailing `=`.
    pub label: String,
    /// Value text; multi-line values keep their line breaks.
    pub value: String,
}

/// Forward-only scanner over JCAMP-DX text, yielding one [`Ldr`] per record.
pub struct LdrScanner<'a> {
    lines: std::iter::Peekable<std::str::Lines<'a>>,
}

impl<'a> LdrScanner<'a> {
    /// Create a scanner over the full document text.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().peekable(),
        }
    }
}

/// Strip a `$$` comment from a line.
fn strip_comment(line: &str) -> &str {
    match line.find("$$") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn is_label_line(line: &str) -> bool {
    line.trim_start().starts_with("##")
}

impl<'a> Iterator for LdrScanner<'a> {
    type Item = Ldr;

    fn next(&mut self) -> Option<Ldr> {
        // find the next label line, skipping leading prose
        let label_line = loop {
            let line = self.lines.next()?;
            if is_label_line(line) {
                break line;
            }
        };

        let body = strip_comment(label_line.trim_start());
        let body = body.trim_start_matches("##");
        let (label, first_value) = match body.split_once('=') {
            Some((label, value)) => (label.trim(), value.trim()),
            None => (body.trim(), ""),
        };

        let mut value = String::from(first_value);
        while let Some(next) = self.lines.peek() {
            if is_label_line(next) {
                break;
            }
            let line = strip_comment(self.lines.next().unwrap_or_default());
            if !value.is_empty() {
                value.push('\n');
            }
            value.push_str(line.trim_end());
        }

        Some(Ldr {
            label: label.to_string(),
            value,
        })
    }
}
