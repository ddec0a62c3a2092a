//! Indentation-aware line builder shared by every backend.

/// Placeholder written when a declaration carries no documentation.
pub const NOT_DOCUMENTED: &str = "(Not documented)";

/// Accumulates output lines with the current indentation and, inside a
/// comment block, the backend's comment prefix.
///
/// Lines never carry trailing whitespace, so an empty line inside a Ruby
/// comment comes out as a bare `#`.
#[derive(Debug, Clone)]
pub struct Writer {
    indentation: String,
    comment_prefix: String,
    comment_start: Option<String>,
    comment_end: Option<String>,
    level: usize,
    in_comment: bool,
    lines: Vec<String>,
}

impl Writer {
    /// Writer for line-comment languages (`"# "`).
    pub fn new(indentation: &str, comment_prefix: &str) -> Self {
        Self {
            indentation: indentation.to_string(),
            comment_prefix: comment_prefix.to_string(),
            comment_start: None,
            comment_end: None,
            level: 0,
            in_comment: false,
            lines: Vec::new(),
        }
    }

    /// Wrap comment blocks in explicit delimiters (`/**` ... ` */`).
    pub fn with_comment_delimiters(mut self, start: &str, end: &str) -> Self {
        self.comment_start = Some(start.to_string());
        self.comment_end = Some(end.to_string());
        self
    }

    /// Write one or more lines. Embedded newlines start new lines.
    pub fn puts(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.push_line("");
            return;
        }
        for line in text.lines() {
            self.push_line(line);
        }
    }

    /// Write every line of `lines`.
    pub fn puts_all<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.puts(line);
        }
    }

    pub fn blank(&mut self) {
        self.push_line("");
    }

    /// Raise the indentation level until the matching [`Writer::dedent`].
    pub fn push_indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Run `f` one indentation level deeper.
    pub fn indent(&mut self, f: impl FnOnce(&mut Self)) {
        self.push_indent();
        f(self);
        self.dedent();
    }

    /// Run `f` inside a comment block.
    pub fn comment(&mut self, f: impl FnOnce(&mut Self)) {
        if let Some(start) = self.comment_start.clone() {
            self.push_raw(&start);
        }
        let outer = std::mem::replace(&mut self.in_comment, true);
        f(self);
        self.in_comment = outer;
        if let Some(end) = self.comment_end.clone() {
            self.push_raw(&end);
        }
    }

    /// Write one line per item: the first line starts with `first_prefix`,
    /// the rest with `other_prefix`, and every line but the last ends with
    /// `separator`.
    pub fn write_array<T>(
        &mut self,
        items: &[T],
        separator: &str,
        first_prefix: &str,
        other_prefix: &str,
        mut f: impl FnMut(&T) -> String,
    ) {
        let last = items.len().saturating_sub(1);
        for (i, item) in items.iter().enumerate() {
            let prefix = if i == 0 { first_prefix } else { other_prefix };
            let sep = if i == last { "" } else { separator };
            self.push_line(&format!("{prefix}{}{sep}", f(item)));
        }
    }

    /// Write a free-text description. The first line gets `first_prefix`,
    /// continuation lines `other_prefix`. A missing description writes the
    /// bare prefix, or nothing if the prefix is blank.
    pub fn write_description(
        &mut self,
        description: Option<&str>,
        first_prefix: &str,
        other_prefix: &str,
    ) {
        let text = description.map(str::trim).filter(|d| !d.is_empty());
        match text {
            Some(text) => {
                for (i, line) in text.lines().enumerate() {
                    let prefix = if i == 0 { first_prefix } else { other_prefix };
                    self.push_line(&format!("{prefix}{}", line.trim_end()));
                }
            }
            None if !first_prefix.trim().is_empty() => self.push_line(first_prefix),
            None => {}
        }
    }

    /// Write a declaration description, or [`NOT_DOCUMENTED`].
    pub fn write_documentation(&mut self, description: Option<&str>) {
        let text = description.map(str::trim).filter(|d| !d.is_empty());
        self.write_description(Some(text.unwrap_or(NOT_DOCUMENTED)), "", "");
    }

    /// The text written so far, newline-terminated.
    pub fn output(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn push_line(&mut self, text: &str) {
        let prefix = if self.in_comment {
            self.comment_prefix.as_str()
        } else {
            ""
        };
        let line = format!("{}{prefix}{text}", self.indentation.repeat(self.level));
        self.lines.push(line.trim_end().to_string());
    }

    fn push_raw(&mut self, text: &str) {
        let line = format!("{}{text}", self.indentation.repeat(self.level));
        self.lines.push(line.trim_end().to_string());
    }
}
