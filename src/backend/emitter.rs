use crate::utils::config::codegen::INDENT;

/// Line-oriented output buffer with an indentation level.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    output: String,
    depth: usize,
    lines: usize,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.output.push_str(INDENT);
        }
        self.output.push_str(text.as_ref());
        self.output.push('\n');
        self.lines += 1;
    }

    /// A line written at column zero regardless of the current depth.
    pub fn raw(&mut self, text: impl AsRef<str>) {
        self.output.push_str(text.as_ref());
        self.output.push('\n');
        self.lines += 1;
    }

    pub fn blank(&mut self) {
        self.output.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }

    pub fn append(&mut self, other: CodeBuffer) {
        self.output.push_str(&other.output);
        self.lines += other.lines;
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Counter-based generator for temporaries and labels.
#[derive(Debug, Default)]
pub struct NameGenerator {
    temps: usize,
    labels: usize,
}

impl NameGenerator {
    pub fn temp(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.temps);
        self.temps += 1;
        name
    }

    pub fn label(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.labels);
        self.labels += 1;
        name
    }

    pub fn temps_used(&self) -> usize {
        self.temps
    }

    pub fn labels_used(&self) -> usize {
        self.labels
    }
}
