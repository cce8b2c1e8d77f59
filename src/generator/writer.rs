/// Line-oriented source buffer. Indentation depth is supplied per line so the
/// generator can pass it down its recursion by value.
#[derive(Debug, Clone)]
pub(super) struct CodeWriter<'a> {
    out: String,
    indent: &'a str,
}

impl<'a> CodeWriter<'a> {
    pub(super) fn new(indent: &'a str) -> Self {
        Self {
            out: String::new(),
            indent,
        }
    }

    pub(super) fn line(&mut self, depth: usize, text: &str) {
        if text.is_empty() {
            self.blank();
            return;
        }
        for _ in 0..depth {
            self.out.push_str(self.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub(super) fn blank(&mut self) {
        self.out.push('\n');
    }

    pub(super) fn append(&mut self, other: CodeWriter<'_>) {
        self.out.push_str(&other.out);
    }

    pub(super) fn finish(self) -> String {
        self.out
    }
}
