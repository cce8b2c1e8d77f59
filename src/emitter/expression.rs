use ahash::AHashSet;

/// Words that are never rewritten: JavaScript keywords and literals, plus the
/// request-scoped globals a controller already has in scope.
const RESERVED: &[&str] = &[
    "true", "false", "null", "undefined", "NaN", "Infinity", "new", "typeof", "instanceof", "in",
    "of", "this", "void", "delete", "var", "let", "const", "return", "function", "if", "else",
    "pdict", "request", "session", "customer", "response", "dw", "empty", "Math", "JSON", "Object",
    "Array", "String", "Number", "Boolean", "Date",
];

/// Legacy pipeline dictionary names and what they mean inside a controller.
const LEGACY_GLOBALS: &[(&str, &str)] = &[
    ("CurrentHttpParameterMap", "request.httpParameterMap"),
    ("CurrentRequest", "request"),
    ("CurrentSession", "session"),
    ("CurrentCustomer", "customer"),
    ("CurrentForms", "session.forms"),
    ("CurrentPageMetaData", "request.pageMetaData"),
];

/// Rewrites pipeline expressions so that every free variable resolves inside
/// a controller function: declared locals stay bare, legacy globals are
/// mapped and everything else is read from `pdict`.
#[derive(Debug, Clone, Default)]
pub struct ExpressionTransformer {
    extra_globals: Vec<(String, String)>,
}

impl ExpressionTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps one more legacy name. Later mappings win over the built-in ones.
    pub fn with_global(mut self, legacy: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.extra_globals.push((legacy.into(), replacement.into()));
        self
    }

    fn global(&self, name: &str) -> Option<&str> {
        self.extra_globals
            .iter()
            .rev()
            .find(|(legacy, _)| legacy == name)
            .map(|(_, replacement)| replacement.as_str())
            .or_else(|| {
                LEGACY_GLOBALS
                    .iter()
                    .find(|(legacy, _)| *legacy == name)
                    .map(|(_, replacement)| *replacement)
            })
    }

    pub fn transform(&self, expr: &str, declared: &AHashSet<String>) -> String {
        let chars: Vec<char> = expr.chars().collect();
        let mut out = String::with_capacity(expr.len() + 16);
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '\'' || c == '"' {
                let end = string_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            } else if c.is_ascii_digit() {
                let end = scan(&chars, i, |c| c.is_alphanumeric() || c == '.' || c == '_');
                out.extend(&chars[i..end]);
                i = end;
            } else if is_ident_start(c) {
                let end = scan(&chars, i, is_ident_char);
                let word: String = chars[i..end].iter().collect();
                let is_member = previous_significant(&chars, i) == Some('.');
                let is_call = next_significant(&chars, end) == Some('(');
                out.push_str(&self.rewrite(&word, is_member || is_call, declared));
                i = end;
            } else {
                out.push(c);
                i += 1;
            }
        }
        out
    }

    fn rewrite(&self, word: &str, untouched: bool, declared: &AHashSet<String>) -> String {
        if untouched || RESERVED.contains(&word) || declared.contains(word) {
            return word.to_string();
        }
        match self.global(word) {
            Some(replacement) => replacement.to_string(),
            None => format!("pdict.{}", word),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn scan(chars: &[char], start: usize, accept: impl Fn(char) -> bool) -> usize {
    let mut end = start;
    while end < chars.len() && accept(chars[end]) {
        end += 1;
    }
    end
}

/// Index one past the closing quote, or the end of input for an unterminated string.
fn string_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn previous_significant(chars: &[char], before: usize) -> Option<char> {
    chars[..before].iter().rev().find(|c| !c.is_whitespace()).copied()
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().find(|c| !c.is_whitespace()).copied()
}
