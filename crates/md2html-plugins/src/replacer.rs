//! Positional replacement templates.
//!
//! A template is plain text with `${N}` placeholders (1-based, whitespace
//! inside the braces allowed). `$$` produces a literal `$`; a `$` not
//! followed by `{` or `$` is kept as is.

/// Template parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Replacement position is not a number: {0}")]
    NotANumber(String),
    #[error("Replacement position is less than 1: {0}")]
    LessThanOne(i64),
    #[error("Matching closing brace not found: }}")]
    UnclosedBrace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    /// Zero-based value index.
    Position(usize),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacer {
    parts: Vec<Part>,
}

impl Replacer {
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                text.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    text.push('$');
                }
                Some('{') => {
                    chars.next();
                    let mut token = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        token.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedBrace);
                    }
                    let position = parse_position(token.trim())?;
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    parts.push(Part::Position(position));
                }
                _ => text.push('$'),
            }
        }
        if !text.is_empty() {
            parts.push(Part::Text(text));
        }
        Ok(Self { parts })
    }

    /// Fill the template; positions past the end of `values` become empty.
    pub fn replace<S: AsRef<str>>(&self, values: &[S]) -> String {
        let mut output = String::new();
        for part in &self.parts {
            match part {
                Part::Text(text) => output.push_str(text),
                Part::Position(index) => {
                    if let Some(value) = values.get(*index) {
                        output.push_str(value.as_ref());
                    }
                }
            }
        }
        output
    }
}

fn parse_position(token: &str) -> Result<usize, TemplateError> {
    let position: i64 = token
        .parse()
        .map_err(|_| TemplateError::NotANumber(token.to_owned()))?;
    if position < 1 {
        return Err(TemplateError::LessThanOne(position));
    }
    usize::try_from(position - 1).map_err(|_| TemplateError::NotANumber(token.to_owned()))
}
