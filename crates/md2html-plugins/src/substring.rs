//! Delimiter-based substring selection for included files.

use regex::Regex;

/// Delimiters selecting part of a text.
///
/// `start_with`/`end_with` keep the delimiter in the result,
/// `start_marker`/`end_marker` exclude it. The first occurrence of each
/// delimiter counts; once a start (or end) is found the other start (or
/// end) delimiter is ignored. Empty delimiters are unused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delimiters {
    pub start_with: String,
    pub end_with: String,
    pub start_marker: String,
    pub end_marker: String,
}

/// Overrides for [`Delimiters`]; `None` keeps the original value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterOverrides<'a> {
    pub start_with: Option<&'a str>,
    pub end_with: Option<&'a str>,
    pub start_marker: Option<&'a str>,
    pub end_marker: Option<&'a str>,
}

impl DelimiterOverrides<'_> {
    fn is_empty(&self) -> bool {
        self.start_with.is_none()
            && self.end_with.is_none()
            && self.start_marker.is_none()
            && self.end_marker.is_none()
    }
}

/// Selects a substring by [`Delimiters`].
#[derive(Debug, Clone)]
pub struct Substringer {
    delimiters: Delimiters,
    /// Alternation of the non-empty delimiters; `None` when all are empty.
    pattern: Option<Regex>,
}

impl Substringer {
    pub fn new(delimiters: Delimiters) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = [
            &delimiters.start_with,
            &delimiters.end_with,
            &delimiters.start_marker,
            &delimiters.end_marker,
        ]
        .into_iter()
        .filter(|d| !d.is_empty())
        .map(|d| regex::escape(d))
        .collect();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&alternatives.join("|"))?)
        };
        Ok(Self {
            delimiters,
            pattern,
        })
    }

    /// A substringer with some delimiters replaced.
    pub fn with_overrides(&self, overrides: &DelimiterOverrides<'_>) -> Result<Self, regex::Error> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }
        let pick = |value: Option<&str>, current: &String| {
            value.map_or_else(|| current.clone(), str::to_owned)
        };
        let d = &self.delimiters;
        Self::new(Delimiters {
            start_with: pick(overrides.start_with, &d.start_with),
            end_with: pick(overrides.end_with, &d.end_with),
            start_marker: pick(overrides.start_marker, &d.start_marker),
            end_marker: pick(overrides.end_marker, &d.end_marker),
        })
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Select the delimited part of `text`.
    ///
    /// Returns `""` when a configured start delimiter is missing or the end
    /// comes before the start. Without delimiters `text` is returned whole.
    pub fn substring<'t>(&self, text: &'t str) -> &'t str {
        let Some(pattern) = &self.pattern else {
            return text;
        };
        let d = &self.delimiters;

        let mut start = 0;
        let mut end = text.len();
        let mut start_found = false;
        let mut end_found = false;

        for found in pattern.find_iter(text) {
            let matched = found.as_str();
            if !start_found && matched == d.start_with {
                start_found = true;
                start = found.start();
            } else if !end_found && matched == d.end_with {
                end_found = true;
                end = found.end();
            } else if !start_found && matched == d.start_marker {
                start_found = true;
                start = found.end();
            } else if !end_found && matched == d.end_marker {
                end_found = true;
                end = found.start();
            }
        }

        let start_required = !d.start_with.is_empty() || !d.start_marker.is_empty();
        if start_required && !start_found {
            return "";
        }
        if start <= end { &text[start..end] } else { "" }
    }
}
