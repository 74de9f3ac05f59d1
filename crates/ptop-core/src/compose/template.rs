//! Minimal `{{name}}` placeholder templates.
//!
//! PromQL uses single braces for label matchers, so only doubled braces
//! open a placeholder. Parsing is strict: an unterminated or empty
//! placeholder is an error, as is rendering with a missing variable.

use thiserror::Error;

/// Errors from parsing or rendering a query template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("unterminated placeholder at byte {offset} in template {template:?}")]
    Unterminated { template: String, offset: usize },

    #[error("empty placeholder at byte {offset} in template {template:?}")]
    EmptyPlaceholder { template: String, offset: usize },

    #[error("template {template:?} references unknown placeholder {{{{{name}}}}}")]
    UnknownPlaceholder { template: String, name: String },

    #[error("template {template:?} must reference {{{{{name}}}}} exactly once, found {count}")]
    PlaceholderCount {
        template: String,
        name: String,
        count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, ComposeError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut consumed = 0usize;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];
            let close = after_open.find("}}").ok_or_else(|| ComposeError::Unterminated {
                template: source.to_string(),
                offset: consumed + open,
            })?;
            let name = after_open[..close].trim();
            if name.is_empty() {
                return Err(ComposeError::EmptyPlaceholder {
                    template: source.to_string(),
                    offset: consumed + open,
                });
            }
            segments.push(Segment::Placeholder(name.to_string()));

            let advance = open + 2 + close + 2;
            consumed += advance;
            rest = &rest[advance..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Number of times `name` is referenced.
    pub fn count(&self, name: &str) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Placeholder(n) if n == name))
            .count()
    }

    /// Fail unless `name` appears exactly once.
    pub fn require_once(&self, name: &str) -> Result<(), ComposeError> {
        let count = self.count(name);
        if count == 1 {
            Ok(())
        } else {
            Err(ComposeError::PlaceholderCount {
                template: self.source.clone(),
                name: name.to_string(),
                count,
            })
        }
    }

    /// Substitute variables. Unused variables are fine; unknown placeholders
    /// are not.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, ComposeError> {
        let mut out = String::with_capacity(self.source.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = vars
                        .iter()
                        .find(|(k, _)| *k == name.as_str())
                        .map(|(_, v)| *v)
                        .ok_or_else(|| ComposeError::UnknownPlaceholder {
                            template: self.source.clone(),
                            name: name.clone(),
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}
