//! Marks quick-filter matches in rendered cells

use regex::{Regex, RegexBuilder};
use std::borrow::Cow;

/// Wraps every case-insensitive occurrence of a search term.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
    before: String,
    after: String,
}

impl Highlighter {
    /// An empty search highlights nothing. The term is matched literally.
    pub fn new(search: &str, before: &str, after: &str) -> Self {
        let pattern = if search.is_empty() {
            None
        } else {
            RegexBuilder::new(&format!("({})", regex::escape(search)))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Highlighter {
            pattern,
            before: before.to_string(),
            after: after.to_string(),
        }
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.pattern {
            Some(pattern) => {
                let replacement = format!(
                    "{}${{1}}{}",
                    self.before.replace('$', "$$"),
                    self.after.replace('$', "$$")
                );
                pattern.replace_all(text, replacement.as_str())
            }
            None => Cow::Borrowed(text),
        }
    }
}
