//! Form helpers: field validation, slugs and tag lists.

use lazy_static::lazy_static;
use regex::Regex;

use super::ViewError;

lazy_static! {
    /// Runs of characters that are not allowed in a slug.
    static ref SLUG_SEPARATOR_REGEX: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Collects field errors in the order they were found. The first one is
/// the message surfaced to the user.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<(String, String)>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` when `value` is blank.
    pub fn required(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, message);
        }
        self
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push((field.into(), message.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[(String, String)] {
        &self.errors
    }

    /// `Ok(())` if nothing was recorded, else the first message.
    pub fn finish(&self) -> Result<(), ViewError> {
        match self.errors.first() {
            Some((_, message)) => Err(ViewError::Validation(message.clone())),
            None => Ok(()),
        }
    }
}

/// Lowercase the title and join its alphanumeric runs with `-`.
pub fn slugify(title: &str) -> String {
    let lower = title.trim().to_lowercase();
    SLUG_SEPARATOR_REGEX
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Split a comma-separated tag string, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}
