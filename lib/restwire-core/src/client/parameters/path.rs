use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::warn;

use crate::client::error::{ValidationError, ValidationRule};

/// Regular expression for matching path parameters in the format `{param_name}`.
static RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?<name>[^{}/]+)}").expect("a valid regex"));

fn replace_path_param(path: &str, param_name: &str, value: &str) -> String {
    let pattern = ["{", param_name, "}"].concat();
    path.replace(&pattern, value)
}

/// Lists the placeholder names of a path template, in order of first appearance.
pub(in crate::client) fn placeholders(template: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    RE.captures_iter(template)
        .filter_map(|caps| caps.name("name"))
        .map(|found| found.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// A path template with all of its placeholders substituted.
#[derive(Debug)]
pub(in crate::client) struct PathResolved {
    pub(in crate::client) path: String,
}

impl PathResolved {
    /// Substitutes already encoded values into the template.
    ///
    /// The same placeholder can appear several times. Values without a matching
    /// placeholder are ignored with a warning; a placeholder left without a value
    /// fails with [`ValidationRule::UnresolvedPlaceholder`].
    pub(in crate::client) fn resolve(
        template: &str,
        values: &IndexMap<&str, String>,
    ) -> Result<Self, ValidationError> {
        let names = placeholders(template);
        for name in values.keys() {
            if !names.contains(name) {
                warn!(?name, "argument name not found in path template");
            }
        }

        if let Some(missing) = names.iter().find(|name| !values.contains_key(*name)) {
            return Err(ValidationError::new(
                ValidationRule::UnresolvedPlaceholder,
                *missing,
            ));
        }

        let mut path = template.to_string();
        for name in &names {
            if let Some(value) = values.get(name) {
                path = replace_path_param(&path, name, value);
            }
        }
        Ok(Self { path })
    }
}
