//! Argument templating for tool invocations
//!
//! Argument strings may contain `${NAME}` placeholders which are replaced
//! from a variable map before the string is split into words. Paths are
//! quoted with shell-word rules so they survive the split intact.
//!
//! ```rust
//! use std::collections::HashMap;
//! use targetline::expand_variables;
//!
//! let vars = HashMap::from([("MAIN_ASSEMBLY".to_string(), "App.exe".to_string())]);
//! let args = expand_variables("inject-dll --assembly ${MAIN_ASSEMBLY}", &vars);
//! assert_eq!(args, "inject-dll --assembly App.exe");
//! ```

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

static VAR_PATTERN: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
});

/// Expands `${VAR}` placeholders from `vars`.
///
/// Placeholders with no matching variable are left unchanged.
#[must_use]
pub fn expand_variables(input: &str, vars: &HashMap<String, String>) -> String {
    VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            match vars.get(name) {
                Some(value) => value.clone(),
                None => caps
                    .get(0)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            }
        })
        .to_string()
}

/// Names of placeholders in `input` that `vars` cannot satisfy.
#[must_use]
pub fn unresolved_variables(input: &str, vars: &HashMap<String, String>) -> Vec<String> {
    let mut missing = Vec::new();
    for cap in VAR_PATTERN.captures_iter(input) {
        if let Some(name) = cap.get(1).map(|m| m.as_str())
            && !vars.contains_key(name)
            && !missing.iter().any(|m| m == name)
        {
            missing.push(name.to_string());
        }
    }
    missing
}

/// Quotes a path so it is one word after shell-word splitting.
#[must_use]
pub fn quote_path(path: &Path) -> String {
    shell_words::quote(&path.to_string_lossy()).into_owned()
}
