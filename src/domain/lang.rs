//! Spanish plural/singular rules
//!
//! Used to derive default attribute names from collection names, e.g. the id
//! attribute of each item in a `proveedores` array field is `proveedorId`.

use regex::Regex;
use std::sync::OnceLock;

type Rules = Vec<(Regex, &'static str)>;

fn compile(rules: &[(&str, &'static str)]) -> Rules {
    rules
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), *replacement))
        .collect()
}

fn plural_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            (r"^(yo|no)$", "${1}es"),
            (r"^(.*)(ón)$", "${1}ones"),
            (r"^(.*)(án)$", "${1}anes"),
            (r"^(.*)(i|u|í|l|r|n|d|z|j)$", "${1}${2}es"),
            (r"^(.*)$", "${1}s"),
        ])
    })
}

fn singular_rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        compile(&[
            (r"^(yo|no)es$", "${1}"),
            (r"^(.*)(ones)$", "${1}ón"),
            (r"^(.*)(anes)$", "${1}án"),
            (r"^(.*)(i|u|í|l|r|n|d|z|j)es$", "${1}${2}"),
            (r"^(.*)s$", "${1}"),
        ])
    })
}

fn apply(rules: &Rules, word: &str) -> String {
    for (regex, replacement) in rules {
        if regex.is_match(word) {
            return regex.replace(word, *replacement).into_owned();
        }
    }
    word.to_string()
}

/// Plural form of a Spanish word.
///
/// ```
/// use crudkit::domain::lang::plural;
///
/// assert_eq!(plural("canción"), "canciones");
/// assert_eq!(plural("coraza"), "corazas");
/// ```
pub fn plural(singular: &str) -> String {
    apply(plural_rules(), singular)
}

/// Singular form of a Spanish word.
///
/// ```
/// use crudkit::domain::lang::singular;
///
/// assert_eq!(singular("plurales"), "plural");
/// assert_eq!(singular("customers"), "customer");
/// ```
pub fn singular(plural: &str) -> String {
    apply(singular_rules(), plural)
}
