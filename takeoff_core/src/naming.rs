//! Name normalization shared by material lookup, rate lookup and BOQ keys.
//!
//! Configuration files are hand-written and spell the same thing several
//! ways ("Cement", "cement ", "Cément"; "Bags" vs "bag"). Everything that
//! matches names goes through these helpers.

use deunicode::deunicode;

/// Case-, accent- and whitespace-insensitive form of a name.
///
/// ```rust
/// use takeoff_core::naming::normalize_name;
///
/// assert_eq!(normalize_name("  Électrical   Work "), "electrical work");
/// ```
pub fn normalize_name(name: &str) -> String {
    deunicode(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

/// Singular, normalized unit name: "Bags" -> "bag", "Nos." -> "no", "cuft" stays.
pub fn singular_unit(unit: &str) -> String {
    let unit = normalize_name(unit);
    let unit = unit.trim_end_matches('.');
    if unit.len() > 2 && unit.ends_with("ies") {
        return format!("{}y", &unit[..unit.len() - 3]);
    }
    if unit.len() > 1 && unit.ends_with('s') && !unit.ends_with("ss") {
        return unit[..unit.len() - 1].to_string();
    }
    unit.to_string()
}

/// Consolidation key for a material measured in a unit.
pub fn item_key(material: &str, unit: &str) -> (String, String) {
    (normalize_name(material), singular_unit(unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Cement"), "cement");
        assert_eq!(normalize_name("Plumbing"), normalize_name(" plumbing "));
        assert!(names_match("Électrical Work", "electrical work"));
    }

    #[test]
    fn test_singular_unit() {
        assert_eq!(singular_unit("Bags"), "bag");
        assert_eq!(singular_unit("bag"), "bag");
        assert_eq!(singular_unit("Nos."), "no");
        assert_eq!(singular_unit("cuft"), "cuft");
        assert_eq!(singular_unit("Litres"), "litre");
        assert_eq!(singular_unit("Brass"), "brass");
        assert_eq!(singular_unit("Lorries"), "lorry");
    }

    #[test]
    fn test_item_key() {
        assert_eq!(item_key("Sand ", "CFTs"), item_key("sand", "cft"));
        assert_ne!(item_key("Sand", "cft"), item_key("Sand", "brass"));
    }
}
