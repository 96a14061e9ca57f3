//! Static import extraction for JS/TS-style sources

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    // ES imports: `import x from '...'`, `import '...'`, multi-line clauses
    static ref ES_IMPORT: Regex =
        Regex::new(r#"(?s)\bimport\s+(?:[\w$]+\s*,\s*)?(?:[\w$*{][^'"]*?\s+from\s+)?['"]([^'"]+)['"]"#)
            .unwrap();
    // Re-exports: `export { x } from '...'`, `export * from '...'`
    static ref ES_EXPORT_FROM: Regex =
        Regex::new(r#"(?s)\bexport\s+[^'";]*?\bfrom\s+['"]([^'"]+)['"]"#).unwrap();
    // CommonJS: `require('...')`
    static ref REQUIRE: Regex = Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap();
    // Dynamic imports: `import('...')`
    static ref DYNAMIC_IMPORT: Regex =
        Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap();
}

/// Extract import specifiers from a source file, in order of appearance
///
/// Matches ES imports, re-exports, CommonJS `require`, and dynamic
/// `import()`. Duplicates collapse to the first occurrence.
pub fn extract_import_specifiers(source: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut specifiers = Vec::new();

    for pattern in [&*ES_IMPORT, &*ES_EXPORT_FROM, &*REQUIRE, &*DYNAMIC_IMPORT] {
        for caps in pattern.captures_iter(source) {
            let spec = caps[1].to_string();
            if seen.insert(spec.clone()) {
                specifiers.push(spec);
            }
        }
    }
    specifiers
}

/// True when a specifier addresses a module inside the repository
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Resolve a relative specifier against the importer's directory
///
/// Tries the literal path, extension completion, and `index` files, and
/// returns the first candidate present in the snapshot. Non-relative
/// (package) specifiers resolve to `None`.
pub fn resolve_relative(
    importer: &str,
    specifier: &str,
    files: &BTreeSet<String>,
    extensions: &[String],
) -> Option<String> {
    if !is_relative(specifier) {
        return None;
    }

    let base = match importer.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{specifier}"),
        None => specifier.to_string(),
    };
    let joined = normalize_segments(&base)?;

    if files.contains(&joined) {
        return Some(joined);
    }
    for ext in extensions {
        let candidate = format!("{joined}.{ext}");
        if files.contains(&candidate) {
            return Some(candidate);
        }
    }
    for ext in extensions {
        let candidate = format!("{joined}/index.{ext}");
        if files.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Collapse `.` and `..` segments; `None` when `..` escapes the repo root
fn normalize_segments(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}
