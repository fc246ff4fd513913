#![deny(missing_docs)]

//! # Identifier Sanitization
//!
//! Pure string transforms turning schema and operation names from the source
//! document into usable target-language identifiers.
//!
//! Handles:
//! - Reserved-word escaping (`class` → `__openAPI__class`).
//! - Camel-case conversion of `-`/`_`/space/`.` separators.
//! - Stripping of path/extension-style prefixes from reference-derived names.
//! - Romanization of CJK names via pinyin, since some documents use the
//!   home-locale text as the only unique key for a definition.

use pinyin::ToPinyin;

/// Reserved and strict-mode ECMAScript words the target language rejects as
/// identifiers. Matches the dictionary the escaping markers were designed for.
const RESERVED_WORDS: &[&str] = &[
    "abstract",
    "arguments",
    "await",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "double",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "function",
    "goto",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "int",
    "interface",
    "let",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "volatile",
    "while",
    "with",
    "yield",
];

/// Code-point band that forces the romanization fallback. Covers the CJK
/// characters the charset filter lets through.
const CJK_BAND: std::ops::RangeInclusive<char> = '\u{3220}'..='\u{FA29}';

/// CJK characters preserved by the identifier charset filter.
const CJK_KEPT: std::ops::RangeInclusive<char> = '\u{4e00}'..='\u{9fa5}';

fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Uppercases the first character of `s`.
pub(crate) fn to_first_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Converts `-`, `_`, space and `.` separators into camel-case boundaries.
/// A separator is only consumed when a word character follows it.
fn strip_separators(s: &str, separators: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if separators.contains(&c) {
            match chars.peek() {
                Some(&next) if is_word_char(next) => {
                    chars.next();
                    out.extend(next.to_uppercase());
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }

    out
}

/// Lossy, order-preserving romanization. Characters without a pinyin reading
/// pass through unchanged.
fn transliterate(s: &str) -> String {
    let mut out = String::new();
    for (c, reading) in s.chars().zip(s.to_pinyin()) {
        match reading {
            Some(p) => out.push_str(p.plain()),
            None => out.push(c),
        }
    }
    out
}

/// Sanitizes a schema/definition name into a usable type identifier.
///
/// Never fails; always returns a usable identifier:
/// 1. Reserved words are escaped with the `__openAPI__` marker.
/// 2. Only the last `/`- and `.`-delimited segment of reference-derived
///    names is kept.
/// 3. `-`/`_`/space separators become camel-case boundaries.
/// 4. Characters outside the identifier charset are removed, except CJK.
/// 5. Purely numeric names (or the bare `_`) receive the `Pinyin_` marker.
/// 6. Names still containing CJK characters are romanized.
pub fn sanitize_type_name(raw: &str) -> String {
    if is_reserved(raw) {
        return format!("__openAPI__{}", raw);
    }

    let last_segment = raw
        .rsplit('/')
        .next()
        .unwrap_or(raw)
        .rsplit('.')
        .next()
        .unwrap_or(raw);

    let name: String = strip_separators(last_segment, &['-', '_', ' '])
        .chars()
        .filter(|c| is_word_char(*c) || c.is_whitespace() || CJK_KEPT.contains(c))
        .collect();

    // A bare underscore or digit sequence is not a valid identifier; these
    // come from documents keyed by locale text or numeric ids.
    if name == "_" || (!name.is_empty() && name.chars().all(|c| c.is_ascii_digit())) {
        return format!("Pinyin_{}", name);
    }

    if !name.chars().any(|c| CJK_BAND.contains(&c)) {
        return name;
    }

    let no_blank: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    transliterate(&no_blank)
}

/// Sanitizes an operation id into a usable function identifier.
///
/// Truncates generator-style `Using<METHOD>` suffixes; if the remainder is a
/// reserved word, the `Using<METHOD>` suffix is re-appended (uppercased) to
/// disambiguate instead of the type-name marker.
pub fn sanitize_operation_name(raw: &str, method: &str) -> String {
    let camel = strip_separators(raw, &['-', '_', ' ', '.']);

    let name = match camel.find("Using") {
        Some(index) => &camel[..index],
        None => camel.as_str(),
    };

    if is_reserved(name) {
        return format!("{}Using{}", name, method.to_uppercase());
    }

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_type_name_is_escaped() {
        assert_eq!(sanitize_type_name("class"), "__openAPI__class");
        assert_eq!(sanitize_type_name("interface"), "__openAPI__interface");
    }

    #[test]
    fn test_last_segment_is_kept() {
        assert_eq!(sanitize_type_name("#/definitions/Pet"), "Pet");
        assert_eq!(sanitize_type_name("models.user.Profile"), "Profile");
    }

    #[test]
    fn test_separators_become_camel_boundaries() {
        assert_eq!(sanitize_type_name("user_profile"), "userProfile");
        assert_eq!(sanitize_type_name("user-profile card"), "userProfileCard");
    }

    #[test]
    fn test_punctuation_is_stripped() {
        assert_eq!(sanitize_type_name("Map«string,object»"), "Mapstringobject");
    }

    #[test]
    fn test_numeric_name_gets_marker() {
        assert_eq!(sanitize_type_name("123"), "Pinyin_123");
        assert_eq!(sanitize_type_name("_"), "Pinyin__");
    }

    #[test]
    fn test_cjk_name_is_romanized() {
        assert_eq!(sanitize_type_name("用户"), "yonghu");
    }

    #[test]
    fn test_mixed_cjk_keeps_ascii() {
        let name = sanitize_type_name("用户Model");
        assert_eq!(name, "yonghuModel");
    }

    #[test]
    fn test_operation_name_strips_using_suffix() {
        assert_eq!(sanitize_operation_name("getPetUsingGET", "get"), "getPet");
    }

    #[test]
    fn test_operation_name_camel_cases_dots() {
        assert_eq!(
            sanitize_operation_name("pet.store_list", "get"),
            "petStoreList"
        );
    }

    #[test]
    fn test_reserved_operation_name_appends_method() {
        assert_eq!(sanitize_operation_name("delete", "post"), "deleteUsingPOST");
    }
}
