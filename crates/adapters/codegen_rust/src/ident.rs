//! Rust spelling of model identifiers.

/// Strict and reserved keywords of Rust 2024.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const NOT_RAW: &[&str] = &["crate", "self", "super"];

/// `FriendlyName` → `friendly_name`, `E_1stFloor` → `e_1st_floor`.
#[must_use]
pub fn to_snake_case(identifier: &str) -> String {
    let mut snake = String::with_capacity(identifier.len() + 4);
    let mut previous: Option<char> = None;
    for c in identifier.chars() {
        if c.is_ascii_uppercase() {
            if previous.is_some_and(|p| p != '_') {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
        previous = Some(c);
    }
    snake
}

/// Method or field name for a model identifier.
#[must_use]
pub fn member_name(identifier: &str) -> String {
    let snake = to_snake_case(identifier);
    if NOT_RAW.contains(&snake.as_str()) {
        format!("{snake}_")
    } else if KEYWORDS.contains(&snake.as_str()) {
        format!("r#{snake}")
    } else {
        snake
    }
}
