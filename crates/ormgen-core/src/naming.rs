//! Identifier normalization shared by models, properties and aliases.
//!
//! Every helper works on snake_case word lists internally so catalog names in
//! either `snake_case` or `camelCase` produce the same output.

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Singularize the last word of an identifier (`user_roles` -> `user_role`).
pub fn singularize(word: &str) -> String {
    inflect_last_word(word, 1)
}

/// Pluralize the last word of an identifier (`user_role` -> `user_roles`).
pub fn pluralize(word: &str) -> String {
    inflect_last_word(word, 2)
}

fn inflect_last_word(word: &str, count: isize) -> String {
    let snake = word.to_snake_case();
    if snake.is_empty() {
        return snake;
    }

    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralizer::pluralize(last, count, false)),
        None => pluralizer::pluralize(&snake, count, false),
    }
}

/// Strip a trailing identifier suffix from a column name.
///
/// `userId` and `user_id` both become `user`; a bare `id` becomes empty.
pub fn omit_id_suffix(name: &str) -> String {
    let snake = name.to_snake_case();
    if snake == "id" {
        return String::new();
    }
    match snake.strip_suffix("_id") {
        Some(stripped) => stripped.to_string(),
        None => snake,
    }
}

/// Property name for a column (`created_at` -> `createdAt`).
pub fn property_name(column: &str) -> String {
    column.to_lower_camel_case()
}

/// Model name for a table (`user_roles` -> `UserRole`).
pub fn model_name(table: &str) -> String {
    singularize(table).to_upper_camel_case()
}

/// Host type name for a user-defined type or synthesized structure.
pub fn type_name(raw: &str) -> String {
    raw.to_upper_camel_case()
}

/// Join alias parts into one lowerCamelCase token, skipping empty parts.
pub fn compose_alias<S: AsRef<str>>(parts: &[S]) -> String {
    let mut alias = String::new();
    for part in parts.iter().map(AsRef::as_ref).filter(|p| !p.is_empty()) {
        if alias.is_empty() {
            alias.push_str(&part.to_lower_camel_case());
        } else {
            alias.push_str(&part.to_upper_camel_case());
        }
    }
    alias
}

/// File-name friendly slug (`public.user_roles` -> `public-user-roles`).
pub fn slug(raw: &str) -> String {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_snake_case().replace('_', "-"))
        .collect::<Vec<_>>()
        .join("-")
}
