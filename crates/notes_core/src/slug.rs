//! crates/notes_core/src/slug.rs
//!
//! Slug generation and validation.
//!
//! The default slugifier transliterates Cyrillic into Latin the way `pytils`
//! does, so a Russian title such as "Заголовок" becomes `zagolovok`.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::SLUG_MAX_LEN;
use crate::ports::Slugifier;

static DASH_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex is valid"));

static SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("static regex is valid"));

/// Transliterating slugifier for Latin and Cyrillic text.
///
/// Whitespace and dashes separate words, `&` reads as "and", and any other
/// character without a Latin spelling is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranslitSlugifier;

impl Slugifier for TranslitSlugifier {
    fn slugify(&self, text: &str) -> String {
        let text = text.replace("&amp;", " and ").replace('&', " and ");

        let mut out = String::with_capacity(text.len());
        for c in text.to_lowercase().chars() {
            if c.is_whitespace() || c == '-' {
                out.push('-');
            } else if c.is_ascii_alphanumeric() || c == '_' {
                out.push(c);
            } else if let Some(latin) = transliterate(c) {
                out.push_str(latin);
            }
        }

        DASH_RUNS
            .replace_all(&out, "-")
            .trim_matches('-')
            .to_string()
    }
}

/// Latin spelling of a lowercase Cyrillic letter.
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        // Ukrainian
        'є' => "ye",
        'і' => "i",
        'ї' => "yi",
        'ґ' => "g",
        _ => return None,
    };
    Some(latin)
}

/// Cuts a slug down to `SLUG_MAX_LEN` without leaving a dangling dash.
pub fn truncate_slug(slug: &str) -> String {
    let cut: String = slug.chars().take(SLUG_MAX_LEN).collect();
    cut.trim_end_matches('-').to_string()
}

/// Whether a caller-supplied slug only uses URL-safe characters.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_CHARS.is_match(slug)
}
