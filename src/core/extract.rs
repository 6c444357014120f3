//! Lexical extractors and keyword predicates
//!
//! Pure text -> typed-value functions the state machine consults before it
//! considers delegating a turn to the LLM. Everything here is total: an
//! extraction miss is an `Option::None` or a default, never an error.

use crate::config::menu::SizeSpec;

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

const PIZZA_KEYWORDS: &[&str] = &["pizza", "pie", "piza", "picza", "pizz", "slice"];

const MENU_KEYWORDS: &[&str] = &[
    "list",
    "menu",
    "have",
    "available",
    "options",
    "flavors",
    "flavours",
    "all",
];

const DONE_WORDS: &[&str] = &["no", "nope", "done", "finish", "nothing", "bas", "enough"];
const DONE_PHRASES: &[&str] = &["that's all", "thats all"];

const AFFIRMATIVE_WORDS: &[&str] = &["yes", "correct", "confirm"];

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye", "cancel"];

const INQUIRY_WORDS: &[&str] = &["cart", "basket"];
const INQUIRY_PHRASES: &[&str] = &[
    "what i ordered",
    "my order",
    "what did i order",
    "what have i ordered",
    "check order",
];

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn contains_word(text: &str, word: &str) -> bool {
    tokens(text).iter().any(|t| t == word)
}

/// First standalone digit token, else a number word, else 1. Total: any
/// input yields an integer >= 1.
pub fn extract_quantity(text: &str) -> u32 {
    for token in tokens(text) {
        if let Ok(n) = token.parse::<u32>() {
            if n >= 1 {
                return n;
            }
        }
    }
    let lower = text.to_lowercase();
    for (word, n) in NUMBER_WORDS {
        if lower.contains(word) {
            return *n;
        }
    }
    1
}

/// Lowercase substring containment against the flavor vocabulary; first
/// match wins, returning the menu-exact name.
pub fn detect_flavor(text: &str, flavors: &[String]) -> Option<String> {
    let lower = text.to_lowercase();
    flavors
        .iter()
        .find(|flavor| lower.contains(&flavor.to_lowercase()))
        .cloned()
}

/// Resolve a size mention to its canonical form. Typo aliases are checked
/// first, longest key first, so "extra large" wins over "large"; canonical
/// tokens are checked after.
pub fn detect_size<'a>(
    text: &str,
    sizes: &'a [SizeSpec],
    aliases: &[(&str, &str)],
) -> Option<&'a SizeSpec> {
    let lower = text.to_lowercase();

    let mut sorted: Vec<&(&str, &str)> = aliases.iter().collect();
    sorted.sort_by_key(|(alias, _)| std::cmp::Reverse(alias.len()));

    for (alias, canonical) in sorted {
        if lower.contains(alias) {
            return sizes.iter().find(|s| s.canonical == *canonical);
        }
    }

    sizes.iter().find(|s| lower.contains(s.canonical))
}

pub fn is_valid_address(address: &str) -> bool {
    address.len() >= 5 && !address.contains("...")
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() >= 9 && phone.chars().any(|c| c.is_ascii_digit())
}

/// 9-15 contiguous digits after stripping spaces and dashes. A longer run is
/// truncated to 15.
pub fn extract_phone_digits(text: &str) -> Option<String> {
    let stripped: String = text.chars().filter(|c| *c != ' ' && *c != '-').collect();

    let mut run = String::new();
    for c in stripped.chars().chain(std::iter::once('\0')) {
        if c.is_ascii_digit() {
            run.push(c);
        } else {
            if run.len() >= 9 {
                run.truncate(15);
                return Some(run);
            }
            run.clear();
        }
    }
    None
}

pub fn is_pizza_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    PIZZA_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Menu inquiries are keyword-matched on word boundaries; "what" alone is too
/// broad and only counts next to menu/have/available.
pub fn is_menu_inquiry(text: &str) -> bool {
    let lower = text.to_lowercase();
    if MENU_KEYWORDS.iter().any(|k| contains_word(&lower, k)) {
        return true;
    }
    if lower.contains("tell me") {
        return true;
    }
    contains_word(&lower, "what")
        && ["menu", "have", "available"]
            .iter()
            .any(|k| contains_word(&lower, k))
}

/// "all" qualifier on a menu inquiry: list every flavor instead of a
/// truncated preview.
pub fn wants_full_list(text: &str) -> bool {
    contains_word(text, "all")
}

pub fn is_done_signal(text: &str) -> bool {
    let lower = text.to_lowercase();
    DONE_WORDS.iter().any(|w| contains_word(&lower, w))
        || DONE_PHRASES.iter().any(|p| lower.contains(p))
}

pub fn is_affirmative(text: &str) -> bool {
    AFFIRMATIVE_WORDS.iter().any(|w| contains_word(text, w))
}

/// Exit keywords are matched on the whole utterance, not as substrings, so
/// "cancel the cola" does not hang up the call.
pub fn is_exit(text: &str) -> bool {
    let trimmed = text.trim().to_lowercase();
    EXIT_WORDS.iter().any(|w| trimmed == *w)
}

pub fn is_order_inquiry(text: &str) -> bool {
    let lower = text.to_lowercase();
    INQUIRY_WORDS.iter().any(|w| contains_word(&lower, w))
        || INQUIRY_PHRASES.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::menu::{MenuCatalog, SIZES, SIZE_ALIASES};

    #[test]
    fn quantity_prefers_digit_tokens() {
        assert_eq!(extract_quantity("give me 3 pizzas"), 3);
        assert_eq!(extract_quantity("two large pies"), 2);
        assert_eq!(extract_quantity("a pizza please"), 1);
    }

    #[test]
    fn quantity_is_total() {
        assert_eq!(extract_quantity(""), 1);
        assert_eq!(extract_quantity("!!!???"), 1);
        assert_eq!(extract_quantity("0 pizzas"), 1);
        assert_eq!(extract_quantity("99999999999999999999 pizzas"), 1);
    }

    #[test]
    fn flavor_returns_menu_exact_name() {
        let catalog = MenuCatalog::sample();
        assert_eq!(
            detect_flavor("two chicken surprise pizzas", catalog.flavors()),
            Some("Chicken Surprise".to_string())
        );
        assert_eq!(detect_flavor("plain cheese", catalog.flavors()), None);
    }

    #[test]
    fn extra_large_beats_large() {
        let size = detect_size("extra large pepperoni", SIZES, SIZE_ALIASES).unwrap();
        assert_eq!(size.canonical, "xxl");
    }

    #[test]
    fn typo_sizes_resolve() {
        for (text, want) in [
            ("larj one please", "large"),
            ("make it med", "medium"),
            ("normal is fine", "regular"),
            ("xl", "xxl"),
            ("small thanks", "small"),
        ] {
            let size = detect_size(text, SIZES, SIZE_ALIASES).unwrap();
            assert_eq!(size.canonical, want, "{text}");
        }
        assert!(detect_size("surprise me", SIZES, SIZE_ALIASES).is_none());
    }

    #[test]
    fn address_and_phone_validity() {
        assert!(is_valid_address("12 Baker Street"));
        assert!(!is_valid_address("abc"));
        assert!(!is_valid_address("123 Main ... Street"));

        assert!(is_valid_phone("03001234567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("no digits here"));
    }

    #[test]
    fn phone_digit_runs() {
        assert_eq!(
            extract_phone_digits("my number is 0300 1234567"),
            Some("03001234567".to_string())
        );
        assert_eq!(
            extract_phone_digits("call 0300-123-4567 ok"),
            Some("03001234567".to_string())
        );
        assert_eq!(extract_phone_digits("call 12345"), None);
        assert_eq!(
            extract_phone_digits("12345678901234567890"),
            Some("123456789012345".to_string())
        );
    }

    #[test]
    fn request_predicates() {
        assert!(is_pizza_request("one piza pls"));
        assert!(is_pizza_request("a slice of heaven"));
        assert!(!is_pizza_request("a burger"));

        assert!(is_menu_inquiry("what do you have"));
        assert!(is_menu_inquiry("show me the menu"));
        assert!(is_menu_inquiry("tell me your flavors"));
        assert!(!is_menu_inquiry("what is your name"));

        assert!(wants_full_list("tell me all of them"));
        assert!(!wants_full_list("tell me some"));
    }

    #[test]
    fn turn_keyword_sets() {
        assert!(is_done_signal("that's all"));
        assert!(is_done_signal("nothing else"));
        assert!(is_done_signal("bas"));
        assert!(!is_done_signal("i know what i want"));

        assert!(is_affirmative("yes please"));
        assert!(is_affirmative("that is correct"));
        assert!(!is_affirmative("yesterday"));

        assert!(is_exit("  CANCEL "));
        assert!(!is_exit("cancel the cola"));

        assert!(is_order_inquiry("what's in my cart?"));
        assert!(is_order_inquiry("what did i order"));
        assert!(!is_order_inquiry("a carton of juice"));
    }
}
