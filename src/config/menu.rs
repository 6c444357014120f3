//! Menu catalog loaded from a TOML file
//!
//! The catalog is read once at startup and is immutable for the lifetime of
//! every session. It supplies the extractors and the validator with their
//! vocabularies: the category -> items mapping, the flavor list derived from
//! pizza-like categories, and the size vocabulary with its typo aliases.
//!
//! # Example Menu File
//!
//! ```toml
//! [[category]]
//! name = "Pizza Flavors"
//! items = ["Chicken Surprise", "Jamaican BBQ", "Chicago Bold Fold"]
//!
//! [[category]]
//! name = "Drinks"
//! items = ["Cola", "Lemonade"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A canonical size token plus the label used in summaries and the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    pub canonical: &'static str,
    pub label: &'static str,
}

/// Size vocabulary, smallest to largest.
pub const SIZES: &[SizeSpec] = &[
    SizeSpec { canonical: "small", label: "Small" },
    SizeSpec { canonical: "regular", label: "Regular" },
    SizeSpec { canonical: "medium", label: "Medium" },
    SizeSpec { canonical: "large", label: "Large" },
    SizeSpec { canonical: "xxl", label: "XXL" },
];

/// Typo and alias forms mapped to canonical sizes. Matched longest-key-first
/// so "extra large" resolves before "large" gets a chance to.
pub const SIZE_ALIASES: &[(&str, &str)] = &[
    ("extra large", "xxl"),
    ("smal", "small"),
    ("sml", "small"),
    ("reg", "regular"),
    ("normal", "regular"),
    ("med", "medium"),
    ("medum", "medium"),
    ("larj", "large"),
    ("larg", "large"),
    ("lrg", "large"),
    ("xl", "xxl"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MenuFile {
    #[serde(default)]
    category: Vec<CategoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryEntry {
    name: String,
    #[serde(default)]
    items: Vec<String>,
}

/// One menu category with its item names in menu order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<String>,
}

/// Immutable menu catalog with derived lookup vocabularies.
#[derive(Debug, Clone)]
pub struct MenuCatalog {
    categories: Vec<Category>,
    flavors: Vec<String>,
    items_flat: HashSet<String>,
}

impl MenuCatalog {
    /// Load the catalog from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, MenuError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load the catalog from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, MenuError> {
        let file: MenuFile = toml::from_str(content)?;
        Self::build(file)
    }

    fn build(file: MenuFile) -> Result<Self, MenuError> {
        if file.category.is_empty() {
            return Err(MenuError::Validation("menu has no categories".into()));
        }

        let mut categories = Vec::new();
        let mut flavors = Vec::new();
        let mut items_flat = HashSet::new();

        for entry in file.category {
            let name = entry.name.trim().to_string();
            if name.is_empty() {
                return Err(MenuError::Validation("category with empty name".into()));
            }

            let items: Vec<String> = entry
                .items
                .iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect();

            for item in &items {
                items_flat.insert(item.to_lowercase());
            }
            if Self::is_pizza_category(&name) {
                flavors.extend(items.iter().cloned());
            }

            categories.push(Category { name, items });
        }

        Ok(Self {
            categories,
            flavors,
            items_flat,
        })
    }

    /// Categories whose items are pizza flavors and whose line items need a size.
    pub fn is_pizza_category(name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.contains("pizza") || lower.contains("flavor")
    }

    pub fn requires_size(&self, category: &str) -> bool {
        Self::is_pizza_category(category)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Flavor vocabulary: menu-exact names in menu order. Callers relying on
    /// substring specificity must keep the menu file ordered accordingly.
    pub fn flavors(&self) -> &[String] {
        &self.flavors
    }

    pub fn contains_item(&self, name: &str) -> bool {
        self.items_flat.contains(&name.to_lowercase())
    }

    pub fn size_label(canonical: &str) -> Option<&'static str> {
        SIZES
            .iter()
            .find(|s| s.canonical == canonical)
            .map(|s| s.label)
    }

    /// Comma-joined size labels for prompts ("Small, Regular, ... XXL").
    pub fn size_menu() -> String {
        SIZES
            .iter()
            .map(|s| s.label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// A small fixed catalog for tests.
    #[cfg(test)]
    pub fn sample() -> Self {
        Self::from_str(SAMPLE_MENU).expect("sample menu parses")
    }
}

#[cfg(test)]
pub const SAMPLE_MENU: &str = r#"
[[category]]
name = "Pizza Flavors"
items = [
    "Chicken Surprise",
    "Jamaican BBQ",
    "Chicago Bold Fold",
    "Pepperoni Classic",
    "Veggie Garden",
    "Hot n Spicy",
    "Four Cheese",
    "Smoked Sicilian",
    "Margherita",
]

[[category]]
name = "Drinks"
items = ["Cola", "Lemonade"]
"#;

/// Menu loading errors
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
