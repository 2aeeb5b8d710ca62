//! Enchantment valuation for listings.
//!
//! A listing's lore names its enchantments as `Name <roman level>` entries, separated by
//! commas or line breaks. Each one maps to a bazaar product such as
//! `ENCHANTMENT_SHARPNESS_5`, whose best buy price is its value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One named, leveled sub-component of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    /// 1..=10, or 0 when the numeral was not recognized.
    pub level: u8,
}

impl Component {
    /// Bazaar product id, or `None` for an unrecognized level.
    pub fn product_id(&self) -> Option<String> {
        if self.level == 0 {
            return None;
        }
        let name = self
            .name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .replace('-', "_")
            .to_uppercase();
        Some(format!("ENCHANTMENT_{}_{}", name, self.level))
    }
}

/// Best known order-book buy price per product id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentPriceBook {
    prices: HashMap<String, f64>,
}

impl ComponentPriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product_id: impl Into<String>, price: f64) {
        self.prices.insert(product_id.into(), price);
    }

    pub fn price(&self, product_id: &str) -> Option<f64> {
        self.prices.get(product_id).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Map a Roman numeral I..X to its value; anything else is 0.
pub fn roman_to_level(numeral: &str) -> u8 {
    match numeral {
        "I" => 1,
        "II" => 2,
        "III" => 3,
        "IV" => 4,
        "V" => 5,
        "VI" => 6,
        "VII" => 7,
        "VIII" => 8,
        "IX" => 9,
        "X" => 10,
        _ => 0,
    }
}

/// Remove `§x` formatting codes.
pub fn strip_formatting(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_entry(entry: &str) -> Option<Component> {
    let (name, numeral) = entry.trim().rsplit_once(char::is_whitespace)?;
    let name = name.trim();
    if !name.starts_with(|c: char| c.is_alphabetic()) {
        return None;
    }
    if numeral.is_empty() || !numeral.chars().all(|c| "IVXLCDM".contains(c)) {
        return None;
    }
    Some(Component {
        name: name.to_string(),
        level: roman_to_level(numeral),
    })
}

/// Parse every `Name NUMERAL` entry out of `text`.
pub fn parse_components(text: &str) -> Vec<Component> {
    strip_formatting(text)
        .split([',', '\n'])
        .filter_map(parse_entry)
        .collect()
}

/// Keep only the lore lines made up entirely of enchantment entries.
pub fn component_lines(lore: &str) -> Option<String> {
    let lines: Vec<String> = strip_formatting(lore)
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && line.split(',').all(|entry| parse_entry(entry).is_some())
        })
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Sum the book price of every recognized component in `metadata`.
///
/// Unrecognized levels and unpriced components contribute zero. Returns `None` when
/// `metadata` holds no components at all.
pub fn component_value(metadata: &str, book: &ComponentPriceBook) -> Option<f64> {
    let components = parse_components(metadata);
    if components.is_empty() {
        return None;
    }
    Some(
        components
            .iter()
            .filter_map(Component::product_id)
            .filter_map(|id| book.price(&id))
            .sum(),
    )
}
