pub mod components;
pub mod detector;

pub use components::{Component, ComponentPriceBook, component_value, parse_components, roman_to_level};
pub use detector::{detect_flips, detect_flips_with_components};
