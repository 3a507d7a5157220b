//! Element Attributes
//!
//! Boolean attributes reflect as boolean DOM properties: their presence
//! alone means `true`, whatever the attribute value says.

/// Attributes whose DOM property is a boolean
const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen", "async", "autofocus", "autoplay", "checked",
    "controls", "default", "defer", "disabled", "formnovalidate",
    "hidden", "inert", "ismap", "itemscope", "loop", "multiple",
    "muted", "nomodule", "novalidate", "open", "playsinline",
    "readonly", "required", "reversed", "selected",
];

/// Check whether `name` is a boolean attribute
pub fn is_boolean_attribute(name: &str) -> bool {
    BOOLEAN_ATTRIBUTES.binary_search(&name).is_ok()
}
