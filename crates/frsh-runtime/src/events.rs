//! Click Events
//!
//! The subset of `MouseEvent` partial navigation looks at: the target
//! node, the button, modifier keys and the default-prevented flag.

use frsh_dom::NodeId;

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    /// Primary button (usually left)
    #[default]
    Primary,
    /// Auxiliary button (usually middle/wheel)
    Auxiliary,
    /// Secondary button (usually right)
    Secondary,
}

/// Click on a node of the live document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: NodeId,
    pub button: MouseButton,

    // Modifiers
    pub shift_key: bool,
    pub ctrl_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,

    default_prevented: bool,
}

impl ClickEvent {
    /// Plain primary-button click
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            button: MouseButton::Primary,
            shift_key: false,
            ctrl_key: false,
            alt_key: false,
            meta_key: false,
            default_prevented: false,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta_key = true;
        self
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Check if any modifier key is pressed
    pub fn any_modifier(&self) -> bool {
        self.shift_key || self.ctrl_key || self.alt_key || self.meta_key
    }
}
