use std::fmt::Display;

use console::{style, StyledObject};

/// An operation still in flight.
pub fn in_progress(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).yellow()
}

pub fn succeeded(text: impl Display) -> StyledObject<String> {
    style(format!("{text} ✓")).green()
}

pub fn failed(text: impl Display) -> StyledObject<String> {
    style(format!("{text} ✗")).red().bold()
}

/// Secondary details such as the version or a hint.
pub fn muted(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn brand(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}
