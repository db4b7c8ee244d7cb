//! Channel capability table
//!
//! Used to pick a concrete rendering when a prompt asks for `ListStyle::Auto`.

/// Longest button title the engine renders as an action
pub const MAX_ACTION_TITLE_LENGTH: usize = 20;

/// Whether the channel can show `button_count` suggested actions
pub fn supports_suggested_actions(channel_id: &str, button_count: usize) -> bool {
    let limit = match channel_id.to_ascii_lowercase().as_str() {
        "facebook" | "skype" => 10,
        "line" => 13,
        "kik" => 20,
        "telegram" | "emulator" | "directline" | "webchat" => 100,
        _ => return false,
    };
    button_count <= limit
}
