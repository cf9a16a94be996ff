//! Theme and Styling
//!
//! Colors for the chat page. The two page stylesheets are fixed; the toggle
//! only picks which one is emitted.

use crate::models::Theme;

// === Message bubbles ===

/// User bubble background (green)
pub const USER_BUBBLE_BG: &str = "#4CAF50";

/// User bubble text
pub const USER_BUBBLE_FG: &str = "white";

/// Assistant bubble background (light grey)
pub const ASSISTANT_BUBBLE_BG: &str = "#f1f1f1";

/// Assistant bubble text
pub const ASSISTANT_BUBBLE_FG: &str = "black";

// === Page stylesheets ===

pub const DARK_STYLESHEET: &str = "body { background-color: #1e1e1e; color: white; } \
.chat-container { background-color: #333; } \
.chat-bubble { background-color: #444; color: white; }";

pub const LIGHT_STYLESHEET: &str = "body { background-color: white; color: black; } \
.chat-container { background-color: white; } \
.chat-bubble { background-color: #f1f1f1; color: black; }";

/// Layout shared by both themes
pub const BASE_STYLESHEET: &str = "body { font-family: Arial, sans-serif; margin: 0; } \
.layout { display: flex; min-height: 100vh; } \
.sidebar { width: 18rem; padding: 1.5rem; border-right: 1px solid #ddd; } \
.sidebar h3 { margin-top: 1.5rem; } \
.sidebar form { margin-bottom: 0.75rem; } \
.main { flex: 1; padding: 2rem; } \
.chat-container { padding: 0.5rem; border-radius: 8px; } \
.message { padding: 10px; border-radius: 10px; margin: 5px 0; white-space: pre-wrap; } \
.success { color: #1b7f3b; } \
.error { color: #c62828; } \
.chat-bubble { padding: 0.5rem; border-radius: 8px; white-space: pre-wrap; } \
input[type=text] { width: 100%; padding: 0.5rem; box-sizing: border-box; } \
#thinking { display: none; font-style: italic; }";

pub fn stylesheet(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => DARK_STYLESHEET,
        Theme::Light => LIGHT_STYLESHEET,
    }
}
