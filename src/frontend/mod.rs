//! Thin presentation layers over the protocol engine.
//!
//! - `menu`: numbered interactive loop
//! - `chat`: line relay between the keyboard and the module

pub mod chat;
pub mod menu;

pub use chat::{route_keyboard_line, Chat, KeyboardAction};
pub use menu::Menu;

use crate::protocol::CommandModeResult;

/// Render one result as a human-readable line, or as JSON.
pub fn render(result: &CommandModeResult, json: bool) -> String {
    if json {
        return serde_json::to_string(result)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":\"{e}\"}}"));
    }

    match (result.success, &result.response) {
        (true, Some(response)) => format!("{}: {}", result.operation, response),
        (true, None) => format!("{}: OK", result.operation),
        (false, _) => format!(
            "{} failed (Result = {}): {}",
            result.operation,
            result.code,
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text() {
        let ok = CommandModeResult::success("address", Some("1A2B".into()));
        assert_eq!(render(&ok, false), "address: 1A2B");

        let failed = CommandModeResult::failure("enter", -3, "unexpected response");
        assert_eq!(
            render(&failed, false),
            "enter failed (Result = -3): unexpected response"
        );
    }

    #[test]
    fn test_render_json() {
        let ok = CommandModeResult::success("exit", None);
        let value: serde_json::Value = serde_json::from_str(&render(&ok, true)).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["operation"], "exit");
    }
}
