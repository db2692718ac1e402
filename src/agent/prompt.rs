//! Prompt rendering for the reply generator.

use crate::memory::turn::{Turn, TurnRole};

/// Render the most recent `window` prior turns and the new message into one prompt.
#[must_use]
pub fn build_prompt_block(prior_turns: &[Turn], window: usize, user_message: &str) -> String {
    let start = prior_turns.len().saturating_sub(window);
    let recent = &prior_turns[start..];

    let mut out = String::with_capacity(
        recent.iter().map(|turn| turn.content.len() + 16).sum::<usize>() + user_message.len() + 32,
    );

    if !recent.is_empty() {
        out.push_str("[CONVERSATION]\n");
        for turn in recent {
            render_turn(&mut out, turn);
        }
    }

    out.push_str("[USER_MESSAGE]\n");
    out.push_str(user_message);
    out.push('\n');

    out
}

fn render_turn(out: &mut String, turn: &Turn) {
    let role = match turn.role {
        TurnRole::User => "User",
        TurnRole::Assistant => "Assistant",
        TurnRole::Tool => "Tool",
        TurnRole::System => "System",
    };
    out.push_str("- ");
    out.push_str(role);
    out.push_str(": ");
    out.push_str(&turn.content);
    for call in &turn.tool_calls {
        out.push_str(" [tool: ");
        out.push_str(&call.name);
        out.push(' ');
        out.push_str(&call.arguments.to_string());
        out.push(']');
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_contact_has_no_history_block() {
        let prompt = build_prompt_block(&[], 10, "What is in the pantry?");
        assert_eq!(prompt, "[USER_MESSAGE]\nWhat is in the pantry?\n");
    }

    #[test]
    fn test_history_is_rendered_in_order() {
        let turns = vec![Turn::user("We bought eggs"), Turn::assistant("Noted.")];
        let prompt = build_prompt_block(&turns, 10, "How many?");

        let user_at = prompt.find("- User: We bought eggs").unwrap();
        let assistant_at = prompt.find("- Assistant: Noted.").unwrap();
        assert!(user_at < assistant_at);
        assert!(prompt.ends_with("[USER_MESSAGE]\nHow many?\n"));
    }

    #[test]
    fn test_window_keeps_latest_turns() {
        let turns = vec![Turn::user("one"), Turn::user("two"), Turn::user("three")];
        let prompt = build_prompt_block(&turns, 2, "four");
        assert!(!prompt.contains("one"));
        assert!(prompt.contains("two"));
        assert!(prompt.contains("three"));
    }

    #[test]
    fn test_tool_calls_are_rendered() {
        let turns = vec![
            Turn::assistant("Saving").with_tool_call("save_food", serde_json::json!({"name": "rice"})),
        ];
        let prompt = build_prompt_block(&turns, 5, "ok");
        assert!(prompt.contains("[tool: save_food {\"name\":\"rice\"}]"));
    }
}
