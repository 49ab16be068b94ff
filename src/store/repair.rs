//! Repair pass restoring strict user/assistant alternation in a window's
//! message history. Runs after a snapshot is loaded and on demand.

use super::{Message, MessageRole};

pub const PLACEHOLDER_ASSISTANT_REPLY: &str = "[no reply]";
pub const PLACEHOLDER_USER_CONTINUE: &str = "[continue]";

/// Returns a message list in which adjacent user/assistant turns always
/// alternate. System and tool messages pass through untouched and do not
/// participate in the alternation rule. The first message is never altered,
/// and the pass is idempotent: placeholders inserted once satisfy
/// alternation on every later run.
#[must_use]
pub fn repair(messages: &[Message]) -> Vec<Message> {
    let mut fixed: Vec<Message> = Vec::with_capacity(messages.len());
    for message in messages {
        if is_turn(message.role) {
            let previous_turn = fixed.iter().rev().find(|earlier| is_turn(earlier.role));
            if let Some(previous) = previous_turn {
                if previous.role == message.role {
                    fixed.push(placeholder_between(previous, message));
                }
            }
        }
        fixed.push(message.clone());
    }
    fixed
}

fn is_turn(role: MessageRole) -> bool {
    matches!(role, MessageRole::User | MessageRole::Assistant)
}

fn placeholder_between(previous: &Message, next: &Message) -> Message {
    let (role, content) = match next.role {
        MessageRole::User => (MessageRole::Assistant, PLACEHOLDER_ASSISTANT_REPLY),
        _ => (MessageRole::User, PLACEHOLDER_USER_CONTINUE),
    };
    Message {
        role,
        content: content.to_string(),
        timestamp: timestamp_between(previous.timestamp, next.timestamp),
        reasoning_content: None,
    }
}

/// A timestamp strictly between the two neighbors when the gap allows one;
/// otherwise the earlier timestamp, which keeps chronological order stable.
fn timestamp_between(earlier: i64, later: i64) -> i64 {
    if later - earlier >= 2 {
        earlier + (later - earlier) / 2
    } else {
        earlier
    }
}
