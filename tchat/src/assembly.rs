//! Builds the message array sent for a tool request.
//!
//! Order: the tool's example exchange, then the stored history oldest first,
//! then the new user message.

use tmemory::ChatHistory;
use tprovider::{ImageAttachment, Message};

use crate::ToolConfig;

pub fn assemble_messages(
    tool: &ToolConfig,
    history: &ChatHistory,
    text: &str,
    image: Option<ImageAttachment>,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 3);

    if let Some((request, response)) = tool.example_pair() {
        messages.push(Message::user(request));
        messages.push(Message::assistant(response));
    }

    messages.extend(history.transcript(tool.include_images_in_history));
    messages.push(Message::user(text).with_image(image));
    messages
}

#[cfg(test)]
mod tests {
    use tmemory::HistoryEntry;
    use tprovider::{Role, TokenUsage};

    use super::*;

    fn history_of(pairs: &[(&str, &str)]) -> ChatHistory {
        let mut history = ChatHistory::default();
        for (user, assistant) in pairs {
            history.push_bounded(
                HistoryEntry::new(*user, *assistant, "m", TokenUsage::default()),
                usize::MAX,
            );
        }
        history
    }

    fn rendered(messages: &[Message]) -> Vec<(Role, &str)> {
        messages
            .iter()
            .map(|message| (message.role, message.content.as_str()))
            .collect()
    }

    #[test]
    fn history_precedes_new_message() {
        let tool = ToolConfig::new("t", "m").with_chat_history(2);
        let messages = assemble_messages(&tool, &history_of(&[("hi", "hello")]), "bye", None);

        assert_eq!(
            rendered(&messages),
            [
                (Role::User, "hi"),
                (Role::Assistant, "hello"),
                (Role::User, "bye"),
            ]
        );
    }

    #[test]
    fn example_pair_goes_first() {
        let tool = ToolConfig::new("t", "m")
            .with_chat_history(2)
            .with_example("ping", "pong");
        let messages = assemble_messages(&tool, &history_of(&[("hi", "hello")]), "bye", None);

        assert_eq!(
            rendered(&messages),
            [
                (Role::User, "ping"),
                (Role::Assistant, "pong"),
                (Role::User, "hi"),
                (Role::Assistant, "hello"),
                (Role::User, "bye"),
            ]
        );
    }

    #[test]
    fn only_the_new_message_carries_the_new_image() {
        let tool = ToolConfig::new("t", "m").with_vision(true, false);
        let image = ImageAttachment::new("image/png", "AAAA");
        let messages = assemble_messages(&tool, &history_of(&[]), "what is this?", Some(image));

        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].image.as_ref().map(|image| image.mime_type.as_str()),
            Some("image/png")
        );
    }
}
