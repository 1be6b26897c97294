/// Creates a single chat [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use toolbox::{Role, tb_msg};
///
/// let message = tb_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.content, "Done.");
/// ```
#[macro_export]
macro_rules! tb_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::System, $content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::User, $content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::Assistant, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, or assistant");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use toolbox::{Role, tb_messages};
///
/// let messages = tb_messages![
///     user => "What is the capital of France?",
///     assistant => "Paris.",
///     user => "And of Italy?",
/// ];
///
/// assert_eq!(messages.len(), 3);
/// assert_eq!(messages[1].role, Role::Assistant);
/// ```
#[macro_export]
macro_rules! tb_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::tb_msg!($role => $content)),+]
    };
}

/// Creates a [`ToolConfig`](crate::ToolConfig) with optional system prompt.
///
/// ```rust
/// use toolbox::tb_tool;
///
/// let tool = tb_tool!("Weather", "gpt-4o", "Answer briefly.");
/// assert_eq!(tool.model, "gpt-4o");
/// assert_eq!(tool.system_prompt.as_deref(), Some("Answer briefly."));
/// ```
#[macro_export]
macro_rules! tb_tool {
    ($name:expr, $model:expr $(,)?) => {
        $crate::ToolConfig::new($name, $model)
    };
    ($name:expr, $model:expr, $system_prompt:expr $(,)?) => {
        $crate::ToolConfig::new($name, $model).with_system_prompt($system_prompt)
    };
}
