//! Assistant chat: an HTTP client plus the session state of the chat panel.
//!
//! A [`ChatSession`] keeps the transcript and the open/closed flag. It asks
//! a [`ChatBackend`] for each reply. The backend always answers with text,
//! so a session never ends up with an unanswered user message.

pub mod client;

pub use client::{ChatClient, EMPTY_REPLY, ERROR_REPLY};

/// Greeting that opens every session.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your IMS Assistant. Ask me about inventory items, stock levels, vendors, or borrowers!";

/// Produces a reply for a user message. Must not fail.
pub trait ChatBackend {
    fn reply(&self, message: &str) -> String;
}

impl<F: Fn(&str) -> String> ChatBackend for F {
    fn reply(&self, message: &str) -> String {
        self(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Bot,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// Transcript and visibility of one chat panel.
pub struct ChatSession<B> {
    backend: B,
    open: bool,
    messages: Vec<ChatMessage>,
}

impl<B: ChatBackend> ChatSession<B> {
    /// A closed session holding only the welcome message.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            open: false,
            messages: vec![ChatMessage {
                sender: Sender::Bot,
                text: WELCOME_MESSAGE.to_string(),
            }],
        }
    }

    /// Flip between open and closed; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send trimmed `input`. Blank input is ignored and returns `None`;
    /// otherwise the user message and the bot reply are appended and the
    /// reply is returned.
    pub fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: message.to_string(),
        });
        let reply = self.backend.reply(message);
        self.messages.push(ChatMessage {
            sender: Sender::Bot,
            text: reply,
        });
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_starts_closed_with_welcome() {
        let session = ChatSession::new(|_: &str| String::new());
        assert!(!session.is_open());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].sender, Sender::Bot);
        assert_eq!(session.messages()[0].text, WELCOME_MESSAGE);
    }

    #[test]
    fn toggle_flips_state() {
        let mut session = ChatSession::new(|_: &str| String::new());
        assert!(session.toggle());
        assert!(!session.toggle());
    }

    #[test]
    fn send_trims_and_records_both_sides() {
        let mut session = ChatSession::new(|m: &str| format!("echo: {m}"));
        let reply = session.send("  how many pens?  ").cloned().unwrap();

        assert_eq!(reply.text, "echo: how many pens?");
        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[1].text, "how many pens?");
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut session =
            ChatSession::new(|_: &str| -> String { panic!("backend must not be called") });
        assert!(session.send("   ").is_none());
        assert_eq!(session.messages().len(), 1);
    }
}
