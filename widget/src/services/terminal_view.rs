//! Plain-text transcript rendering for the terminal front-end

use std::io::Write;
use std::sync::Mutex;

use crate::core::{InfoCard, QuickAction};
use crate::traits::ChatView;
use crate::types::Role;

/// Renders the chat as lines of text on any writer
pub struct TerminalView<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn line(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            // Rendering is best effort; a closed terminal is not an error
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        }
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn show_message(&self, role: Role, text: &str) {
        let prefix = match role {
            Role::User => "tú  >",
            Role::Assistant => "bot >",
        };
        self.line(&format!("{prefix} {text}"));
    }

    fn show_cards(&self, cards: &[InfoCard]) {
        for card in cards {
            self.line(&format!("  {}", card.to_string().replace('\n', "\n  ")));
        }
    }

    fn show_typing(&self, typing: bool) {
        if typing {
            self.line("bot > …");
        }
    }

    fn show_quick_actions(&self, visible: bool) {
        if visible {
            let actions: Vec<String> = QuickAction::ALL.iter().map(|a| format!("/{a}")).collect();
            self.line(&format!("      {}", actions.join("  ")));
        }
    }

    fn clear(&self) {
        self.line("──────────────────────────────");
    }
}
