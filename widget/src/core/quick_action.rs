//! Canned conversation starters

use std::fmt;
use std::str::FromStr;

use crate::error::WidgetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Donate,
    Projects,
    Volunteer,
    Contact,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [Self::Donate, Self::Projects, Self::Volunteer, Self::Contact];

    /// The message sent on the visitor's behalf
    pub fn message(self) -> &'static str {
        match self {
            Self::Donate => "¿Cómo puedo hacer una donación?",
            Self::Projects => "¿Qué proyectos tienen activos?",
            Self::Volunteer => "¿Cómo puedo ser voluntario?",
            Self::Contact => "Quiero contactar con ustedes",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Donate => "donate",
            Self::Projects => "projects",
            Self::Volunteer => "volunteer",
            Self::Contact => "contact",
        }
    }
}

impl FromStr for QuickAction {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| WidgetError::UnknownQuickAction(s.to_string()))
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
