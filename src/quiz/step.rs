//! Quiz step sequence — a fixed, forward-only progression.

use serde::{Deserialize, Serialize};

/// The steps of the quiz, in order.
///
/// Progresses linearly: Homeowner → ProjectType → Name → City → Zip → Email →
/// Phone → Complete. The only way "back" is the change-phone reset, which
/// stays inside the Phone step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStep {
    Homeowner,
    ProjectType,
    Name,
    City,
    Zip,
    Email,
    Phone,
    Complete,
}

impl QuizStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: QuizStep) -> bool {
        self.next() == Some(target)
    }

    /// Whether this step is terminal (the confirmation page).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<QuizStep> {
        use QuizStep::*;
        match self {
            Homeowner => Some(ProjectType),
            ProjectType => Some(Name),
            Name => Some(City),
            City => Some(Zip),
            Zip => Some(Email),
            Email => Some(Phone),
            Phone => Some(Complete),
            Complete => None,
        }
    }

    /// Position in the sequence, starting at 0.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Progress bar width, in percent.
    pub fn progress(&self) -> u8 {
        use QuizStep::*;
        match self {
            Homeowner => 0,
            ProjectType => 10,
            Name => 20,
            City => 35,
            Zip => 50,
            Email => 65,
            Phone => 85,
            Complete => 100,
        }
    }

    /// Step heading, personalised once the visitor's name is known.
    pub fn title(&self, name: Option<&str>) -> String {
        use QuizStep::*;
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        match (self, name) {
            (Homeowner, _) => "Are you the homeowner?".to_string(),
            (ProjectType, _) => "What type of project are you planning?".to_string(),
            (Name, _) => "What's your name?".to_string(),
            (City, Some(n)) => format!("Hi {n}! What city are you in?"),
            (City, None) => "What city are you in?".to_string(),
            (Zip, Some(n)) => format!("{n}, what's your zip code?"),
            (Zip, None) => "What's your zip code?".to_string(),
            (Email, Some(n)) => format!("{n}, what's your email?"),
            (Email, None) => "What's your email?".to_string(),
            (Phone, Some(n)) => format!("Last step {n}! What's your phone number?"),
            (Phone, None) => "What's your phone number?".to_string(),
            (Complete, _) => "Thank you! We'll be in touch shortly.".to_string(),
        }
    }
}

impl Default for QuizStep {
    fn default() -> Self {
        Self::Homeowner
    }
}

impl std::fmt::Display for QuizStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Homeowner => "homeowner",
            Self::ProjectType => "project_type",
            Self::Name => "name",
            Self::City => "city",
            Self::Zip => "zip",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}
