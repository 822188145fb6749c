//! Conversation state machine: where each user is in the guided flow.
//!
//! Each variant carries exactly the fields captured so far, so a handler
//! can never read a group before one was chosen.

use std::fmt;

use crate::validation::{ChildName, SubmissionDate};

/// Groups a parent can pick from, in keyboard order.
pub static GROUPS: [&str; 13] = [
    "Земля",
    "Альтаир",
    "Планета",
    "Комета",
    "Орион",
    "Юпитер",
    "Кассиопея",
    "Венера",
    "Аврора",
    "Вега",
    "Медведица",
    "Пегас/альфа/сириус",
    "Макси",
];

/// One of the fixed [`GROUPS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Group(&'static str);

impl Group {
    /// Exact match against the group list.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        GROUPS.iter().find(|g| **g == text).map(|g| Self(*g))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Per-user conversation state.
///
/// `Start` is both the initial state and what every finished, abandoned,
/// or failed flow collapses back to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Start,
    ChooseMode,
    ChooseRole,
    ParentChooseGroup {
        display_name: String,
    },
    ParentEnterDate {
        display_name: String,
        group: Group,
    },
    ParentEnterName {
        display_name: String,
        group: Group,
        date: SubmissionDate,
    },
    ParentSendVideo {
        display_name: String,
        group: Group,
        date: SubmissionDate,
        child_name: ChildName,
    },
    TeacherEnterPassword,
    TeacherEnterDate,
}

/// Field-less discriminant of [`ConversationState`], for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Start,
    ChooseMode,
    ChooseRole,
    ParentChooseGroup,
    ParentEnterDate,
    ParentEnterName,
    ParentSendVideo,
    TeacherEnterPassword,
    TeacherEnterDate,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::ChooseMode => "choose_mode",
            Self::ChooseRole => "choose_role",
            Self::ParentChooseGroup => "parent_choose_group",
            Self::ParentEnterDate => "parent_enter_date",
            Self::ParentEnterName => "parent_enter_name",
            Self::ParentSendVideo => "parent_send_video",
            Self::TeacherEnterPassword => "teacher_enter_password",
            Self::TeacherEnterDate => "teacher_enter_date",
        };
        write!(f, "{s}")
    }
}

impl ConversationState {
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Start => StateKind::Start,
            Self::ChooseMode => StateKind::ChooseMode,
            Self::ChooseRole => StateKind::ChooseRole,
            Self::ParentChooseGroup { .. } => StateKind::ParentChooseGroup,
            Self::ParentEnterDate { .. } => StateKind::ParentEnterDate,
            Self::ParentEnterName { .. } => StateKind::ParentEnterName,
            Self::ParentSendVideo { .. } => StateKind::ParentSendVideo,
            Self::TeacherEnterPassword => StateKind::TeacherEnterPassword,
            Self::TeacherEnterDate => StateKind::TeacherEnterDate,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_parse_exact() {
        assert_eq!(Group::parse("Вега").map(|g| g.as_str()), Some("Вега"));
        assert_eq!(
            Group::parse("Пегас/альфа/сириус").map(|g| g.as_str()),
            Some("Пегас/альфа/сириус")
        );
        assert!(Group::parse("вега").is_none());
        assert!(Group::parse("Марс").is_none());
        assert!(Group::parse("").is_none());
        assert!(GROUPS.iter().all(|g| Group::parse(g).is_some()));
    }

    #[test]
    fn default_is_start() {
        assert_eq!(ConversationState::default().kind(), StateKind::Start);
        assert!(ConversationState::default().is_start());
    }

    #[test]
    fn kind_display() {
        assert_eq!(StateKind::ParentEnterDate.to_string(), "parent_enter_date");
        assert_eq!(StateKind::TeacherEnterPassword.to_string(), "teacher_enter_password");
    }
}
