//! Intent classification for inbound text.
//!
//! Keyword matching lives here so the transition table only ever sees an
//! [`Intent`]. Handlers that take free text (dates, names, passwords) read
//! the raw text instead.

/// Exact label of the back button.
pub const BACK_LABEL: &str = "🔙 Назад";
pub const PARENT_LABEL: &str = "Родитель";
pub const TEACHER_LABEL: &str = "Педагог";

const START_COMMAND: &str = "старт";
const SETTINGS_MARKERS: [&str; 2] = ["настройк", "⚙️"];
const RESTART_PHRASES: [&str; 3] = ["начать ещё раз", "рестарт", "сначала"];
const BOT_MODE_MARKERS: [&str; 1] = ["бот"];
const MESSAGE_MODE_MARKERS: [&str; 2] = ["сообщен", "писать"];

/// How a user wants to talk to the community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    Bot,
    Messages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Parent,
    Teacher,
}

/// What an inbound text asks for, in override priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Settings,
    Restart,
    Back,
    Mode(ModeChoice),
    Role(Role),
    Text,
}

impl Intent {
    pub fn classify(text: &str) -> Self {
        let lower = text.trim().to_lowercase();

        if lower == START_COMMAND {
            return Self::Start;
        }
        if SETTINGS_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::Settings;
        }
        if RESTART_PHRASES.iter().any(|p| lower.contains(p)) {
            return Self::Restart;
        }
        if text == BACK_LABEL {
            return Self::Back;
        }
        if BOT_MODE_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::Mode(ModeChoice::Bot);
        }
        if MESSAGE_MODE_MARKERS.iter().any(|m| lower.contains(m)) {
            return Self::Mode(ModeChoice::Messages);
        }
        match text {
            PARENT_LABEL => Self::Role(Role::Parent),
            TEACHER_LABEL => Self::Role(Role::Teacher),
            _ => Self::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_case_insensitive_exact() {
        assert_eq!(Intent::classify("Старт"), Intent::Start);
        assert_eq!(Intent::classify("СТАРТ"), Intent::Start);
        assert_eq!(Intent::classify("  старт "), Intent::Start);
        assert_ne!(Intent::classify("старт сейчас"), Intent::Start);
    }

    #[test]
    fn settings_by_keyword_or_icon() {
        assert_eq!(Intent::classify("⚙️ Настройки"), Intent::Settings);
        assert_eq!(Intent::classify("настройка"), Intent::Settings);
        assert_eq!(Intent::classify("⚙️"), Intent::Settings);
    }

    #[test]
    fn restart_phrases() {
        assert_eq!(Intent::classify("🔄 Начать ещё раз"), Intent::Restart);
        assert_eq!(Intent::classify("🔄 Рестарт"), Intent::Restart);
        assert_eq!(Intent::classify("давай сначала"), Intent::Restart);
    }

    #[test]
    fn back_is_exact_label() {
        assert_eq!(Intent::classify("🔙 Назад"), Intent::Back);
        assert_eq!(Intent::classify("Назад"), Intent::Text);
    }

    #[test]
    fn mode_choices() {
        assert_eq!(
            Intent::classify("🤖 Общаться с ботом"),
            Intent::Mode(ModeChoice::Bot)
        );
        assert_eq!(
            Intent::classify("💬 Писать сообщения"),
            Intent::Mode(ModeChoice::Messages)
        );
        assert_eq!(
            Intent::classify("💬 Обычные сообщения"),
            Intent::Mode(ModeChoice::Messages)
        );
        assert_eq!(Intent::classify("🤖 Режим бота"), Intent::Mode(ModeChoice::Bot));
    }

    #[test]
    fn roles_are_exact() {
        assert_eq!(Intent::classify("Родитель"), Intent::Role(Role::Parent));
        assert_eq!(Intent::classify("Педагог"), Intent::Role(Role::Teacher));
        assert_eq!(Intent::classify("родитель"), Intent::Text);
    }

    #[test]
    fn free_text() {
        assert_eq!(Intent::classify("01.12.2024"), Intent::Text);
        assert_eq!(Intent::classify("Ivan Ivanov"), Intent::Text);
        assert_eq!(Intent::classify(""), Intent::Text);
    }
}
