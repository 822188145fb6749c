//! Keyboard layouts shown at each step.

use crate::channels::{ButtonColor, Keyboard};

use super::intent::{BACK_LABEL, PARENT_LABEL, TEACHER_LABEL};
use super::state::GROUPS;

pub fn main_menu() -> Keyboard {
    Keyboard::one_time()
        .button("🤖 Общаться с ботом", ButtonColor::Primary)
        .button("💬 Писать сообщения", ButtonColor::Secondary)
}

pub fn start() -> Keyboard {
    Keyboard::one_time()
        .button("Старт", ButtonColor::Positive)
        .button("⚙️ Настройки", ButtonColor::Secondary)
}

pub fn settings() -> Keyboard {
    Keyboard::one_time()
        .button("🤖 Режим бота", ButtonColor::Positive)
        .button("💬 Обычные сообщения", ButtonColor::Secondary)
        .line()
        .button(BACK_LABEL, ButtonColor::Negative)
}

pub fn role() -> Keyboard {
    Keyboard::one_time()
        .button(PARENT_LABEL, ButtonColor::Positive)
        .button(TEACHER_LABEL, ButtonColor::Primary)
        .line()
        .button(BACK_LABEL, ButtonColor::Negative)
}

/// Groups in two columns, then a back row.
pub fn groups() -> Keyboard {
    let mut kb = Keyboard::one_time();
    for (i, pair) in GROUPS.chunks(2).enumerate() {
        if i > 0 {
            kb = kb.line();
        }
        for group in pair {
            kb = kb.button(*group, ButtonColor::Secondary);
        }
    }
    kb.line().button(BACK_LABEL, ButtonColor::Negative)
}

/// Shown after a parent's submission.
pub fn restart() -> Keyboard {
    Keyboard::one_time()
        .button("🔄 Начать ещё раз", ButtonColor::Positive)
        .button("⚙️ Настройки", ButtonColor::Secondary)
}

/// Shown after a teacher's retrieval.
pub fn teacher_restart() -> Keyboard {
    Keyboard::one_time()
        .button("🔄 Рестарт", ButtonColor::Positive)
        .button("⚙️ Настройки", ButtonColor::Secondary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::intent::{Intent, ModeChoice, Role};

    #[test]
    fn groups_two_columns_then_back() {
        let kb = groups();
        // 13 groups -> 7 rows, plus back.
        assert_eq!(kb.rows.len(), 8);
        assert!(kb.rows[..7].iter().all(|r| r.len() <= 2));
        assert_eq!(kb.rows[6].len(), 1);
        assert_eq!(kb.rows[7][0].label, BACK_LABEL);
        assert_eq!(kb.labels().len(), GROUPS.len() + 1);
    }

    #[test]
    fn button_labels_classify_as_intended() {
        let labels = main_menu();
        assert_eq!(
            Intent::classify(labels.labels()[0]),
            Intent::Mode(ModeChoice::Bot)
        );
        assert_eq!(
            Intent::classify(labels.labels()[1]),
            Intent::Mode(ModeChoice::Messages)
        );

        assert_eq!(Intent::classify(start().labels()[0]), Intent::Start);
        assert_eq!(Intent::classify(start().labels()[1]), Intent::Settings);
        assert_eq!(Intent::classify(restart().labels()[0]), Intent::Restart);
        assert_eq!(Intent::classify(teacher_restart().labels()[0]), Intent::Restart);

        let role = role();
        assert_eq!(Intent::classify(role.labels()[0]), Intent::Role(Role::Parent));
        assert_eq!(Intent::classify(role.labels()[1]), Intent::Role(Role::Teacher));
        assert_eq!(Intent::classify(role.labels()[2]), Intent::Back);
    }
}
