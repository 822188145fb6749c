//! User-facing reply texts.

use crate::error::{DateError, NameError};
use crate::store::Submission;
use crate::validation::{ChildName, SubmissionDate};

use super::state::Group;

pub const MAIN_MENU: &str = "👋 Добро пожаловать! Выберите режим работы:\n\n\
    🤖 Общаться с ботом - автоматический сбор видео\n\
    💬 Писать сообщения - обычная переписка с администратором";

pub const CHOOSE_MODE_AGAIN: &str = "❌ Пожалуйста, выберите режим с помощью кнопок:";

pub const PASSTHROUGH_ENABLED: &str = "💬 Вы перешли в режим обычных сообщений.\n\
    Теперь ваши сообщения будут приходить администраторам группы.\n\n\
    Чтобы вернуться к боту, нажмите кнопку «Старт»:";

pub const BOT_MODE_ENABLED: &str = "🤖 Режим бота активирован!\n\nВыберите вашу роль:";

pub const CHOOSE_ROLE_AGAIN: &str = "❌ Пожалуйста, выберите роль с помощью кнопок:";

pub const CHOOSE_GROUP: &str = "👨‍👩‍👧 Выберите группу вашего ребенка:";
pub const CHOOSE_GROUP_AGAIN: &str = "❌ Пожалуйста, выберите группу из списка:";

pub const DATE_SAVED: &str = "📅 Дата сохранена! Теперь укажите имя и фамилию ребёнка:";

pub const VIDEO_MISSING: &str = "❌ Видео не обнаружено. Пожалуйста, прикрепите видеофайл к сообщению.\n\n\
    📹 Как отправить видео:\n\
    1. Нажмите на скрепку 📎\n\
    2. Выберите 'Видео'\n\
    3. Выберите файл с вашего устройства";

pub const SAVE_FAILED: &str = "❌ Ошибка сохранения. Попробуйте еще раз.";

pub const ENTER_PASSWORD: &str = "👩‍🏫 Введите пароль учётной записи педагога:";
pub const WRONG_PASSWORD: &str = "❌ Неверный пароль. Попробуйте еще раз или вернитесь назад.";
pub const PASSWORD_ACCEPTED: &str = "✅ Успешно! Теперь укажите дату этапа, с которого вы хотите \
    получить материалы (в формате дд.мм.гггг):";

pub const FALLBACK_ERROR: &str = "⚠️ Произошла ошибка. Давайте начнем заново.";

pub fn settings(use_bot: bool) -> String {
    let mode = if use_bot {
        "🤖 Режим бота"
    } else {
        "💬 Обычные сообщения"
    };
    format!("⚙️ Настройки\n\nТекущий режим: {mode}\n\nВыберите новый режим:")
}

pub fn group_chosen(group: Group) -> String {
    format!(
        "✅ Отлично, группа '{group}' выбрана!\n\n\
         Теперь напишите дату проведения данного этапа в формате 'дд.мм.гггг' (например, 01.12.2025):"
    )
}

pub fn name_saved(name: &ChildName) -> String {
    format!("👶 Отлично! Имя '{name}' сохранено.\n\nТеперь пришлите видео:")
}

pub fn submission_saved(group: Group, date: SubmissionDate, name: &ChildName) -> String {
    format!(
        "✅ Видео загружено! Спасибо за участие!\n\n\
         📋 Ваши данные:\n\
         • Ребёнок: {name}\n\
         • Группа: {group}\n\
         • Дата: {date}"
    )
}

pub fn date_error(err: DateError) -> &'static str {
    match err {
        DateError::Format => "❌ Неверный формат даты! Используйте 'дд.мм.гггг'",
        DateError::Future => "❌ Дата не может быть в будущем!",
    }
}

pub fn name_error(err: NameError) -> &'static str {
    match err {
        NameError::Empty => "❌ Имя не может быть пустым!",
        NameError::TooShort { .. } => "❌ Имя слишком короткое!",
        NameError::TooLong { .. } => "❌ Имя слишком длинное!",
        NameError::InvalidChars => "❌ Имя содержит недопустимые символы!",
    }
}

pub fn materials_found(count: usize, date: SubmissionDate) -> String {
    format!("📦 Найдено {count} материалов за дату {date}:")
}

pub fn material(submission: &Submission) -> String {
    let from = if submission.display_name.trim().is_empty() {
        "Неизвестно"
    } else {
        submission.display_name.as_str()
    };
    format!(
        "👶 {}\n🏫 Группа: {}\n👤 От: {from}",
        submission.child_name, submission.group_name
    )
}

pub fn retrieval_done(sent: usize, found: usize) -> String {
    format!("✅ Готово! Обработано {sent} из {found} материалов.")
}

pub fn materials_not_found(date: SubmissionDate) -> String {
    format!("❌ Материалы за дату {date} не найдены.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn settings_shows_current_mode() {
        assert!(settings(true).contains("Текущий режим: 🤖 Режим бота"));
        assert!(settings(false).contains("Текущий режим: 💬 Обычные сообщения"));
    }

    #[test]
    fn material_falls_back_to_unknown_sender() {
        let mut s = Submission {
            id: 1,
            user_id: 1,
            display_name: String::new(),
            group_name: "Вега".into(),
            date: "01.12.2024".into(),
            child_name: "Ivan Ivanov".into(),
            video_attachment: "video1_2".into(),
            created_at: Utc::now(),
        };
        assert_eq!(material(&s), "👶 Ivan Ivanov\n🏫 Группа: Вега\n👤 От: Неизвестно");
        s.display_name = "Анна Петрова".into();
        assert!(material(&s).ends_with("От: Анна Петрова"));
    }

    #[test]
    fn every_validation_error_has_a_message() {
        assert_ne!(date_error(DateError::Format), date_error(DateError::Future));
        assert!(name_error(NameError::TooShort { min: 2 }).contains("короткое"));
    }

    #[test]
    fn texts_are_plain() {
        // messages.send renders markdown markers literally.
        for text in [MAIN_MENU, VIDEO_MISSING, PASSTHROUGH_ENABLED] {
            assert!(!text.contains("**"), "{text}");
        }
    }
}
