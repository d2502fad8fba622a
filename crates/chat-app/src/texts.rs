//! Fixed user-facing strings of the shop assistant widget.

pub const WIDGET_TITLE: &str = "🤖 Помощник по краскам";

pub const GREETING: &str = "Здравствуйте! Я ваш помощник по краскам и отделочным материалам. Помогу с выбором цветов, типов покрытий и отвечу на все вопросы о нашей продукции!";

pub const HISTORY_CLEARED: &str = "История очищена. Чем могу помочь?";

/// Followed by the error detail the server returned.
pub const SERVER_ERROR_PREFIX: &str = "Извините, произошла ошибка: ";

pub const CONNECTION_ERROR: &str = "Извините, произошла ошибка соединения. Попробуйте позже.";

pub const TYPING_LABEL: &str = "Печатает";

pub const INPUT_PLACEHOLDER: &str = "Введите ваш вопрос...";

pub const CLEAR_CONFIRMATION: &str = "Очистить всю историю переписки?";

pub fn server_error(detail: &str) -> String {
    format!("{SERVER_ERROR_PREFIX}{detail}")
}
