//! Operator-facing reply texts.

use crate::message::ChatId;
use crate::registry::Category;
use crate::validate::Rejection;

const REPORT_HEADER: &str = "📋 Отчёт по рабочим:";
const REPORT_FOOTER: &str = "✅ Спасибо! Данные приняты.";

pub fn prompt(category: &Category) -> String {
    format!(
        "Введите количество для: {} (макс. {})",
        category.name, category.max_value
    )
}

pub fn rejection(rejection: Rejection, category: &Category) -> String {
    match rejection {
        Rejection::InvalidFormat => "❗ Пожалуйста, введите целое число.".to_string(),
        Rejection::OutOfRange { max } => {
            format!("❗ Введите число от 0 до {max} для {}.", category.name)
        }
    }
}

pub fn cancelled() -> String {
    "❌ Ввод отменён.".to_string()
}

pub fn chat_id(chat_id: ChatId) -> String {
    format!("Ваш chat_id: {chat_id}")
}

/// Wraps the `name: value` summary lines for delivery.
pub fn completion(summary: &str) -> String {
    format!("{REPORT_HEADER}\n{summary}\n\n{REPORT_FOOTER}")
}
