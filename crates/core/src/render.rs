//! Telegram Markdown bodies for everything the bot sends.

use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::diff::SlotSet;
use crate::domain::booking::PersonalSchedule;
use crate::domain::slot::{AvailabilitySnapshot, DayTimes, NO_TIMES_LABEL};
use crate::source::Termination;

pub const CHECKED_AT_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

const FENCE: &str = "```";

pub fn format_checked_at(checked_at: &NaiveDateTime) -> String {
    checked_at.format(CHECKED_AT_FORMAT).to_string()
}

/// Announcement of slots that were not present in the previous snapshot.
pub fn render_new_slots_message(slots: &SlotSet, checked_at: &NaiveDateTime) -> String {
    let mut message =
        format!("🔔 *Новые слоты для вождения* ({}):\n{FENCE}\n", format_checked_at(checked_at));
    for slot in slots {
        let _ = writeln!(message, "📅 {} в 🕒 {}", slot.date, slot.time);
    }
    message.push_str(FENCE);
    message.push_str("\n_Запишитесь, пока слоты доступны!_");
    message
}

/// The full availability picture, one line per inspected date.
pub fn render_full_summary(
    snapshot: &AvailabilitySnapshot,
    termination: &Termination,
    checked_at: &NaiveDateTime,
) -> String {
    let mut message =
        format!("📅 *Расписание доступных слотов* ({}):\n{FENCE}\n", format_checked_at(checked_at));

    if snapshot.is_empty() {
        message.push_str("😔 Нет доступных слотов\n");
    } else {
        for (date, times) in snapshot.days() {
            let line = match times {
                DayTimes::Open(times) if times.iter().any(|time| !time.trim().is_empty()) => {
                    let mut sorted: Vec<&str> = times
                        .iter()
                        .map(|time| time.trim())
                        .filter(|time| !time.is_empty())
                        .collect();
                    sorted.sort_unstable();
                    sorted.join(", ")
                }
                _ => NO_TIMES_LABEL.to_owned(),
            };
            let _ = writeln!(message, "📅 {date}: 🕒 {line}");
        }
    }
    message.push_str(FENCE);

    if let Some(notice) = render_truncation_notice(termination) {
        message.push('\n');
        message.push_str(&notice);
    }
    message.push_str("\n_Нажмите 'Обновить' для проверки новых слотов._");
    message
}

/// One line warning that the summary may be incomplete, or `None` when the
/// enumeration covered everything the site rendered.
pub fn render_truncation_notice(termination: &Termination) -> Option<String> {
    let reason = match termination {
        Termination::Exhausted | Termination::AllDatesChecked | Termination::NoNewDates => {
            return None
        }
        Termination::RoundLimit => "достигнут лимит проверок".to_owned(),
        Termination::CalendarUnavailable => "календарь не открылся".to_owned(),
        Termination::Interrupted(reason) => format!("сессия прервана ({})", sanitize(reason)),
    };
    Some(format!("⚠️ Список может быть неполным: {reason}."))
}

pub fn render_personal_schedule(schedule: &PersonalSchedule, checked_at: &NaiveDateTime) -> String {
    let checked_at = format_checked_at(checked_at);
    if schedule.is_empty() {
        return format!(
            "😔 *Нет запланированных занятий* ({checked_at})\n\n\
             _Попробуйте записаться на новые слоты с помощью /update._"
        );
    }

    let mut message = format!("📅 *Ваше расписание вождения* ({checked_at}):\n{FENCE}\n");
    for booking in schedule.sorted_bookings() {
        let _ = writeln!(message, "📅 {} в 🕒 {}: 📍 {}", booking.date, booking.time, booking.location);
    }
    message.push_str(FENCE);
    message
}

pub fn render_cycle_error(error: &str) -> String {
    format!("❌ *Ошибка при проверке расписания*:\n{FENCE}{}{FENCE}", sanitize(error))
}

pub fn render_personal_schedule_error(error: &str) -> String {
    format!("❌ *Ошибка при получении расписания*:\n{FENCE}{}{FENCE}", sanitize(error))
}

/// Keeps free-form error text from closing the surrounding code block.
fn sanitize(text: &str) -> String {
    text.replace('`', "'")
}
