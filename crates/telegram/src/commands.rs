/// Callback data carried by the refresh button.
pub const REFRESH_CALLBACK: &str = "update_schedule";

pub const ACCESS_DENIED_TEXT: &str = "🚫 Доступ запрещён";
pub const UPDATE_ACK_TEXT: &str = "🔄 Обновляю расписание...";
pub const MY_SCHEDULE_ACK_TEXT: &str = "🔄 Получаю ваше расписание...";

pub const USAGE_TEXT: &str = "👋 Я слежу за свободными слотами для вождения и пишу, когда появляются новые.\n\n/update - проверить расписание сейчас\n/myschedule - показать ваши записи";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Update,
    MySchedule,
    Start,
    Help,
    Unknown(String),
}

impl BotCommand {
    /// Parses the leading `/command` of a message. `/cmd@name` is accepted
    /// only when `name` matches `bot_username` (or no username is known).
    /// Returns `None` for plain text and for commands aimed at another bot.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let command = token.strip_prefix('/')?;
        if command.is_empty() {
            return None;
        }

        let (name, addressee) = match command.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (command, None),
        };
        if let (Some(addressee), Some(username)) = (addressee, bot_username) {
            if !addressee.eq_ignore_ascii_case(username) {
                return None;
            }
        }

        Some(match name.to_ascii_lowercase().as_str() {
            "update" => Self::Update,
            "myschedule" => Self::MySchedule,
            "start" => Self::Start,
            "help" => Self::Help,
            other => Self::Unknown(other.to_owned()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Update => "update",
            Self::MySchedule => "myschedule",
            Self::Start => "start",
            Self::Help => "help",
            Self::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BotCommand;

    #[test]
    fn parses_known_commands() {
        assert_eq!(BotCommand::parse("/update", None), Some(BotCommand::Update));
        assert_eq!(BotCommand::parse("/myschedule please", None), Some(BotCommand::MySchedule));
        assert_eq!(BotCommand::parse("  /START", None), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/help", None), Some(BotCommand::Help));
    }

    #[test]
    fn keeps_unknown_commands_distinct_from_plain_text() {
        assert_eq!(BotCommand::parse("/book", None), Some(BotCommand::Unknown("book".to_owned())));
        assert_eq!(BotCommand::parse("update", None), None);
        assert_eq!(BotCommand::parse("/", None), None);
        assert_eq!(BotCommand::parse("", None), None);
    }

    #[test]
    fn respects_bot_mentions() {
        assert_eq!(
            BotCommand::parse("/update@SlotWatchBot", Some("slotwatchbot")),
            Some(BotCommand::Update)
        );
        assert_eq!(BotCommand::parse("/update@OtherBot", Some("SlotWatchBot")), None);
        assert_eq!(BotCommand::parse("/update@OtherBot", None), Some(BotCommand::Update));
    }
}
