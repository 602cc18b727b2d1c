use slotwatch_core::domain::booking::PersonalBooking;

const MONTHS: [(&str, &str); 12] = [
    ("январь", "января"),
    ("февраль", "февраля"),
    ("март", "марта"),
    ("апрель", "апреля"),
    ("май", "мая"),
    ("июнь", "июня"),
    ("июль", "июля"),
    ("август", "августа"),
    ("сентябрь", "сентября"),
    ("октябрь", "октября"),
    ("ноябрь", "ноября"),
    ("декабрь", "декабря"),
];

/// Labels a picker day with the month the picker shows, so "12" under
/// "Июнь 2025" becomes "12 июня". Without a month header the bare day is kept.
pub fn date_label(day: &str, month_header: Option<&str>) -> String {
    let day = day.trim();
    let Some(month) = month_header.and_then(|header| header.split_whitespace().next()) else {
        return day.to_owned();
    };

    let month = month.to_lowercase();
    match MONTHS.iter().find(|(nominative, _)| *nominative == month) {
        Some((_, genitive)) => format!("{day} {genitive}"),
        None => format!("{day} {month}"),
    }
}

/// Parses one bookings-table row from its cell texts. The first cell holds the
/// date and time on separate lines, the second the location. Rows with fewer
/// than two cells or without both date and time are skipped.
pub fn parse_booking_row<S: AsRef<str>>(cells: &[S]) -> Option<PersonalBooking> {
    let [when, location, ..] = cells else {
        return None;
    };

    let mut lines = when.as_ref().split('\n').map(str::trim);
    let date = lines.next().unwrap_or_default();
    let time = lines.next().unwrap_or_default();
    if date.is_empty() || time.is_empty() {
        return None;
    }

    Some(PersonalBooking {
        date: date.to_owned(),
        time: time.to_owned(),
        location: location.as_ref().trim().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::{date_label, parse_booking_row};

    #[test]
    fn day_is_labelled_with_the_genitive_month() {
        assert_eq!(date_label("12", Some("Июнь")), "12 июня");
        assert_eq!(date_label(" 3 ", Some("Июль 2025")), "3 июля");
    }

    #[test]
    fn same_day_in_consecutive_months_gets_distinct_labels() {
        assert_ne!(date_label("1", Some("Июнь")), date_label("1", Some("Июль")));
    }

    #[test]
    fn missing_or_unknown_month_header() {
        assert_eq!(date_label("12", None), "12");
        assert_eq!(date_label("12", Some("  ")), "12");
        assert_eq!(date_label("12", Some("июня")), "12 июня");
    }

    #[test]
    fn date_and_time_come_from_the_first_cell() {
        let booking = parse_booking_row(&["12.06.2025\n10:00", "Автодром", "Инструктор"])
            .expect("row parses");

        assert_eq!(booking.date, "12.06.2025");
        assert_eq!(booking.time, "10:00");
        assert_eq!(booking.location, "Автодром");
    }

    #[test]
    fn rows_missing_a_time_are_skipped() {
        assert_eq!(parse_booking_row(&["12.06.2025", "Автодром"]), None);
        assert_eq!(parse_booking_row(&["\n10:00", "Автодром"]), None);
    }

    #[test]
    fn rows_with_a_single_cell_are_skipped() {
        assert_eq!(parse_booking_row(&["12.06.2025\n10:00"]), None);
        assert_eq!(parse_booking_row::<&str>(&[]), None);
    }

    #[test]
    fn carriage_returns_are_trimmed() {
        let booking = parse_booking_row(&["12.06.2025\r\n10:00\r\n", " Город "]).expect("parses");
        assert_eq!((booking.time.as_str(), booking.location.as_str()), ("10:00", "Город"));
    }
}
