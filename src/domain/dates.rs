use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn parse_entry_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
}

pub fn format_entry_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .expect("calendar dates always format as year-month-day")
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{format_entry_date, now_utc_rfc3339, parse_entry_date};

    #[test]
    fn parses_and_formats_entry_dates() {
        let parsed = parse_entry_date(" 2025-07-20 ").expect("date should parse");
        assert_eq!(parsed, date!(2025 - 07 - 20));
        assert_eq!(format_entry_date(parsed), "2025-07-20");
    }

    #[test]
    fn rejects_invalid_dates() {
        assert!(parse_entry_date("2025-13-01").is_err());
        assert!(parse_entry_date("20/07/2025").is_err());
        assert!(parse_entry_date("").is_err());
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let stamp = now_utc_rfc3339();
        assert!(stamp.contains('T'));
        assert!(stamp.ends_with('Z'));
    }
}
