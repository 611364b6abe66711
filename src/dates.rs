use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

/// Outcome of resolving a free-text date expression.
///
/// When resolution fails, `formatted` carries the input unchanged so a
/// spoken prompt built from it still reads naturally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDate {
    pub original: String,
    pub formatted: String,
    pub date: Option<NaiveDate>,
    pub day_of_week: Option<String>,
    pub is_valid: bool,
}

impl ResolvedDate {
    fn resolved(original: &str, date: NaiveDate) -> Self {
        ResolvedDate {
            original: original.to_string(),
            formatted: spoken_date(date),
            date: Some(date),
            day_of_week: Some(date.format("%A").to_string()),
            is_valid: true,
        }
    }

    fn unresolved(original: &str) -> Self {
        ResolvedDate {
            original: original.to_string(),
            formatted: original.to_string(),
            date: None,
            day_of_week: None,
            is_valid: false,
        }
    }
}

/// Resolve a relative date expression against the local calendar day.
///
/// The clock is read once per call, so day-boundary comparisons stay
/// consistent within a single resolution.
pub fn resolve(expression: &str) -> ResolvedDate {
    resolve_with_reference(expression, Local::now().date_naive())
}

/// Resolve against an explicit reference day.
///
/// Parsers run in priority order, first match wins:
/// anchored words, weekday phrases, then month/day forms. Anything
/// unmatched comes back as an unresolved passthrough rather than an
/// error, so callers never have to branch on a failure path.
pub fn resolve_with_reference(expression: &str, today: NaiveDate) -> ResolvedDate {
    let normalized = expression.trim().to_lowercase();
    let date = try_anchored(&normalized, today)
        .or_else(|| try_weekday(&normalized, today))
        .or_else(|| try_month_day(&normalized, today))
        .or_else(|| try_numeric_month_day(&normalized, today));
    match date {
        Some(date) => ResolvedDate::resolved(expression, date),
        None => ResolvedDate::unresolved(expression),
    }
}

/// "today", "tomorrow", "day after tomorrow".
fn try_anchored(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        "day after tomorrow" => Some(today + Duration::days(2)),
        _ => None,
    }
}

/// "[next|this] <weekday>".
///
/// A bare weekday always lands strictly after today; naming today's
/// weekday means a full week out. "next" skips the nearest upcoming
/// occurrence entirely: "next Monday" said on a Sunday is 8 days out,
/// "next Tuesday" said on a Tuesday is 14. "this" allows today itself.
fn try_weekday(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (next, this, name) = if let Some(rest) = s.strip_prefix("next ") {
        (true, false, rest)
    } else if let Some(rest) = s.strip_prefix("this ") {
        (false, true, rest)
    } else {
        (false, false, s)
    };
    let target = parse_weekday(name.trim())?;
    let mut delta = (target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    if delta == 0 && !this {
        delta = 7;
    }
    if next {
        delta += 7;
    }
    Some(today + Duration::days(delta))
}

/// "<month name> <day>[st|nd|rd|th]", e.g. "January 30th" or "sept 4".
fn try_month_day(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let mut words = s.split_whitespace();
    let month = parse_month(words.next()?)?;
    let day = parse_ordinal_day(words.next()?)?;
    if words.next().is_some() {
        return None;
    }
    upcoming_month_day(month, day, today)
}

/// "<month>/<day>" or "<month>-<day>" with 1-2 digit components.
fn try_numeric_month_day(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (month, day) = s.split_once('/').or_else(|| s.split_once('-'))?;
    if month.is_empty() || day.is_empty() || month.len() > 2 || day.len() > 2 {
        return None;
    }
    upcoming_month_day(month.parse().ok()?, day.parse().ok()?, today)
}

/// The month/day in the current year, rolled forward a year once it has
/// already passed. Calendar-impossible combinations resolve to `None`.
fn upcoming_month_day(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    match NaiveDate::from_ymd_opt(today.year(), month, day) {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tues" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thurs" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_month(s: &str) -> Option<u32> {
    let month = match s {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Day number with an optional English ordinal suffix ("30", "30th").
fn parse_ordinal_day(s: &str) -> Option<u32> {
    let digits = s.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    if digits.is_empty() || !matches!(&s[digits.len()..], "" | "st" | "nd" | "rd" | "th") {
        return None;
    }
    digits.parse().ok()
}

/// Human friendly "Weekday, Month Dayth" for use in a spoken prompt
fn spoken_date(date: NaiveDate) -> String {
    let day = date.day();
    format!(
        "{}, {} {}{}",
        date.format("%A"),
        date.format("%B"),
        day,
        day_suffix(day)
    )
}

fn day_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-15 was a Friday
    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_today() {
        let result = resolve_with_reference("today", reference());
        assert!(result.is_valid);
        assert_eq!(result.date, Some(reference()));
        assert_eq!(result.day_of_week.as_deref(), Some("Friday"));
        assert_eq!(result.formatted, "Friday, March 15th");
    }

    #[test]
    fn test_tomorrow() {
        let result = resolve_with_reference("tomorrow", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
        assert_eq!(result.formatted, "Saturday, March 16th");
    }

    #[test]
    fn test_day_after_tomorrow() {
        let result = resolve_with_reference("day after tomorrow", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 17).unwrap()));
        assert_eq!(result.day_of_week.as_deref(), Some("Sunday"));
    }

    #[test]
    fn test_bare_weekday_lands_strictly_ahead() {
        let result = resolve_with_reference("monday", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 18).unwrap()));
        assert_eq!(result.day_of_week.as_deref(), Some("Monday"));
    }

    #[test]
    fn test_bare_weekday_on_same_weekday_is_a_week_out() {
        let result = resolve_with_reference("friday", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 22).unwrap()));
    }

    #[test]
    fn test_next_weekday_skips_nearest_occurrence() {
        // Nearest Monday is 3 days out; "next" lands on the one after.
        let result = resolve_with_reference("next monday", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()));
    }

    #[test]
    fn test_next_weekday_on_that_weekday_is_two_weeks_out() {
        // Said on a Tuesday, "next Tuesday" means the week after the
        // coming one: 14 days, not 7.
        let tuesday = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let result = resolve_with_reference("next Tuesday", tuesday);
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 26).unwrap()));
        assert_eq!(result.day_of_week.as_deref(), Some("Tuesday"));
    }

    #[test]
    fn test_next_weekday_on_the_eve_is_eight_days_out() {
        // Said on a Sunday, "next Monday" is 8 days out, not tomorrow.
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        let result = resolve_with_reference("next Monday", sunday);
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()));
    }

    #[test]
    fn test_this_weekday_allows_today() {
        let result = resolve_with_reference("this friday", reference());
        assert_eq!(result.date, Some(reference()));
    }

    #[test]
    fn test_this_weekday_never_looks_back() {
        let result = resolve_with_reference("this sunday", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 17).unwrap()));
    }

    #[test]
    fn test_month_day_in_the_future_stays_this_year() {
        let result = resolve_with_reference("March 20th", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap()));
        assert_eq!(result.formatted, "Wednesday, March 20th");
    }

    #[test]
    fn test_month_day_already_passed_rolls_to_next_year() {
        let result = resolve_with_reference("January 5", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()));
        assert_eq!(result.day_of_week.as_deref(), Some("Sunday"));
    }

    #[test]
    fn test_month_abbreviations() {
        let result = resolve_with_reference("sept 4", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 9, 4).unwrap()));
        let result = resolve_with_reference("dec 25th", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()));
    }

    #[test]
    fn test_numeric_slash_rolls_over() {
        let result = resolve_with_reference("3/4", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()));
        assert_eq!(result.day_of_week.as_deref(), Some("Tuesday"));
    }

    #[test]
    fn test_numeric_dash_in_the_future() {
        let result = resolve_with_reference("12-25", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()));
        assert_eq!(result.day_of_week.as_deref(), Some("Wednesday"));
    }

    #[test]
    fn test_unrecognized_input_passes_through() {
        let result = resolve_with_reference("whenever works", reference());
        assert!(!result.is_valid);
        assert_eq!(result.formatted, "whenever works");
        assert_eq!(result.date, None);
        assert_eq!(result.day_of_week, None);
    }

    #[test]
    fn test_empty_input_passes_through() {
        let result = resolve_with_reference("", reference());
        assert!(!result.is_valid);
        assert_eq!(result.formatted, "");
    }

    #[test]
    fn test_impossible_calendar_dates_pass_through() {
        assert!(!resolve_with_reference("2/30", reference()).is_valid);
        assert!(!resolve_with_reference("feb 30", reference()).is_valid);
        assert!(!resolve_with_reference("13/1", reference()).is_valid);
    }

    #[test]
    fn test_matching_ignores_case_and_whitespace() {
        let result = resolve_with_reference("  NeXt FriDay  ", reference());
        assert_eq!(result.date, Some(NaiveDate::from_ymd_opt(2024, 3, 29).unwrap()));
        assert_eq!(result.original, "  NeXt FriDay  ");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let first = resolve_with_reference("next tuesday", reference());
        let second = resolve_with_reference("next tuesday", reference());
        assert_eq!(first, second);
    }

    #[test]
    fn test_day_suffix() {
        assert_eq!(day_suffix(1), "st");
        assert_eq!(day_suffix(2), "nd");
        assert_eq!(day_suffix(3), "rd");
        assert_eq!(day_suffix(4), "th");
        assert_eq!(day_suffix(11), "th");
        assert_eq!(day_suffix(12), "th");
        assert_eq!(day_suffix(13), "th");
        assert_eq!(day_suffix(21), "st");
        assert_eq!(day_suffix(22), "nd");
        assert_eq!(day_suffix(23), "rd");
    }
}
