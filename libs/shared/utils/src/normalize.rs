use chrono::{Datelike, NaiveDate, Utc};

/// Formats tried in order when normalizing a date pulled out of free text.
/// Scanned records mix `02 MAY 2022`, `04-JUL-2024`, `22-May-72`,
/// `August 22, 2023`, ISO dates and US slash dates.
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%d %b %Y", false),
    ("%d-%b-%Y", false),
    ("%d-%b-%y", true),
    ("%B %d, %Y", false),
    ("%Y-%m-%d", false),
    ("%m/%d/%Y", false),
    ("%m/%d/%y", true),
];

/// Capitalizes the first letter of each space-separated word and lowercases
/// the rest. Used on name and address fields before persistence.
pub fn title_case_words(raw: &str) -> String {
    raw.trim()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str().to_lowercase()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses a free-text sex value to "M" or "F" by its first letter.
pub fn normalize_sex(raw: &str) -> Option<&'static str> {
    match raw.trim().chars().next()?.to_ascii_lowercase() {
        'm' => Some("M"),
        'f' => Some("F"),
        _ => None,
    }
}

/// Tries the known date formats in order. Two-digit years always resolve to
/// the past: a year beyond the current one's last two digits means 19xx.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for (format, two_digit_year) in DATE_FORMATS {
        let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) else {
            continue;
        };

        if *two_digit_year {
            if let Some(resolved) = resolve_two_digit_year(parsed) {
                return Some(resolved);
            }
            continue;
        }

        // chrono's %Y accepts short year strings; leave those to the
        // two-digit formats further down the list.
        if parsed.year() < 1000 {
            continue;
        }

        return Some(parsed);
    }

    None
}

/// Canonical `YYYY-MM-DD` rendering of whatever `parse_flexible_date`
/// recognizes; None when nothing matches.
pub fn normalize_date_string(raw: &str) -> Option<String> {
    parse_flexible_date(raw).map(|date| date.format("%Y-%m-%d").to_string())
}

/// Whole years between a date of birth and a reference date, one less when
/// the reference month/day falls before the birthday that year. None when
/// the reference date precedes the date of birth.
pub fn age_on(date_of_birth: NaiveDate, reference: NaiveDate) -> Option<i32> {
    reference.years_since(date_of_birth).map(|years| years as i32)
}

// chrono's %y picks its own century; re-resolve against the current year so
// record dates never land in the future.
fn resolve_two_digit_year(parsed: NaiveDate) -> Option<NaiveDate> {
    let two_digits = parsed.year() % 100;
    let current_two_digits = Utc::now().year() % 100;
    let year = if two_digits > current_two_digits {
        1900 + two_digits
    } else {
        2000 + two_digits
    };

    NaiveDate::from_ymd_opt(year, parsed.month(), parsed.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_words() {
        assert_eq!(title_case_words("juan dela cruz"), "Juan Dela Cruz");
        assert_eq!(title_case_words("MARIA CLARA"), "Maria Clara");
        assert_eq!(title_case_words("  quezon city  "), "Quezon City");
        assert_eq!(title_case_words(""), "");
    }

    #[test]
    fn test_normalize_sex() {
        assert_eq!(normalize_sex("M"), Some("M"));
        assert_eq!(normalize_sex("male"), Some("M"));
        assert_eq!(normalize_sex("Female"), Some("F"));
        assert_eq!(normalize_sex("f"), Some("F"));
        assert_eq!(normalize_sex("unknown"), None);
        assert_eq!(normalize_sex(""), None);
    }

    #[test]
    fn test_normalize_date_abbreviated_month() {
        assert_eq!(normalize_date_string("04-JUL-2024").as_deref(), Some("2024-07-04"));
        assert_eq!(normalize_date_string("02 MAY 2022").as_deref(), Some("2022-05-02"));
    }

    #[test]
    fn test_normalize_date_two_digit_year_resolves_to_past() {
        assert_eq!(normalize_date_string("13-Oct-91").as_deref(), Some("1991-10-13"));
        assert_eq!(normalize_date_string("22-May-72").as_deref(), Some("1972-05-22"));
    }

    #[test]
    fn test_normalize_date_long_and_slash_forms() {
        assert_eq!(normalize_date_string("August 22, 2023").as_deref(), Some("2023-08-22"));
        assert_eq!(normalize_date_string("4/27/2022").as_deref(), Some("2022-04-27"));
        assert_eq!(normalize_date_string("2024-01-31").as_deref(), Some("2024-01-31"));
    }

    #[test]
    fn test_normalize_date_unparseable_is_none() {
        assert_eq!(normalize_date_string("not a date"), None);
        assert_eq!(normalize_date_string(""), None);
        assert_eq!(normalize_date_string("32-JAN-2024"), None);
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        let dob = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();

        let day_before = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        assert_eq!(age_on(dob, day_before), Some(33));

        let birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(age_on(dob, birthday), Some(34));
    }

    #[test]
    fn test_age_on_before_birth_is_none() {
        let dob = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        let earlier = NaiveDate::from_ymd_opt(1989, 1, 1).unwrap();
        assert_eq!(age_on(dob, earlier), None);
    }
}
