use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateOrder {
    MonthFirst,
    DayFirst,
}

/// Number and date conventions of a locale tag. Only the separator and
/// date-order distinctions that matter for query literals are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    decimal: char,
    group: char,
    date_order: DateOrder,
}

impl Default for Locale {
    fn default() -> Self {
        Self::EN
    }
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl Locale {
    pub const EN: Locale = Locale {
        decimal: '.',
        group: ',',
        date_order: DateOrder::MonthFirst,
    };

    pub const DE: Locale = Locale {
        decimal: ',',
        group: '.',
        date_order: DateOrder::DayFirst,
    };

    /// Resolves a BCP 47 style tag by its language subtag. Unknown
    /// languages fall back to English conventions.
    pub fn from_tag(tag: &str) -> Self {
        let language = tag
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" | "da" | "id" | "tr" => Self::DE,
            _ => Self::EN,
        }
    }

    /// Parses a plain decimal number. Group separators are accepted only in
    /// thousands positions, so `01.02.2024` is never read as a number.
    pub fn parse_number(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (int_part, frac_part) = match body.split_once(self.decimal) {
            Some((i, f)) => (i, Some(f)),
            None => (body, None),
        };
        if let Some(frac) = frac_part {
            if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
        }
        let digits = if int_part.contains(self.group) {
            let groups: Vec<&str> = int_part.split(self.group).collect();
            let head = groups[0];
            let head_ok = (1..=3).contains(&head.len()) && head.chars().all(|c| c.is_ascii_digit());
            let tail_ok = groups[1..]
                .iter()
                .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
            if !head_ok || !tail_ok {
                return None;
            }
            groups.concat()
        } else {
            if !int_part.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            int_part.to_string()
        };
        if digits.is_empty() && frac_part.is_none() {
            return None;
        }
        let mut canonical = String::with_capacity(text.len() + 2);
        if negative {
            canonical.push('-');
        }
        canonical.push_str(if digits.is_empty() { "0" } else { &digits });
        if let Some(frac) = frac_part {
            canonical.push('.');
            canonical.push_str(frac);
        }
        canonical.parse::<f64>().ok()
    }

    /// Parses ISO dates and date-times, plus the locale's own short form
    /// (`MM/DD/YYYY` or `DD.MM.YYYY`, optionally followed by a time).
    pub fn parse_date(&self, text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if let Some(dt) = parse_iso_datetime(text) {
            return Some(dt);
        }
        let (date_fmt, datetime_fmts): (&str, [&str; 2]) = match self.date_order {
            DateOrder::MonthFirst => ("%m/%d/%Y", ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"]),
            DateOrder::DayFirst => ("%d.%m.%Y", ["%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"]),
        };
        for fmt in datetime_fmts {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
        NaiveDate::parse_from_str(text, date_fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ndt| Utc.from_utc_datetime(&ndt))
    }
}

/// Locale independent parse used for stored `xs:date` / `xs:dateTime`
/// values. Naive values are taken as UTC.
pub fn parse_iso_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ISO_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}
