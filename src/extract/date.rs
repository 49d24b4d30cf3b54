//! Russian long-form date parsing ("5 марта 2024" → "2024-03-05")

use regex::Regex;
use std::sync::OnceLock;

const MONTHS: &[(&str, &str)] = &[
    ("января", "01"),
    ("февраля", "02"),
    ("марта", "03"),
    ("апреля", "04"),
    ("мая", "05"),
    ("июня", "06"),
    ("июля", "07"),
    ("августа", "08"),
    ("сентября", "09"),
    ("октября", "10"),
    ("ноября", "11"),
    ("декабря", "12"),
];

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2})\s+([а-яА-ЯёЁ]+)\s+(\d{4})").expect("hardcoded regex pattern is valid")
    })
}

/// Finds the first "day month year" date in `text` and renders it as YYYY-MM-DD
///
/// An unrecognized month name maps to January.
pub fn parse_russian_date(text: &str) -> Option<String> {
    let captures = date_regex().captures(text)?;
    let day = captures.get(1)?.as_str();
    let month_name = captures.get(2)?.as_str().to_lowercase();
    let year = captures.get(3)?.as_str();

    let month = MONTHS
        .iter()
        .find(|(name, _)| *name == month_name)
        .map_or("01", |(_, number)| number);

    Some(format!("{}-{}-{:0>2}", year, month, day))
}
