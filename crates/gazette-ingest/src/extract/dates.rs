//! Publication date extraction.
//!
//! Two patterns, tried in order:
//! 1. era phrase `民国<年>年<月>月<日>日|号` with Chinese numerals,
//! 2. numeric `YYYY年M月D日`, `YY-M-D`, `YYYY/M/D`, in ASCII or full-width digits.
//!
//! Era years and two-digit numeric years are offset by 1911.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

/// Year 1 of the Republic era is 1912.
pub const ERA_OFFSET: i32 = 1911;

static ERA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"民国([零〇一二三四五六七八九十百]{1,4})年([一二三四五六七八九十]{1,2})月([一二三四五六七八九十]{1,2})[日号]",
    )
    .expect("valid era date regex")
});

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,4})[年/\-](\d{1,2})[月/\-](\d{1,2})[日号]?")
        .expect("valid numeric date regex")
});

/// Result of looking for a date in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOutcome {
    Found(NaiveDate),
    NotFound,
    /// A date-shaped phrase that does not name a real calendar day.
    Malformed(String),
}

impl DateOutcome {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Found(d) => Some(*d),
            _ => None,
        }
    }
}

impl Serialize for DateOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.date() {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }
}

/// Find the first date in `text`.
///
/// When the era pattern matches it decides the outcome; the numeric pattern
/// is only consulted when it does not.
pub fn extract_date(text: &str) -> DateOutcome {
    if let Some(caps) = ERA_RE.captures(text) {
        let phrase = &caps[0];
        let parts = (
            cjk_numeral_value(&caps[1]),
            cjk_numeral_value(&caps[2]),
            cjk_numeral_value(&caps[3]),
        );
        return match parts {
            (Some(y), Some(m), Some(d)) => {
                to_date(phrase, y as i32 + ERA_OFFSET, m, d)
            }
            _ => DateOutcome::Malformed(format!("unreadable numerals in '{}'", phrase)),
        };
    }

    if let Some(caps) = NUMERIC_RE.captures(text) {
        let phrase = &caps[0];
        let parts = (
            decimal_value(&caps[1]),
            decimal_value(&caps[2]),
            decimal_value(&caps[3]),
        );
        return match parts {
            (Some(y), Some(m), Some(d)) => {
                let mut y = y as i32;
                if y < 100 {
                    y += ERA_OFFSET;
                }
                to_date(phrase, y, m, d)
            }
            _ => DateOutcome::Malformed(format!("unreadable digits in '{}'", phrase)),
        };
    }

    DateOutcome::NotFound
}

fn to_date(phrase: &str, year: i32, month: u32, day: u32) -> DateOutcome {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => DateOutcome::Found(d),
        None => DateOutcome::Malformed(format!(
            "'{}' is not a calendar date ({}-{}-{})",
            phrase, year, month, day
        )),
    }
}

/// Parse ASCII or full-width (`０`-`９`) decimal digits.
fn decimal_value(s: &str) -> Option<u32> {
    s.chars().try_fold(0u32, |acc, c| {
        let digit = match c {
            '０'..='９' => c as u32 - '０' as u32,
            _ => c.to_digit(10)?,
        };
        acc.checked_mul(10)?.checked_add(digit)
    })
}

fn digit_value(c: char) -> Option<u32> {
    Some(match c {
        '零' | '〇' => 0,
        '一' => 1,
        '二' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => return None,
    })
}

/// Convert a Chinese numeral up to 999.
///
/// Positional when it contains 十 or 百 (`十五` = 15, `二十` = 20,
/// `一百零五` = 105), digit by digit otherwise (`一五` = 15).
pub fn cjk_numeral_value(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    if !s.chars().any(|c| c == '十' || c == '百') {
        return s
            .chars()
            .try_fold(0u32, |acc, c| Some(acc * 10 + digit_value(c)?));
    }

    let mut total = 0u32;
    let mut pending: Option<u32> = None;
    let mut last_unit = u32::MAX;
    for c in s.chars() {
        let unit = match c {
            '十' => 10,
            '百' => 100,
            '零' | '〇' => {
                pending = None;
                continue;
            }
            _ => {
                if pending.is_some() {
                    return None;
                }
                pending = Some(digit_value(c)?);
                continue;
            }
        };
        if unit >= last_unit {
            return None;
        }
        total += pending.take().unwrap_or(1) * unit;
        last_unit = unit;
    }
    Some(total + pending.unwrap_or(0))
}
