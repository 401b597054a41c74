//! Locale aware formatting of money and dates for display.
//!
//! Only the locales the apps ship with are supported. Formatting is a pure
//! function of its inputs.

use std::{str::FromStr, sync::OnceLock};

use numfmt::{Formatter, Precision};

use serde::{Deserialize, Serialize};
use time::{Date, Month};

const NO_BREAK_SPACE: char = '\u{a0}';

/// A locale the apps can be displayed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    /// Brazilian Portuguese, amounts in Brazilian reais (BRL).
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    /// American English, amounts in US dollars (USD).
    #[serde(rename = "en-US")]
    EnUs,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pt-BR" => Ok(Locale::PtBr),
            "en-US" => Ok(Locale::EnUs),
            other => Err(format!("unsupported locale \"{other}\"")),
        }
    }
}

/// How much detail to show in a formatted date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// Numbers only, e.g. "17/10/2026".
    #[default]
    Short,
    /// Abbreviated month name, e.g. "17 de out. de 2026".
    Medium,
    /// Full month name, e.g. "17 de outubro de 2026".
    Long,
}

/// Format `value` as money in the currency of `locale`.
///
/// The sign is always shown, including for zero, e.g. `+R$ 1.234,50` and
/// `-R$ 1.234,50` for `pt-BR` (with a non-breaking space after the symbol),
/// or `+$1,234.50` for `en-US`. Values are rounded to the nearest cent and
/// the sign is taken from the rounded value.
pub fn format_currency(value: f64, locale: Locale) -> String {
    let cents = (value * 100.0).round();
    let sign = if cents < 0.0 { '-' } else { '+' };

    let amount = if cents == 0.0 {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        match locale {
            Locale::PtBr => format!("R${NO_BREAK_SPACE}0,00"),
            Locale::EnUs => "$0.00".to_owned(),
        }
    } else {
        let formatted = currency_formatter(locale).fmt_string(cents.abs() / 100.0);
        pad_cents(formatted, decimal_marker(locale))
    };

    format!("{sign}{amount}")
}

fn currency_formatter(locale: Locale) -> &'static Formatter {
    static PT_BR_FMT: OnceLock<Formatter> = OnceLock::new();
    static EN_US_FMT: OnceLock<Formatter> = OnceLock::new();

    match locale {
        Locale::PtBr => PT_BR_FMT.get_or_init(|| {
            Formatter::new()
                .separator('.')
                .expect("'.' is a valid separator")
                .comma(true)
                .prefix("R$\u{a0}")
                .expect("the BRL symbol is a valid prefix")
                .precision(Precision::Decimals(2))
        }),
        Locale::EnUs => EN_US_FMT.get_or_init(|| {
            Formatter::currency("$")
                .expect("the USD symbol is a valid prefix")
                .precision(Precision::Decimals(2))
        }),
    }
}

fn decimal_marker(locale: Locale) -> char {
    match locale {
        Locale::PtBr => ',',
        Locale::EnUs => '.',
    }
}

/// numfmt drops trailing zeros after the decimal marker, e.g. "12.30" is
/// rendered as "12.3" and "12.00" as "12", so put them back.
fn pad_cents(mut formatted: String, decimal_marker: char) -> String {
    let decimals = match formatted.rfind(decimal_marker) {
        Some(index) => formatted.len() - index - decimal_marker.len_utf8(),
        None => {
            formatted.push(decimal_marker);
            0
        }
    };

    for _ in decimals..2 {
        formatted.push('0');
    }

    formatted
}

/// Format `date` in the given `style` for `locale`.
pub fn format_date(date: Date, style: DateStyle, locale: Locale) -> String {
    let day = date.day();
    let month = date.month();
    let year = date.year();

    match (locale, style) {
        (Locale::PtBr, DateStyle::Short) => format!("{day:02}/{:02}/{year}", u8::from(month)),
        (Locale::PtBr, DateStyle::Medium) => {
            format!("{day} de {} de {year}", pt_br_month_abbreviation(month))
        }
        (Locale::PtBr, DateStyle::Long) => {
            format!("{day} de {} de {year}", pt_br_month_name(month))
        }
        (Locale::EnUs, DateStyle::Short) => {
            format!("{}/{day}/{:02}", u8::from(month), year.rem_euclid(100))
        }
        (Locale::EnUs, DateStyle::Medium) => {
            format!("{} {day}, {year}", &en_us_month_name(month)[..3])
        }
        (Locale::EnUs, DateStyle::Long) => format!("{} {day}, {year}", en_us_month_name(month)),
    }
}

fn pt_br_month_name(month: Month) -> &'static str {
    match month {
        Month::January => "janeiro",
        Month::February => "fevereiro",
        Month::March => "março",
        Month::April => "abril",
        Month::May => "maio",
        Month::June => "junho",
        Month::July => "julho",
        Month::August => "agosto",
        Month::September => "setembro",
        Month::October => "outubro",
        Month::November => "novembro",
        Month::December => "dezembro",
    }
}

fn pt_br_month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "jan.",
        Month::February => "fev.",
        Month::March => "mar.",
        Month::April => "abr.",
        Month::May => "mai.",
        Month::June => "jun.",
        Month::July => "jul.",
        Month::August => "ago.",
        Month::September => "set.",
        Month::October => "out.",
        Month::November => "nov.",
        Month::December => "dez.",
    }
}

fn en_us_month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}
