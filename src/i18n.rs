//! Locale handling and display-string resolution for localized records.
//!
//! Records carry one column per locale plus a legacy unlocalized column left
//! over from before localization. A display string is resolved in a fixed
//! order: requested locale, legacy column, the other locale, then a literal.
//! The legacy column outranks the other locale so that rows written before
//! localization keep showing what they always showed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Th,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Th, Locale::En];

    /// The single configured alternate.
    pub fn other(self) -> Locale {
        match self {
            Locale::Th => Locale::En,
            Locale::En => Locale::Th,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Th => "th",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "th" => Ok(Locale::Th),
            "en" => Ok(Locale::En),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Name,
    Description,
    Category,
}

/// Where a localized value lives on a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Locale(Locale),
    Legacy,
}

/// Implemented by records with per-locale text columns.
pub trait Localized {
    /// Raw column lookup; `None` when the record has no such column or it is null.
    fn text(&self, field: TextField, slot: Slot) -> Option<&str>;

    /// Literal shown when every column is empty.
    fn fallback(&self, field: TextField) -> &'static str;
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn resolve<T: Localized + ?Sized>(entity: &T, field: TextField, locale: Locale) -> String {
    non_empty(entity.text(field, Slot::Locale(locale)))
        .or_else(|| non_empty(entity.text(field, Slot::Legacy)))
        .or_else(|| non_empty(entity.text(field, Slot::Locale(locale.other()))))
        .unwrap_or_else(|| entity.fallback(field))
        .to_string()
}
