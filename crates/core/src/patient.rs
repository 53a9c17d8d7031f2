//! Patient metadata entered alongside a count.
//!
//! Age is never stored on [`PatientMeta`]; it is derived from the birth date on the
//! day it is needed (summary display, record save).

use crate::constants::BIRTH_DATE_FORMAT;
use crate::error::{CountError, CountResult};
use cellcount_types::NonEmptyText;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Unspecified,
    Male,
    Female,
}

impl Gender {
    pub fn name(self) -> &'static str {
        match self {
            Gender::Unspecified => "unspecified",
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gender {
    type Err = CountError;

    /// Blank input means unspecified.
    fn from_str(s: &str) -> CountResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unspecified" => Ok(Gender::Unspecified),
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(CountError::UnknownGender(other.to_string())),
        }
    }
}

/// Parse a `DD.MM.YYYY` birth date. Blank input is "not provided".
pub fn parse_birth_date(input: &str) -> CountResult<Option<NaiveDate>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, BIRTH_DATE_FORMAT)
        .map(Some)
        .map_err(|_| CountError::InvalidBirthDate(trimmed.to_string()))
}

pub fn format_birth_date(date: NaiveDate) -> String {
    date.format(BIRTH_DATE_FORMAT).to_string()
}

/// Completed years between `birth` and `today`.
///
/// Returns `None` when `birth` lies after `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }
    let birthday_pending = (today.month(), today.day()) < (birth.month(), birth.day());
    let years = today.year() - birth.year() - i32::from(birthday_pending);
    u32::try_from(years).ok()
}

/// Identity of the patient a count belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientMeta {
    pub patient_id: Option<NonEmptyText>,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
}

impl PatientMeta {
    /// Build metadata from raw form input.
    ///
    /// The identifier is trimmed and a blank identifier is treated as absent. The
    /// birth date must be `DD.MM.YYYY` or blank.
    pub fn from_input(patient_id: &str, gender: Gender, birth_date: &str) -> CountResult<Self> {
        Ok(Self {
            patient_id: NonEmptyText::optional(patient_id),
            gender,
            birth_date: parse_birth_date(birth_date)?,
        })
    }

    pub fn patient_id_str(&self) -> &str {
        self.patient_id.as_ref().map(NonEmptyText::as_str).unwrap_or("")
    }

    /// Age on `today`, if a usable birth date is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|birth| age_on(birth, today))
    }
}
