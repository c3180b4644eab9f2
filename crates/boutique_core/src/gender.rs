use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const MALE_CODE: char = 'M';
    pub const FEMALE_CODE: char = 'F';

    /// Maps a SPID trait letter to a gender. Lowercase letters are accepted.
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            Self::MALE_CODE => Some(Self::Male),
            Self::FEMALE_CODE => Some(Self::Female),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match *self {
            Self::Male => Self::MALE_CODE,
            Self::Female => Self::FEMALE_CODE,
        }
    }

    pub fn opposite(&self) -> Self {
        match *self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }

    /// Parses the SkyPatcher `filterByGender` value.
    pub fn from_keyword(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("male") {
            Some(Self::Male)
        } else if value.eq_ignore_ascii_case("female") {
            Some(Self::Female)
        } else {
            None
        }
    }

    pub fn keyword(&self) -> &'static str {
        match *self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
