//! The closed set of languages the product ships.

use std::fmt;
use std::str::FromStr;

use super::UnknownLanguage;

/// Language identifier selectable by the user.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Language {
    /// English.
    En,
    /// Hindi.
    Hi,
    /// Urdu.
    Ur,
    /// Kashmiri.
    Ks,
    /// Dogri.
    Dg,
}

impl Language {
    /// Every language, in presentation order.
    pub const ALL: [Self; 5] = [Self::En, Self::Hi, Self::Ur, Self::Ks, Self::Dg];

    /// Short identifier persisted as the user's preference.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Ur => "ur",
            Self::Ks => "ks",
            Self::Dg => "dg",
        }
    }

    /// Name of the language written in that language, for pickers.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "हिन्दी",
            Self::Ur => "اردو",
            Self::Ks => "کٲشُر",
            Self::Dg => "डोगरी",
        }
    }

    /// Whether the language is written right-to-left.
    #[must_use]
    pub const fn is_rtl(self) -> bool {
        matches!(self, Self::Ur | Self::Ks)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Parse a language code, ignoring surrounding whitespace and case.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let candidate = input.trim();
        Self::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(candidate))
            .ok_or_else(|| UnknownLanguage {
                code: candidate.to_owned(),
            })
    }
}
