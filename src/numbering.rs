use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const ARTICLE_NUMBER_PATTERN: &str =
    r"\d+(?:\s*-\s*(?:bis|ter|quater|quinquies|sexies|septies|octies|novies|decies)\b)?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrdinalSuffix {
    Bis,
    Ter,
    Quater,
    Quinquies,
    Sexies,
    Septies,
    Octies,
    Novies,
    Decies,
}

impl OrdinalSuffix {
    pub const ALL: [OrdinalSuffix; 9] = [
        OrdinalSuffix::Bis,
        OrdinalSuffix::Ter,
        OrdinalSuffix::Quater,
        OrdinalSuffix::Quinquies,
        OrdinalSuffix::Sexies,
        OrdinalSuffix::Septies,
        OrdinalSuffix::Octies,
        OrdinalSuffix::Novies,
        OrdinalSuffix::Decies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrdinalSuffix::Bis => "bis",
            OrdinalSuffix::Ter => "ter",
            OrdinalSuffix::Quater => "quater",
            OrdinalSuffix::Quinquies => "quinquies",
            OrdinalSuffix::Sexies => "sexies",
            OrdinalSuffix::Septies => "septies",
            OrdinalSuffix::Octies => "octies",
            OrdinalSuffix::Novies => "novies",
            OrdinalSuffix::Decies => "decies",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|suffix| suffix.as_str() == lowered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArticleNumber {
    pub number: u32,
    pub suffix: Option<OrdinalSuffix>,
}

impl fmt::Display for ArticleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suffix {
            Some(suffix) => write!(f, "{}-{}", self.number, suffix.as_str()),
            None => write!(f, "{}", self.number),
        }
    }
}

impl FromStr for ArticleNumber {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let compact = raw
            .chars()
            .filter(|character| !character.is_whitespace())
            .collect::<String>();
        let (digits, suffix) = match compact.split_once('-') {
            Some((digits, suffix)) => (digits, Some(suffix)),
            None => (compact.as_str(), None),
        };

        let number = digits
            .parse::<u32>()
            .with_context(|| format!("invalid article number: {raw}"))?;
        let suffix = match suffix {
            Some(value) => match OrdinalSuffix::parse(value) {
                Some(parsed) => Some(parsed),
                None => bail!("unknown article suffix in {raw}"),
            },
            None => None,
        };

        Ok(Self { number, suffix })
    }
}

impl Serialize for ArticleNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArticleNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

pub fn roman_to_int(roman: &str) -> u32 {
    let mut total = 0u32;
    let mut previous = 0u32;

    for character in roman.trim().chars().rev() {
        let value = match character.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => 0,
        };
        if value < previous {
            total = total.saturating_sub(value);
        } else {
            total += value;
            previous = value;
        }
    }

    total
}
