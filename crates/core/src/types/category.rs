//! Product category enum.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Apparel category a product belongs to.
///
/// Stored as lowercase text in the database (`product.category` carries a
/// CHECK constraint with the same values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Shortsleeves,
    Longsleeves,
    Sweatshirts,
    Hoodies,
}

impl Category {
    /// All known categories, in display order.
    pub const ALL: [Self; 4] = [
        Self::Shortsleeves,
        Self::Longsleeves,
        Self::Sweatshirts,
        Self::Hoodies,
    ];

    /// The lowercase wire/storage name of this category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shortsleeves => "shortsleeves",
            Self::Longsleeves => "longsleeves",
            Self::Sweatshirts => "sweatshirts",
            Self::Hoodies => "hoodies",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shortsleeves" => Ok(Self::Shortsleeves),
            "longsleeves" => Ok(Self::Longsleeves),
            "sweatshirts" => Ok(Self::Sweatshirts),
            "hoodies" => Ok(Self::Hoodies),
            _ => Err(format!("invalid product category: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_strings() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn rejects_unknown_categories() {
        assert!("jackets".parse::<Category>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Category::Hoodies).expect("serialize");
        assert_eq!(json, "\"hoodies\"");
    }
}
