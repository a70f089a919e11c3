//! User preferences consumed by the presentation layer.
//!
//! Preferences never influence balances or aggregates; they only select how
//! the shell formats amounts and which theme it applies.

use serde::{Deserialize, Serialize};

/// Currency codes offered by the settings picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
    Jpy,
    Cny,
    Inr,
}

impl Currency {
    /// All supported currencies in picker order.
    pub const ALL: [Currency; 8] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Cad,
        Currency::Aud,
        Currency::Jpy,
        Currency::Cny,
        Currency::Inr,
    ];

    /// ISO 4217 code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Jpy => "JPY",
            Self::Cny => "CNY",
            Self::Inr => "INR",
        }
    }

    /// Parses an ISO code case-insensitively; unsupported codes yield `None`.
    pub fn from_code(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|currency| currency.code() == normalized)
    }
}

/// Light/dark theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePreference {
    /// Follow the operating system appearance; `dark_mode` is ignored when set.
    pub use_system_theme: bool,
    pub dark_mode: bool,
}

impl Default for ThemePreference {
    fn default() -> Self {
        Self {
            use_system_theme: true,
            dark_mode: false,
        }
    }
}

/// Full preference set persisted per database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub currency: Currency,
    pub theme: ThemePreference,
}
