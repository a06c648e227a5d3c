//! Card helpers: brand classification, e-commerce indicator mapping and
//! ISO-4217 numeric currency codes.

use std::fmt;

/// Card brand, as sent in the legacy `CardType` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardType {
    /// Visa.
    Visa,
    /// MasterCard.
    MasterCard,
    /// American Express.
    Amex,
    /// Diners Club.
    Diners,
    /// Discover.
    Discover,
}

impl CardType {
    /// Wire name of the brand.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "Visa",
            Self::MasterCard => "MasterCard",
            Self::Amex => "Amex",
            Self::Diners => "Diners",
            Self::Discover => "Discover",
        }
    }

    /// Classifies a PAN by its leading digits.
    ///
    /// Rules are checked in order and the first match wins; a PAN matching nothing is
    /// treated as Visa. Ranges compare the PAN prefix as a string, not as a number, so a
    /// PAN shorter than the range bounds never falls inside the range.
    ///
    /// # Examples
    ///
    /// ```
    /// use iveri_gateway::card::CardType;
    ///
    /// assert_eq!(CardType::classify("4111111111111111"), CardType::Visa);
    /// assert_eq!(CardType::classify("5500000000000004"), CardType::MasterCard);
    /// assert_eq!(CardType::classify("601100000000"), CardType::Discover);
    /// ```
    #[must_use]
    pub fn classify(pan: &str) -> Self {
        let pan = pan.trim();
        RULES
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|pattern| pattern.matches(pan)))
            .map_or(Self::Visa, |(card_type, _)| *card_type)
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Prefix(&'static str),
    Range(&'static str, &'static str),
}

impl Pattern {
    fn matches(self, pan: &str) -> bool {
        match self {
            Self::Prefix(prefix) => pan.starts_with(prefix),
            Self::Range(low, high) => {
                let head = pan.get(..low.len()).unwrap_or(pan);
                head >= low && head <= high
            }
        }
    }
}

const RULES: &[(CardType, &[Pattern])] = &[
    (CardType::Visa, &[Pattern::Prefix("4")]),
    (CardType::MasterCard, &[Pattern::Range("51", "55")]),
    (CardType::Amex, &[Pattern::Prefix("34"), Pattern::Prefix("37")]),
    (
        CardType::Diners,
        &[
            Pattern::Prefix("36"),
            Pattern::Prefix("2014"),
            Pattern::Prefix("2149"),
            Pattern::Range("300", "305"),
        ],
    ),
    (
        CardType::Discover,
        &[
            Pattern::Prefix("6011"),
            Pattern::Range("622126", "622925"),
            Pattern::Range("644", "649"),
            Pattern::Prefix("65"),
        ],
    ),
];

/// Symbolic e-commerce indicator sent with a REST debit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EciFlag {
    /// Secure channel without cardholder authentication.
    SecureChannel,
    /// Authentication was attempted.
    #[default]
    ThreeDSecureAttempted,
    /// Cardholder fully authenticated.
    ThreeDSecure,
}

impl EciFlag {
    /// Maps a two-digit ECI code. Unknown or missing codes map to
    /// [`EciFlag::ThreeDSecureAttempted`].
    ///
    /// # Examples
    ///
    /// ```
    /// use iveri_gateway::card::EciFlag;
    ///
    /// assert_eq!(EciFlag::from_code(Some("02")), EciFlag::ThreeDSecure);
    /// assert_eq!(EciFlag::from_code(Some("99")), EciFlag::ThreeDSecureAttempted);
    /// ```
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("00" | "07") => Self::SecureChannel,
            Some("02" | "05") => Self::ThreeDSecure,
            _ => Self::ThreeDSecureAttempted,
        }
    }

    /// Wire name of the flag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecureChannel => "SecureChannel",
            Self::ThreeDSecureAttempted => "ThreeDSecureAttempted",
            Self::ThreeDSecure => "ThreeDSecure",
        }
    }
}

impl fmt::Display for EciFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CURRENCIES: &[(&str, &str)] = &[
    ("AUD", "036"),
    ("BWP", "072"),
    ("CAD", "124"),
    ("CHF", "756"),
    ("CNY", "156"),
    ("EUR", "978"),
    ("GBP", "826"),
    ("JPY", "392"),
    ("KES", "404"),
    ("LSL", "426"),
    ("MUR", "480"),
    ("MZN", "943"),
    ("NAD", "516"),
    ("NGN", "566"),
    ("SZL", "748"),
    ("USD", "840"),
    ("ZAR", "710"),
    ("ZMW", "967"),
];

/// Returns the ISO-4217 numeric code for an alphabetic currency code.
///
/// Codes that are already numeric, or unknown, are returned unchanged.
#[must_use]
pub fn numeric_currency_code(currency: &str) -> &str {
    let currency = currency.trim();
    CURRENCIES
        .iter()
        .find(|(alpha, _)| alpha.eq_ignore_ascii_case(currency))
        .map_or(currency, |(_, numeric)| numeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_brands() {
        assert_eq!(CardType::classify("4111111111111111"), CardType::Visa);
        assert_eq!(CardType::classify("5105105105105100"), CardType::MasterCard);
        assert_eq!(CardType::classify("5555555555554444"), CardType::MasterCard);
        assert_eq!(CardType::classify("378282246310005"), CardType::Amex);
        assert_eq!(CardType::classify("340000000000009"), CardType::Amex);
        assert_eq!(CardType::classify("36227206271667"), CardType::Diners);
        assert_eq!(CardType::classify("30569309025904"), CardType::Diners);
        assert_eq!(CardType::classify("201400000000009"), CardType::Diners);
        assert_eq!(CardType::classify("601100000000"), CardType::Discover);
        assert_eq!(CardType::classify("6500000000000002"), CardType::Discover);
    }

    #[test]
    fn test_classify_range_boundaries() {
        assert_eq!(CardType::classify("5000000000000000"), CardType::Visa);
        assert_eq!(CardType::classify("5600000000000000"), CardType::Visa);
        assert_eq!(CardType::classify("3000000000000000"), CardType::Diners);
        assert_eq!(CardType::classify("3050000000000000"), CardType::Diners);
        assert_eq!(CardType::classify("3060000000000000"), CardType::Visa);
        assert_eq!(CardType::classify("6221250000000000"), CardType::Visa);
        assert_eq!(CardType::classify("6221260000000000"), CardType::Discover);
        assert_eq!(CardType::classify("6229250000000000"), CardType::Discover);
        assert_eq!(CardType::classify("6229260000000000"), CardType::Visa);
        assert_eq!(CardType::classify("6440000000000000"), CardType::Discover);
        assert_eq!(CardType::classify("6490000000000000"), CardType::Discover);
        assert_eq!(CardType::classify("6430000000000000"), CardType::Visa);
    }

    #[test]
    fn test_classify_short_prefixes_compare_lexically() {
        assert_eq!(CardType::classify("6"), CardType::Visa);
        assert_eq!(CardType::classify("5"), CardType::Visa);
        assert_eq!(CardType::classify("30"), CardType::Visa);
        assert_eq!(CardType::classify("64"), CardType::Visa);
        assert_eq!(CardType::classify(""), CardType::Visa);
    }

    #[test]
    fn test_classify_unknown_defaults_to_visa() {
        assert_eq!(CardType::classify("9999999999999999"), CardType::Visa);
        assert_eq!(CardType::classify("1234"), CardType::Visa);
    }

    #[test]
    fn test_card_type_display() {
        assert_eq!(CardType::MasterCard.to_string(), "MasterCard");
        assert_eq!(CardType::Amex.as_str(), "Amex");
    }

    #[test]
    fn test_eci_flag_table() {
        assert_eq!(EciFlag::from_code(Some("00")), EciFlag::SecureChannel);
        assert_eq!(EciFlag::from_code(Some("01")), EciFlag::ThreeDSecureAttempted);
        assert_eq!(EciFlag::from_code(Some("02")), EciFlag::ThreeDSecure);
        assert_eq!(EciFlag::from_code(Some("05")), EciFlag::ThreeDSecure);
        assert_eq!(EciFlag::from_code(Some("06")), EciFlag::ThreeDSecureAttempted);
        assert_eq!(EciFlag::from_code(Some("07")), EciFlag::SecureChannel);
    }

    #[test]
    fn test_eci_flag_unknown_and_missing() {
        assert_eq!(EciFlag::from_code(Some("99")), EciFlag::ThreeDSecureAttempted);
        assert_eq!(EciFlag::from_code(Some("")), EciFlag::ThreeDSecureAttempted);
        assert_eq!(EciFlag::from_code(None), EciFlag::ThreeDSecureAttempted);
        assert_eq!(EciFlag::default(), EciFlag::ThreeDSecureAttempted);
    }

    #[test]
    fn test_eci_flag_wire_names() {
        assert_eq!(EciFlag::ThreeDSecure.to_string(), "ThreeDSecure");
        assert_eq!(EciFlag::SecureChannel.as_str(), "SecureChannel");
    }

    #[test]
    fn test_numeric_currency_code() {
        assert_eq!(numeric_currency_code("ZAR"), "710");
        assert_eq!(numeric_currency_code("usd"), "840");
        assert_eq!(numeric_currency_code("710"), "710");
        assert_eq!(numeric_currency_code("XYZ"), "XYZ");
    }
}
