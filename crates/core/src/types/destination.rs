//! Shipping destination type.
//!
//! A [`Destination`] is a validated `(country, state, optional city)`
//! triple. Normalization happens exactly once, at construction: country and
//! state are trimmed and must be non-empty; the city is trimmed, and a
//! whitespace-only city is treated as absent.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Destination`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DestinationError {
    /// The country is empty or whitespace-only.
    #[error("country cannot be empty")]
    EmptyCountry,
    /// The state is empty or whitespace-only.
    #[error("state cannot be empty")]
    EmptyState,
}

/// A normalized shipping destination.
///
/// The city, when present, is kept verbatim after trimming - rule matching
/// against it is case-sensitive and exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    country: String,
    state: String,
    city: Option<String>,
}

impl Destination {
    /// Build a destination from raw form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the country or state is empty after trimming.
    pub fn new(
        country: &str,
        state: &str,
        city: Option<&str>,
    ) -> Result<Self, DestinationError> {
        let country = country.trim();
        if country.is_empty() {
            return Err(DestinationError::EmptyCountry);
        }

        let state = state.trim();
        if state.is_empty() {
            return Err(DestinationError::EmptyState);
        }

        let city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);

        Ok(Self {
            country: country.to_owned(),
            state: state.to_owned(),
            city,
        })
    }

    /// The destination country.
    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    /// The destination state.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// The destination city, if one was given.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.city {
            Some(city) => write!(f, "{}, {}, {}", city, self.state, self.country),
            None => write!(f, "{}, {}", self.state, self.country),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let dest = Destination::new(" Venezuela ", " Zulia ", Some(" Maracaibo ")).unwrap();
        assert_eq!(dest.country(), "Venezuela");
        assert_eq!(dest.state(), "Zulia");
        assert_eq!(dest.city(), Some("Maracaibo"));
    }

    #[test]
    fn test_whitespace_city_is_absent() {
        let dest = Destination::new("Venezuela", "Zulia", Some("   ")).unwrap();
        assert_eq!(dest.city(), None);

        let omitted = Destination::new("Venezuela", "Zulia", None).unwrap();
        assert_eq!(dest, omitted);
    }

    #[test]
    fn test_empty_country_rejected() {
        assert_eq!(
            Destination::new("  ", "Zulia", None),
            Err(DestinationError::EmptyCountry)
        );
    }

    #[test]
    fn test_empty_state_rejected() {
        assert_eq!(
            Destination::new("Venezuela", "", None),
            Err(DestinationError::EmptyState)
        );
    }

    #[test]
    fn test_city_case_preserved() {
        let dest = Destination::new("Venezuela", "Zulia", Some("MARACAIBO")).unwrap();
        assert_eq!(dest.city(), Some("MARACAIBO"));
    }

    #[test]
    fn test_display() {
        let dest = Destination::new("Venezuela", "Zulia", Some("Maracaibo")).unwrap();
        assert_eq!(dest.to_string(), "Maracaibo, Zulia, Venezuela");

        let statewide = Destination::new("Venezuela", "Zulia", None).unwrap();
        assert_eq!(statewide.to_string(), "Zulia, Venezuela");
    }
}
