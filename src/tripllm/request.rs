//! The caller-facing description of a trip.
//!
//! A [`TravelRequest`] is immutable once built. The orchestrator validates it
//! and renders it to the text block every agent chain starts from.

use crate::orchestration::PlanningError;
use serde::{Deserialize, Serialize};

/// A trip to plan.
///
/// ```
/// use tripllm::TravelRequest;
///
/// let request = TravelRequest::new("Tokyo, Japan", "March 15-25, 2025", 4500.0, 2)
///     .with_interests(vec!["culture", "food"])
///     .with_accommodation_type("boutique hotel");
///
/// assert!(request.validate().is_ok());
/// assert!(request.to_prompt().contains("- Budget: $4,500.00"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub destination: String,
    pub travel_dates: String,
    /// Total budget in dollars. Must be finite and non-negative.
    pub budget: f64,
    /// Must be at least 1.
    #[serde(rename = "travelers")]
    pub traveler_count: u32,
    pub interests: Vec<String>,
    pub accommodation_type: String,
}

pub const DEFAULT_ACCOMMODATION: &str = "hotel";

impl TravelRequest {
    pub fn new(
        destination: impl Into<String>,
        travel_dates: impl Into<String>,
        budget: f64,
        traveler_count: u32,
    ) -> Self {
        Self {
            destination: destination.into(),
            travel_dates: travel_dates.into(),
            budget,
            traveler_count,
            interests: Vec::new(),
            accommodation_type: DEFAULT_ACCOMMODATION.to_string(),
        }
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_accommodation_type(mut self, accommodation_type: impl Into<String>) -> Self {
        self.accommodation_type = accommodation_type.into();
        self
    }

    /// Check the caller-side constraints.
    ///
    /// # Errors
    ///
    /// [`PlanningError::InvalidRequest`] when the traveler count is zero or the
    /// budget is negative or not a finite number.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.traveler_count < 1 {
            return Err(PlanningError::InvalidRequest(
                "traveler_count must be at least 1".to_string(),
            ));
        }
        if !self.budget.is_finite() {
            return Err(PlanningError::InvalidRequest(format!(
                "budget must be a finite number, got {}",
                self.budget
            )));
        }
        if self.budget < 0.0 {
            return Err(PlanningError::InvalidRequest(format!(
                "budget must be non-negative, got {}",
                self.budget
            )));
        }
        Ok(())
    }

    /// Render the request as the text block handed to the first agent.
    pub fn to_prompt(&self) -> String {
        format!(
            "Travel Request Details:\n\
             - Destination: {}\n\
             - Travel Dates: {}\n\
             - Budget: {}\n\
             - Number of Travelers: {}\n\
             - Interests: {}\n\
             - Accommodation Type: {}",
            self.destination,
            self.travel_dates,
            format_currency(self.budget),
            self.traveler_count,
            self.interests.join(", "),
            self.accommodation_type
        )
    }
}

/// Format a dollar amount with thousands separators and two decimals.
///
/// ```
/// use tripllm::request::format_currency;
///
/// assert_eq!(format_currency(4500.0), "$4,500.00");
/// assert_eq!(format_currency(1234567.891), "$1,234,567.89");
/// assert_eq!(format_currency(0.5), "$0.50");
/// ```
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_at(fixed.len() - 3);

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accommodation_is_hotel() {
        let request = TravelRequest::new("Iceland", "June 10-17, 2025", 3200.0, 1);
        assert_eq!(request.accommodation_type, "hotel");
        assert!(request.interests.is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_travelers() {
        let request = TravelRequest::new("Iceland", "June", 3200.0, 0);
        assert!(matches!(
            request.validate(),
            Err(PlanningError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_and_nan_budget() {
        assert!(TravelRequest::new("Oslo", "May", -1.0, 1).validate().is_err());
        assert!(TravelRequest::new("Oslo", "May", f64::NAN, 1).validate().is_err());
        assert!(TravelRequest::new("Oslo", "May", f64::INFINITY, 1).validate().is_err());
        assert!(TravelRequest::new("Oslo", "May", 0.0, 1).validate().is_ok());
    }

    #[test]
    fn test_prompt_lists_every_field() {
        let request = TravelRequest::new("Iceland", "June 10-17, 2025", 3200.0, 1)
            .with_interests(vec!["nature", "hot springs"])
            .with_accommodation_type("guesthouse");
        let prompt = request.to_prompt();
        assert_eq!(
            prompt,
            "Travel Request Details:\n\
             - Destination: Iceland\n\
             - Travel Dates: June 10-17, 2025\n\
             - Budget: $3,200.00\n\
             - Number of Travelers: 1\n\
             - Interests: nature, hot springs\n\
             - Accommodation Type: guesthouse"
        );
    }

    #[test]
    fn test_format_currency_small_and_round_values() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(100.0), "$100.00");
        assert_eq!(format_currency(-42.1), "-$42.10");
    }
}
