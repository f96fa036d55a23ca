use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An anchor on the source page that points at the booking vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub raw_url: String,
    pub hyperlink_text: String,
    pub source_page_url: String,
}

/// Vendor's numeric key for a bookable property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One check-in/check-out pair sent to the vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateProbe {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl DateProbe {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

impl fmt::Display for DateProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nights = self.nights();
        write!(
            f,
            "{} to {} ({} {})",
            self.check_in.format("%Y-%m-%d"),
            self.check_out.format("%Y-%m-%d"),
            nights,
            if nights == 1 { "night" } else { "nights" }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
    Error,
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

/// Outcome of verifying one discovered link.
///
/// Built only through [`VerificationResult::available`],
/// [`VerificationResult::unavailable`] and [`VerificationResult::errored`], so
/// `error_message` is set exactly when the status is not `Available` and
/// `successful_dates` is set exactly when it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub property_id: Option<PropertyId>,
    pub hyperlink_text: String,
    pub vendor_url: String,
    pub actual_name: Option<String>,
    pub status: AvailabilityStatus,
    pub successful_dates: Option<DateProbe>,
    pub dates_tried: Vec<DateProbe>,
    pub currency: String,
    pub daily_rate: Option<f64>,
    pub error_message: Option<String>,
    pub source_page_url: String,
}

/// Vendor-reported details of a successful probe
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub name: Option<String>,
    pub daily_rate: f64,
    pub dates: DateProbe,
}

impl VerificationResult {
    pub fn available(
        link: &LinkRecord,
        property_id: PropertyId,
        currency: &str,
        dates_tried: Vec<DateProbe>,
        booking: Booking,
    ) -> Self {
        Self {
            property_id: Some(property_id),
            hyperlink_text: link.hyperlink_text.clone(),
            vendor_url: link.raw_url.clone(),
            actual_name: booking.name,
            status: AvailabilityStatus::Available,
            successful_dates: Some(booking.dates),
            dates_tried,
            currency: currency.to_string(),
            daily_rate: Some(booking.daily_rate),
            error_message: None,
            source_page_url: link.source_page_url.clone(),
        }
    }

    pub fn unavailable(
        link: &LinkRecord,
        property_id: PropertyId,
        currency: &str,
        dates_tried: Vec<DateProbe>,
        reason: impl Into<String>,
    ) -> Self {
        Self::failed(
            link,
            Some(property_id),
            AvailabilityStatus::Unavailable,
            currency,
            dates_tried,
            reason.into(),
        )
    }

    pub fn errored(
        link: &LinkRecord,
        property_id: Option<PropertyId>,
        currency: &str,
        dates_tried: Vec<DateProbe>,
        message: impl Into<String>,
    ) -> Self {
        Self::failed(
            link,
            property_id,
            AvailabilityStatus::Error,
            currency,
            dates_tried,
            message.into(),
        )
    }

    fn failed(
        link: &LinkRecord,
        property_id: Option<PropertyId>,
        status: AvailabilityStatus,
        currency: &str,
        dates_tried: Vec<DateProbe>,
        message: String,
    ) -> Self {
        // an empty message would break the status/message pairing
        let message = if message.trim().is_empty() {
            format!("{} without further detail", status)
        } else {
            message
        };

        Self {
            property_id,
            hyperlink_text: link.hyperlink_text.clone(),
            vendor_url: link.raw_url.clone(),
            actual_name: None,
            status,
            successful_dates: None,
            dates_tried,
            currency: currency.to_string(),
            daily_rate: None,
            error_message: Some(message),
            source_page_url: link.source_page_url.clone(),
        }
    }

    /// Name shown in summaries: vendor name when known, link text otherwise
    pub fn display_name(&self) -> &str {
        self.actual_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.hyperlink_text)
    }
}

/// Health label of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunHealth {
    Healthy,
    Issues,
}

/// One property line inside a [`RunSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryProperty {
    pub hotel_name: String,
    pub property_id: Option<PropertyId>,
    pub url: String,
    pub availability_status: AvailabilityStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Aggregate statistics for one run, consumed by the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub destination: Option<String>,
    pub source_page_url: String,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    pub error: usize,
    pub status: RunHealth,
    #[serde(default)]
    pub unavailable_properties: Vec<SummaryProperty>,
    #[serde(default)]
    pub all_properties: Vec<SummaryProperty>,
}

impl RunSummary {
    pub fn from_results(
        source_page_url: &str,
        destination: Option<&str>,
        results: &[VerificationResult],
        timestamp: DateTime<Utc>,
    ) -> Self {
        let count = |status: AvailabilityStatus| results.iter().filter(|r| r.status == status).count();
        let available = count(AvailabilityStatus::Available);
        let unavailable = count(AvailabilityStatus::Unavailable);
        let error = count(AvailabilityStatus::Error);

        let all_properties: Vec<SummaryProperty> = results.iter().map(SummaryProperty::from).collect();
        let unavailable_properties = all_properties
            .iter()
            .filter(|p| p.availability_status != AvailabilityStatus::Available)
            .cloned()
            .collect();

        Self {
            destination: destination.map(str::to_string),
            source_page_url: source_page_url.to_string(),
            timestamp,
            total: results.len(),
            available,
            unavailable,
            error,
            status: if unavailable + error == 0 {
                RunHealth::Healthy
            } else {
                RunHealth::Issues
            },
            unavailable_properties,
            all_properties,
        }
    }

    pub fn issues(&self) -> usize {
        self.unavailable + self.error
    }
}

impl From<&VerificationResult> for SummaryProperty {
    fn from(result: &VerificationResult) -> Self {
        Self {
            hotel_name: result.display_name().to_string(),
            property_id: result.property_id,
            url: result.vendor_url.clone(),
            availability_status: result.status,
            error_message: result.error_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> LinkRecord {
        LinkRecord {
            raw_url: "https://vendor.example/search?hid=7".to_string(),
            hyperlink_text: "Sea View Villa".to_string(),
            source_page_url: "https://blog.example/bali".to_string(),
        }
    }

    fn probe(day: u32) -> DateProbe {
        let check_in = NaiveDate::from_ymd_opt(2026, 11, day).unwrap();
        DateProbe {
            check_in,
            check_out: check_in + chrono::Days::new(2),
        }
    }

    #[test]
    fn date_probe_formats_with_night_count() {
        assert_eq!(probe(4).to_string(), "2026-11-04 to 2026-11-06 (2 nights)");

        let one = DateProbe {
            check_in: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        };
        assert_eq!(one.to_string(), "2026-01-31 to 2026-02-01 (1 night)");
    }

    #[test]
    fn constructors_keep_status_and_message_paired() {
        let ok = VerificationResult::available(
            &link(),
            PropertyId(7),
            "INR",
            vec![probe(1)],
            Booking {
                name: Some("Villa".to_string()),
                daily_rate: 99.5,
                dates: probe(1),
            },
        );
        assert!(ok.error_message.is_none());
        assert!(ok.successful_dates.is_some());

        let none = VerificationResult::unavailable(&link(), PropertyId(7), "INR", vec![probe(1)], "");
        assert_eq!(none.status, AvailabilityStatus::Unavailable);
        assert!(none.error_message.as_deref().is_some_and(|m| !m.is_empty()));
        assert!(none.successful_dates.is_none());

        let err = VerificationResult::errored(&link(), None, "INR", vec![], "boom");
        assert_eq!(err.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn summary_counts_add_up() {
        let results = vec![
            VerificationResult::errored(&link(), None, "INR", vec![], "Could not extract property ID"),
            VerificationResult::unavailable(&link(), PropertyId(7), "INR", vec![probe(2)], "none"),
            VerificationResult::available(
                &link(),
                PropertyId(7),
                "INR",
                vec![probe(3)],
                Booking {
                    name: None,
                    daily_rate: 10.0,
                    dates: probe(3),
                },
            ),
        ];

        let summary = RunSummary::from_results("https://blog.example/bali", Some("Bali"), &results, Utc::now());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.available + summary.unavailable + summary.error, summary.total);
        assert_eq!(summary.status, RunHealth::Issues);
        assert_eq!(summary.unavailable_properties.len(), 2);
        assert_eq!(summary.all_properties[2].hotel_name, "Sea View Villa");
    }
}
