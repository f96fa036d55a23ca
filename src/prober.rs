//! Availability probing: try a handful of randomized stays per property until
//! the vendor offers a bookable rate or the attempts run out.

use crate::models::{Booking, DateProbe, LinkRecord, PropertyId, VerificationResult};
use crate::vendor::{ApiError, AvailabilityApi, AvailabilityQuery, SearchOutcome};
use chrono::{Datelike, Days, Months, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Redraws allowed before falling back to the lowest unused day
const MAX_REDRAWS: usize = 8;

/// Source of check-in days. Tests script it; production draws randomly.
pub trait DayPicker: Send {
    /// A day in `1..=max_day`
    fn pick_day(&mut self, max_day: u32) -> u32;
}

pub struct RandomDayPicker {
    rng: StdRng,
}

impl RandomDayPicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDayPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl DayPicker for RandomDayPicker {
    fn pick_day(&mut self, max_day: u32) -> u32 {
        self.rng.gen_range(1..=max_day.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub max_attempts: u32,
    pub stay_nights: u32,
    /// Months after the current one that the first attempt targets (at least 1)
    pub first_month_offset: u32,
    /// Distinct months cycled through; `None` gives every attempt its own month
    pub month_span: Option<u32>,
    pub currency: String,
    pub adults: u32,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            stay_nights: 2,
            first_month_offset: 1,
            month_span: None,
            currency: crate::config::DEFAULT_CURRENCY.to_string(),
            adults: crate::config::DEFAULT_ADULTS,
        }
    }
}

impl ProbeSettings {
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    fn span(&self) -> u32 {
        self.month_span.unwrap_or(self.attempts()).max(1)
    }
}

pub struct Prober<'a> {
    api: &'a dyn AvailabilityApi,
    settings: ProbeSettings,
    picker: Box<dyn DayPicker + 'a>,
    today: NaiveDate,
}

impl<'a> Prober<'a> {
    pub fn new(
        api: &'a dyn AvailabilityApi,
        settings: ProbeSettings,
        picker: Box<dyn DayPicker + 'a>,
        today: NaiveDate,
    ) -> Self {
        Self {
            api,
            settings,
            picker,
            today,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probes one property. `Err` is reserved for failures that doom the whole
    /// run (rejected credentials); everything else lands in the result.
    pub async fn probe(&mut self, link: &LinkRecord, property_id: PropertyId) -> Result<VerificationResult, ApiError> {
        let currency = self.settings.currency.clone();
        let attempts = self.settings.attempts();
        let mut tried: Vec<DateProbe> = Vec::new();
        let mut seen: HashSet<NaiveDate> = HashSet::new();

        for attempt in 0..attempts {
            let Some(dates) = self.plan(attempt, &seen) else {
                warn!("No unused check-in dates left for property {}", property_id);
                break;
            };
            seen.insert(dates.check_in);
            tried.push(dates);

            info!(
                "Attempt {}/{} for property {} - checking {}",
                attempt + 1,
                attempts,
                property_id,
                dates
            );

            let query = AvailabilityQuery {
                property_id,
                dates,
                currency: currency.clone(),
                adults: self.settings.adults,
            };

            match self.api.search(&query).await {
                Ok(SearchOutcome::Match(hotel)) => match hotel.daily_rate.filter(|rate| *rate > 0.0) {
                    Some(daily_rate) => {
                        let name = hotel.hotel_name.filter(|n| !n.trim().is_empty());
                        info!(
                            "✓ Property {} is AVAILABLE ({})",
                            property_id,
                            name.as_deref().unwrap_or("unnamed")
                        );
                        return Ok(VerificationResult::available(
                            link,
                            property_id,
                            &currency,
                            tried,
                            Booking {
                                name,
                                daily_rate,
                                dates,
                            },
                        ));
                    }
                    None => debug!("Property {} matched without a bookable rate for {}", property_id, dates),
                },
                Ok(SearchOutcome::NoAvailability) => {
                    debug!("No results for property {} ({})", property_id, dates);
                }
                Err(e) if e.is_fatal_for_run() => return Err(e),
                Err(e) => {
                    warn!("API error on attempt {} for property {}: {}", attempt + 1, property_id, e);
                    return Ok(VerificationResult::errored(
                        link,
                        Some(property_id),
                        &currency,
                        tried,
                        e.to_string(),
                    ));
                }
            }
        }

        info!(
            "✗ Property {} is UNAVAILABLE (all {} attempt(s) failed)",
            property_id,
            tried.len()
        );
        let reason = format!("No availability found in {} probed date range(s)", tried.len());
        Ok(VerificationResult::unavailable(link, property_id, &currency, tried, reason))
    }

    /// Stay for the given attempt, avoiding check-in dates already used
    fn plan(&mut self, attempt: u32, seen: &HashSet<NaiveDate>) -> Option<DateProbe> {
        let offset = self.settings.first_month_offset.max(1) + attempt % self.settings.span();
        let month_start = self.today.with_day(1)?.checked_add_months(Months::new(offset))?;
        let last_day = month_start.checked_add_months(Months::new(1))?.pred_opt()?.day();
        let nights = self.settings.stay_nights.max(1);
        let max_day = last_day.saturating_sub(nights).max(1);

        let day_to_probe = |day: u32| -> Option<DateProbe> {
            let check_in = month_start.with_day(day)?;
            let check_out = check_in.checked_add_days(Days::new(u64::from(nights)))?;
            Some(DateProbe { check_in, check_out })
        };

        for _ in 0..MAX_REDRAWS {
            let day = self.picker.pick_day(max_day).clamp(1, max_day);
            let candidate = day_to_probe(day)?;
            if !seen.contains(&candidate.check_in) {
                return Some(candidate);
            }
        }

        (1..=max_day)
            .filter_map(day_to_probe)
            .find(|candidate| !seen.contains(&candidate.check_in))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AvailabilityStatus;
    use crate::vendor::HotelResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedApi {
        replies: Mutex<VecDeque<Result<SearchOutcome, ApiError>>>,
        queries: Mutex<Vec<AvailabilityQuery>>,
    }

    impl ScriptedApi {
        fn new(replies: Vec<Result<SearchOutcome, ApiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AvailabilityApi for ScriptedApi {
        async fn search(&self, query: &AvailabilityQuery) -> Result<SearchOutcome, ApiError> {
            self.queries.lock().unwrap().push(query.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(SearchOutcome::NoAvailability))
        }
    }

    struct ScriptedDays(VecDeque<u32>);

    impl DayPicker for ScriptedDays {
        fn pick_day(&mut self, max_day: u32) -> u32 {
            self.0.pop_front().unwrap_or(max_day)
        }
    }

    fn days(list: &[u32]) -> Box<dyn DayPicker> {
        Box::new(ScriptedDays(list.iter().copied().collect()))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn link() -> LinkRecord {
        LinkRecord {
            raw_url: "https://vendor.example/search?hid=12345".to_string(),
            hyperlink_text: "The Layar".to_string(),
            source_page_url: "https://blog.example/bali".to_string(),
        }
    }

    fn hit(rate: Option<f64>) -> Result<SearchOutcome, ApiError> {
        Ok(SearchOutcome::Match(HotelResult {
            hotel_name: Some("The Layar Designer Villas".to_string()),
            daily_rate: rate,
            ..HotelResult::default()
        }))
    }

    #[tokio::test]
    async fn stops_at_first_bookable_probe() {
        let api = ScriptedApi::new(vec![Ok(SearchOutcome::NoAvailability), hit(Some(210.0))]);
        let mut prober = Prober::new(&api, ProbeSettings::default(), days(&[5, 9]), today());

        let result = prober.probe(&link(), PropertyId(12345)).await.unwrap();

        assert_eq!(result.status, AvailabilityStatus::Available);
        assert_eq!(result.dates_tried.len(), 2);
        assert_eq!(result.daily_rate, Some(210.0));
        assert_eq!(result.actual_name.as_deref(), Some("The Layar Designer Villas"));
        assert!(result.error_message.is_none());

        let success = result.successful_dates.unwrap();
        assert_eq!(success, result.dates_tried[1]);
        assert_eq!(success.check_in, NaiveDate::from_ymd_opt(2026, 12, 9).unwrap());
        assert_eq!(success.nights(), 2);
        assert_eq!(api.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn walks_consecutive_months_from_next_month() {
        let api = ScriptedApi::new(vec![]);
        let mut prober = Prober::new(&api, ProbeSettings::default(), days(&[1, 1, 1]), today());

        let result = prober.probe(&link(), PropertyId(1)).await.unwrap();

        let months: Vec<(i32, u32)> = result
            .dates_tried
            .iter()
            .map(|d| (d.check_in.year(), d.check_in.month()))
            .collect();
        assert_eq!(months, vec![(2026, 11), (2026, 12), (2027, 1)]);
        assert_eq!(result.status, AvailabilityStatus::Unavailable);
        assert!(result.error_message.unwrap().contains("3 probed"));
    }

    #[tokio::test]
    async fn match_without_rate_is_not_available() {
        let api = ScriptedApi::new(vec![hit(None), hit(Some(0.0)), Ok(SearchOutcome::NoAvailability)]);
        let mut prober = Prober::new(&api, ProbeSettings::default(), days(&[3, 4, 5]), today());

        let result = prober.probe(&link(), PropertyId(1)).await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Unavailable);
        assert_eq!(result.dates_tried.len(), 3);
    }

    #[tokio::test]
    async fn check_in_dates_never_repeat_within_one_property() {
        let api = ScriptedApi::new(vec![]);
        let settings = ProbeSettings {
            max_attempts: 5,
            month_span: Some(1),
            ..ProbeSettings::default()
        };
        // the picker keeps offering the same day
        let mut prober = Prober::new(&api, settings, days(&[7; 64]), today());

        let result = prober.probe(&link(), PropertyId(1)).await.unwrap();
        let unique: HashSet<NaiveDate> = result.dates_tried.iter().map(|d| d.check_in).collect();
        assert_eq!(result.dates_tried.len(), 5);
        assert_eq!(unique.len(), 5);
        assert!(result.dates_tried.iter().all(|d| d.check_in.month() == 11));
    }

    #[tokio::test]
    async fn check_out_stays_inside_reasonable_bounds() {
        let api = ScriptedApi::new(vec![]);
        let mut prober = Prober::new(&api, ProbeSettings::default(), days(&[31, 31, 31]), today());

        let result = prober.probe(&link(), PropertyId(1)).await.unwrap();
        // November has 30 days, so the latest check-in is the 28th
        assert_eq!(result.dates_tried[0].check_in, NaiveDate::from_ymd_opt(2026, 11, 28).unwrap());
        assert_eq!(result.dates_tried[0].check_out, NaiveDate::from_ymd_opt(2026, 11, 30).unwrap());
    }

    #[tokio::test]
    async fn non_recoverable_error_stops_probing_that_property() {
        let api = ScriptedApi::new(vec![
            Ok(SearchOutcome::NoAvailability),
            Err(ApiError::TransientExhausted {
                attempts: 4,
                reason: "HTTP 503".into(),
            }),
            hit(Some(10.0)),
        ]);
        let mut prober = Prober::new(&api, ProbeSettings::default(), days(&[1, 2, 3]), today());

        let result = prober.probe(&link(), PropertyId(1)).await.unwrap();
        assert_eq!(result.status, AvailabilityStatus::Error);
        assert_eq!(result.dates_tried.len(), 2);
        assert!(result.error_message.unwrap().contains("gave up after 4"));
        assert_eq!(api.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn auth_errors_propagate() {
        let api = ScriptedApi::new(vec![Err(ApiError::Auth {
            status: 401,
            message: "Unauthorized".into(),
        })]);
        let mut prober = Prober::new(&api, ProbeSettings::default(), days(&[1]), today());

        let err = prober.probe(&link(), PropertyId(1)).await.unwrap_err();
        assert!(err.is_fatal_for_run());
    }

    #[tokio::test]
    async fn query_carries_configured_party_and_currency() {
        let api = ScriptedApi::new(vec![hit(Some(1.0))]);
        let settings = ProbeSettings {
            currency: "USD".to_string(),
            adults: 3,
            ..ProbeSettings::default()
        };
        let mut prober = Prober::new(&api, settings, days(&[2]), today());

        let result = prober.probe(&link(), PropertyId(99)).await.unwrap();
        assert_eq!(result.currency, "USD");

        let queries = api.queries.lock().unwrap();
        assert_eq!(queries[0].adults, 3);
        assert_eq!(queries[0].currency, "USD");
        assert_eq!(queries[0].property_id, PropertyId(99));
    }

    #[test]
    fn seeded_picker_stays_in_range() {
        let mut picker = RandomDayPicker::seeded(42);
        assert!((0..200).map(|_| picker.pick_day(28)).all(|d| (1..=28).contains(&d)));
    }
}
