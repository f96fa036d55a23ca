use crate::vendor::HotelResult;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Header of the listing CSV, in field order of [`HotelListing`]
pub const LISTING_COLUMNS: [&str; 14] = [
    "hotel_id",
    "hotel_name",
    "room_type_name",
    "star_rating",
    "review_score",
    "review_count",
    "daily_rate",
    "crossed_out_rate",
    "currency",
    "discount_percentage",
    "free_wifi",
    "breakfast_included",
    "image_url",
    "landing_url",
];

/// Flat view of a search hit, one CSV row each
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelListing {
    pub hotel_id: Option<u64>,
    pub hotel_name: Option<String>,
    pub room_type_name: Option<String>,
    pub star_rating: Option<f64>,
    pub review_score: Option<f64>,
    pub review_count: u64,
    pub daily_rate: Option<f64>,
    pub crossed_out_rate: Option<f64>,
    pub currency: Option<String>,
    pub discount_percentage: Option<f64>,
    pub free_wifi: Option<bool>,
    pub breakfast_included: Option<bool>,
    pub image_url: Option<String>,
    pub landing_url: Option<String>,
}

impl From<HotelResult> for HotelListing {
    fn from(hotel: HotelResult) -> Self {
        Self {
            hotel_id: hotel.hotel_id,
            hotel_name: hotel.hotel_name,
            room_type_name: hotel.room_type_name,
            star_rating: hotel.star_rating,
            review_score: hotel.review_score,
            review_count: hotel.review_count.unwrap_or(0),
            daily_rate: hotel.daily_rate,
            crossed_out_rate: hotel.crossed_out_rate,
            currency: hotel.currency,
            discount_percentage: hotel.discount_percentage,
            free_wifi: hotel.free_wifi,
            breakfast_included: hotel.include_breakfast,
            image_url: hotel.image_url,
            landing_url: hotel.landing_url,
        }
    }
}

impl HotelListing {
    /// Multi-line console block
    pub fn describe(&self, index: usize) -> String {
        let mut lines = vec![
            "=".repeat(80),
            format!("Hotel {}: {}", index, self.hotel_name.as_deref().unwrap_or("N/A")),
            "=".repeat(80),
            format!("Hotel ID: {}", self.hotel_id.map(|id| id.to_string()).unwrap_or_else(|| "N/A".into())),
        ];

        if let Some(room) = &self.room_type_name {
            lines.push(format!("Room Type: {}", room));
        }
        if let Some(stars) = self.star_rating {
            lines.push(format!("Star Rating: {} stars", stars));
        }
        if let Some(score) = self.review_score {
            lines.push(format!("Review Score: {}/10 ({} reviews)", score, self.review_count));
        }

        let currency = self.currency.as_deref().unwrap_or("");
        match self.daily_rate {
            Some(rate) => {
                let mut price = format!("Price: {} {:.2}/night", currency, rate);
                if let (Some(was), Some(pct)) = (self.crossed_out_rate, self.discount_percentage) {
                    if pct > 0.0 {
                        price.push_str(&format!(" (was {:.2}, {}% off)", was, pct));
                    }
                }
                lines.push(price);
            }
            None => lines.push("Price: N/A".to_string()),
        }

        let mut amenities = Vec::new();
        if self.free_wifi == Some(true) {
            amenities.push("Free WiFi");
        }
        if self.breakfast_included == Some(true) {
            amenities.push("Breakfast Included");
        }
        if !amenities.is_empty() {
            lines.push(format!("Amenities: {}", amenities.join(", ")));
        }

        if let Some(url) = &self.landing_url {
            lines.push(format!("Booking URL: {}", url));
        }
        lines.join("\n")
    }
}

#[derive(Serialize)]
struct SearchDocument<'a, P: Serialize> {
    search_params: &'a P,
    timestamp: String,
    total_results: usize,
    hotels: &'a [HotelListing],
}

/// Writes listings as `.json` (with the search parameters) or `.csv`, picked by extension
pub fn save_listings<P: Serialize>(path: &Path, params: &P, listings: &[HotelListing]) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => {
            let doc = SearchDocument {
                search_params: params,
                timestamp: Utc::now().to_rfc3339(),
                total_results: listings.len(),
                hotels: listings,
            };
            let json = serde_json::to_string_pretty(&doc)?;
            fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        }
        "csv" => {
            // header written up front so an empty search still yields one
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            writer.write_record(LISTING_COLUMNS).context("Failed to write CSV header")?;
            for listing in listings {
                writer.serialize(listing).context("Failed to write CSV row")?;
            }
            writer.flush()?;
        }
        _ => bail!("Output file must have .json or .csv extension: {}", path.display()),
    }

    info!("Results saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> HotelListing {
        HotelListing::from(HotelResult {
            hotel_id: Some(407854),
            hotel_name: Some("Alila Seminyak".to_string()),
            daily_rate: Some(180.0),
            crossed_out_rate: Some(240.0),
            discount_percentage: Some(25.0),
            currency: Some("USD".to_string()),
            free_wifi: Some(true),
            ..HotelResult::default()
        })
    }

    #[test]
    fn describe_mentions_discount_and_amenities() {
        let text = listing().describe(1);
        assert!(text.contains("Hotel 1: Alila Seminyak"));
        assert!(text.contains("Price: USD 180.00/night (was 240.00, 25% off)"));
        assert!(text.contains("Amenities: Free WiFi"));
    }

    #[test]
    fn saves_json_and_csv_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let params = json!({ "hotel_ids": [407854] });

        let json_path = dir.path().join("out.json");
        save_listings(&json_path, &params, &[listing()]).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(doc["total_results"], 1);
        assert_eq!(doc["search_params"]["hotel_ids"][0], 407854);
        assert_eq!(doc["hotels"][0]["hotel_name"], "Alila Seminyak");

        let csv_path = dir.path().join("out.CSV");
        save_listings(&csv_path, &params, &[listing()]).unwrap();
        let csv = fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("hotel_id,hotel_name,room_type_name"));
        assert!(csv.contains("407854,Alila Seminyak"));

        assert!(save_listings(&dir.path().join("out.txt"), &params, &[listing()]).is_err());
    }

    #[test]
    fn empty_csv_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.csv");
        save_listings(&path, &json!({ "city_id": 9395 }), &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", LISTING_COLUMNS.join(",")));
    }
}
