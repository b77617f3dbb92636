use kg_loader_schemas::{Episode, EpisodeType, PricePoint, RawRecord};
use std::path::Path;

use super::{read_records, to_content, SourceAdapter};
use crate::error::SourceError;
use crate::timestamps::parse_date_or_instant;

const SOURCE_DESCRIPTION: &str = "Energy price per kWh for given date";
const DEFAULT_LOCATION: &str = "default";

/// One episode per price point, anchored to the price date.
#[derive(Default)]
pub struct PriceAdapter {
    prices: Vec<PricePoint>,
}

impl PriceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(prices: Vec<PricePoint>) -> Self {
        Self { prices }
    }

    /// Group key linking every price of one location.
    pub fn group_id(price: &PricePoint) -> String {
        format!(
            "Price_{}",
            price.location_id().unwrap_or(DEFAULT_LOCATION)
        )
    }
}

impl SourceAdapter for PriceAdapter {
    fn load(&mut self, location: &Path) -> Result<(), SourceError> {
        self.prices = read_records(location)?;
        Ok(())
    }

    fn raw_records(&self) -> Vec<RawRecord> {
        self.prices.iter().cloned().map(RawRecord::Price).collect()
    }

    fn to_episodes(&self) -> Result<Vec<Episode>, SourceError> {
        self.prices
            .iter()
            .enumerate()
            .map(|(index, price)| {
                let name = format!("EnergyPrice-{}", price.date());
                let reference_time = parse_date_or_instant(price.date())
                    .map_err(|reason| SourceError::normalization(index, &name, reason))?;

                Ok(Episode {
                    content: to_content(index, &name, price)?,
                    source_description: SOURCE_DESCRIPTION.to_string(),
                    source: EpisodeType::Json,
                    reference_time,
                    group_id: Some(Self::group_id(price)),
                    name,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn price(date: &str, location: Option<&str>) -> PricePoint {
        serde_json::from_value(json!({
            "date": date,
            "location_id": location,
            "price_per_kwh": 0.29,
            "currency": "EUR"
        }))
        .unwrap()
    }

    #[test]
    fn test_group_defaults_to_placeholder() {
        let adapter = PriceAdapter::from_records(vec![price("2024-01-01", None)]);
        let episodes = adapter.to_episodes().unwrap();
        assert_eq!(episodes[0].group_id.as_deref(), Some("Price_default"));
        assert_eq!(episodes[0].name, "EnergyPrice-2024-01-01");
    }

    #[test]
    fn test_date_anchor_at_utc_midnight() {
        let adapter = PriceAdapter::from_records(vec![price("2024-03-15", Some("dk1"))]);
        let episodes = adapter.to_episodes().unwrap();
        assert_eq!(
            episodes[0].reference_time,
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(episodes[0].group_id.as_deref(), Some("Price_dk1"));
    }

    #[test]
    fn test_bad_date_identifies_record() {
        let adapter = PriceAdapter::from_records(vec![
            price("2024-01-01", Some("dk1")),
            price("15/03/2024", Some("dk1")),
        ]);
        match adapter.to_episodes().unwrap_err() {
            SourceError::Normalization { index, record, .. } => {
                assert_eq!(index, 1);
                assert_eq!(record, "EnergyPrice-15/03/2024");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_location_stays_in_content() {
        let adapter = PriceAdapter::from_records(vec![price("2024-01-01", None)]);
        let episodes = adapter.to_episodes().unwrap();
        let content: serde_json::Value = serde_json::from_str(&episodes[0].content).unwrap();
        assert!(content["location_id"].is_null());
        assert!(content.as_object().unwrap().contains_key("location_id"));
    }

    #[test]
    fn test_conversion_is_repeatable() {
        let adapter = PriceAdapter::from_records(vec![
            price("2024-01-01", Some("dk1")),
            price("2024-01-02", Some("dk2")),
        ]);
        assert_eq!(adapter.to_episodes().unwrap(), adapter.to_episodes().unwrap());
    }
}
