use crate::error::TransformError;
use crate::normalize::Normalizer;
use crate::types::{CleanRecord, RawRecord};
use tracing::{debug, info};

/// Counts gathered while building a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub received: usize,
    pub kept: usize,
    pub dropped: usize,
}

/// The cleaned, ordered dataset handed from transform to load
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<CleanRecord>,
    pub stats: TransformStats,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Normalize every raw record in order, dropping the incomplete ones
pub fn build_dataset<I>(raw: I, normalizer: &Normalizer) -> Result<Dataset, TransformError>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut stats = TransformStats::default();
    let mut records = Vec::new();

    for record in raw {
        stats.received += 1;
        match normalizer.normalize(&record) {
            Some(clean) => records.push(clean),
            None => {
                stats.dropped += 1;
                debug!(room_id = ?record.id, "dropping incomplete record");
            }
        }
    }
    stats.kept = records.len();

    info!(
        received = stats.received,
        kept = stats.kept,
        dropped = stats.dropped,
        "transform complete"
    );

    if records.is_empty() {
        return Err(TransformError::EmptyDataset {
            received: stats.received,
        });
    }

    Ok(Dataset { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(id: &str, city: &str) -> RawRecord {
        serde_json::from_value(json!({
            "id": id,
            "host_id": "h1",
            "room_type": "Entire home/apt",
            "column_10": "$95",
            "minimum_nights": 2,
            "number_of_reviews": 4,
            "last_review": "2022-11-30",
            "reviews_per_month": 0.5,
            "calculated_host_listings_count": 1,
            "availability_365": 120,
            "column_19": "United States",
            "city": city,
            "coordinates": {"lat": 47.6, "lon": -122.3}
        }))
        .unwrap()
    }

    #[test]
    fn test_order_preserved_and_incomplete_dropped() {
        let mut broken = listing("2", "Seattle");
        broken.column_10 = Some("$".to_string());

        let raw = vec![listing("1", "Seattle"), broken, listing("3", "Portland")];
        let dataset = build_dataset(raw, &Normalizer::default()).unwrap();

        let ids: Vec<_> = dataset.records.iter().map(|r| r.room_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(
            dataset.stats,
            TransformStats {
                received: 3,
                kept: 2,
                dropped: 1
            }
        );
    }

    #[test]
    fn test_clean_count_never_exceeds_raw() {
        let raw = vec![
            listing("1", "Seattle"),
            RawRecord::default(),
            listing("3", "Portland"),
            RawRecord::default(),
        ];
        let received = raw.len();
        let dataset = build_dataset(raw, &Normalizer::default()).unwrap();
        assert!(dataset.len() <= received);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_all_dropped_is_empty_dataset() {
        let raw = vec![RawRecord::default(), RawRecord::default()];
        let err = build_dataset(raw, &Normalizer::default()).unwrap_err();
        assert!(matches!(err, TransformError::EmptyDataset { received: 2 }));
    }

    #[test]
    fn test_no_input_is_empty_dataset() {
        let err = build_dataset(Vec::new(), &Normalizer::default()).unwrap_err();
        assert!(matches!(err, TransformError::EmptyDataset { received: 0 }));
    }
}
