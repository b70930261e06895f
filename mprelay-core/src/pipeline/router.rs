//! Router: group accepted records by destination.

use mprelay_sdk::objects::NormalizedRecord;
use url::Url;

/// Records per destination, in first-configured order.
///
/// Stored as a `Vec` because the number of destinations is very small,
/// making linear scans faster than hash lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutedBatches {
    batches: Vec<(Url, Vec<NormalizedRecord>)>,
}

impl RoutedBatches {
    /// The batch for `destination`, if it is configured.
    pub fn get(&self, destination: &Url) -> Option<&[NormalizedRecord]> {
        self.batches
            .iter()
            .find(|(d, _)| d == destination)
            .map(|(_, records)| records.as_slice())
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Url, &[NormalizedRecord])> {
        self.batches.iter().map(|(d, r)| (d, r.as_slice()))
    }

    fn entry(&mut self, destination: &Url) -> &mut Vec<NormalizedRecord> {
        let index = match self.batches.iter().position(|(d, _)| d == destination) {
            Some(index) => index,
            None => {
                self.batches.push((destination.clone(), Vec::new()));
                self.batches.len() - 1
            }
        };
        &mut self.batches[index].1
    }
}

impl IntoIterator for RoutedBatches {
    type Item = (Url, Vec<NormalizedRecord>);
    type IntoIter = std::vec::IntoIter<(Url, Vec<NormalizedRecord>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.into_iter()
    }
}

/// Merge each account's accepted records into its destination's batch.
///
/// `polled` is visited in order, so batches keep the account poll order and,
/// within an account, the acceptance order. Every destination that appears
/// in `polled` gets a key, even when no records were accepted for it.
pub fn route<'a, I>(polled: I) -> RoutedBatches
where
    I: IntoIterator<Item = (&'a Url, Vec<NormalizedRecord>)>,
{
    let mut routed = RoutedBatches::default();
    for (destination, records) in polled {
        routed.entry(destination).extend(records);
    }
    routed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize;
    use mprelay_sdk::objects::RawTransaction;
    use serde_json::json;

    fn record(id: u64, origin: &str) -> NormalizedRecord {
        let raw = RawTransaction::from_value(json!({ "id": id })).unwrap();
        normalize(&raw, origin)
    }

    fn ids(records: &[NormalizedRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_shared_destination_merges_in_poll_order() {
        let sheet_1: Url = "https://sheets.example/one".parse().unwrap();
        let sheet_2: Url = "https://sheets.example/two".parse().unwrap();

        let routed = route([
            (&sheet_1, vec![record(1, "A"), record(2, "A")]),
            (&sheet_2, vec![record(3, "B")]),
            (&sheet_1, vec![record(4, "C")]),
        ]);

        assert_eq!(routed.len(), 2);
        assert_eq!(ids(routed.get(&sheet_1).unwrap()), ["1", "2", "4"]);
        assert_eq!(ids(routed.get(&sheet_2).unwrap()), ["3"]);

        let order: Vec<_> = routed.iter().map(|(d, _)| d.clone()).collect();
        assert_eq!(order, [sheet_1, sheet_2]);
    }

    #[test]
    fn test_every_destination_is_keyed() {
        let sheet_1: Url = "https://sheets.example/one".parse().unwrap();
        let sheet_2: Url = "https://sheets.example/two".parse().unwrap();

        let routed = route([(&sheet_1, vec![]), (&sheet_2, vec![record(1, "B")])]);

        assert_eq!(routed.get(&sheet_1), Some(&[][..]));
        assert_eq!(ids(routed.get(&sheet_2).unwrap()), ["1"]);
    }

    #[test]
    fn test_records_stay_with_their_account_destination() {
        let sheet_1: Url = "https://sheets.example/one".parse().unwrap();
        let sheet_2: Url = "https://sheets.example/two".parse().unwrap();

        let routed = route([
            (&sheet_1, vec![record(1, "A")]),
            (&sheet_2, vec![record(2, "B")]),
        ]);

        assert!(routed.get(&sheet_1).unwrap().iter().all(|r| r.origin == "A"));
        assert!(routed.get(&sheet_2).unwrap().iter().all(|r| r.origin == "B"));
    }
}
