use std::collections::HashSet;

use crate::models::TransactionRecord;

/// Concatenates `confirmed` then `pending`, keeping the first record seen for
/// every known hash. Records carrying the unknown-hash sentinel are all kept.
pub fn merge(
    confirmed: Vec<TransactionRecord>,
    pending: Vec<TransactionRecord>,
) -> Vec<TransactionRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(confirmed.len() + pending.len());

    for record in confirmed.into_iter().chain(pending) {
        let keep = match record.hash.as_key() {
            Some(key) => seen.insert(key.to_string()),
            None => true,
        };
        if keep {
            out.push(record);
        }
    }

    out
}
