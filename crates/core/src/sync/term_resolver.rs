use chrono::NaiveDate;

use crate::models::term::NewTerm;

/// Pick the term to flag as current, by upstream external id.
///
/// In order: the first year record containing `today`, then the first term of
/// any kind containing `today`, then the latest-starting term. Ties on start
/// date keep the earliest in upstream order. An empty slice resolves to `None`.
pub fn resolve_current(terms: &[NewTerm], today: NaiveDate) -> Option<i64> {
    terms
        .iter()
        .find(|t| t.is_year_record && t.contains(today))
        .or_else(|| terms.iter().find(|t| t.contains(today)))
        .or_else(|| {
            terms.iter().reduce(|latest, t| {
                if t.first_day > latest.first_day {
                    t
                } else {
                    latest
                }
            })
        })
        .map(|t| t.external_id)
}
