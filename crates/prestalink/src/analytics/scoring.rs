//! Pure scoring primitives. Every function is deterministic, bounded to
//! [0, 1], and degrades to documented defaults on sparse data instead of
//! raising. The magic constants are part of the product contract and must
//! not be retuned casually.

use chrono::{DateTime, Utc};

use crate::domain::{DayAvailability, PreferredTimeSlot, Provider, ServiceOffering};

/// Neutral score returned when there is no history to judge a match,
/// avoiding zero-collapse of every candidate for cold-start clients.
pub const NEUTRAL_MATCH: f64 = 0.5;

/// Intersection ratio between offered services and the client's preferred
/// labels. Empty preferences yield the neutral default.
pub fn service_match(services: &[ServiceOffering], preferred: &[String]) -> f64 {
    if preferred.is_empty() {
        return NEUTRAL_MATCH;
    }
    let matches = preferred
        .iter()
        .filter(|label| services.iter().any(|service| &service.label == *label))
        .count();
    matches as f64 / preferred.len() as f64
}

/// Intersection ratio between covered zones and preferred zones, with the
/// same neutral default as `service_match`.
pub fn zone_match(zones: &[String], preferred: &[String]) -> f64 {
    if preferred.is_empty() {
        return NEUTRAL_MATCH;
    }
    let matches = preferred
        .iter()
        .filter(|zone| zones.contains(zone))
        .count();
    matches as f64 / preferred.len() as f64
}

/// Day coverage (weight 0.6) plus the fraction of preferred windows that
/// overlap an offered slot (weight 0.4). A provider with no availability
/// scores zero regardless of preferences.
pub fn availability_match(availability: &[DayAvailability], preferred: &[PreferredTimeSlot]) -> f64 {
    if availability.is_empty() {
        return 0.0;
    }
    let day_fraction = availability.len().min(7) as f64 / 7.0;
    let mut score = day_fraction * 0.6;

    if !preferred.is_empty() {
        let overlapping = preferred
            .iter()
            .filter(|pref| {
                availability.iter().any(|day| {
                    day.day == pref.day
                        && day
                            .time_slots
                            .iter()
                            .any(|slot| slot.overlaps(&pref.time_range))
                })
            })
            .count();
        score += overlapping as f64 / preferred.len() as f64 * 0.4;
    }

    score
}

/// Quality composite: 40% rating, 30% review volume (saturating at 20
/// votes), 20% verification, plus up to 0.1 from badges (0.02 each).
pub fn quality_score(provider: &Provider) -> f64 {
    let mut score = (provider.rating.average / 5.0).min(1.0) * 0.4;
    score += (f64::from(provider.rating.total_votes) / 20.0).min(1.0) * 0.3;
    if provider.verified {
        score += 0.2;
    }
    score + (provider.badge_count() as f64 * 0.02).min(0.1)
}

/// Reliability composite used by the recommendation read models:
/// 40% rating, 20% review volume (saturating at 50), 20% verification,
/// 10% badges (saturating at 10), 10% tenure (saturating at 12 months).
pub fn reliability_score(provider: &Provider, now: DateTime<Utc>) -> f64 {
    let mut score = (provider.rating.average / 5.0) * 0.4;
    score += (f64::from(provider.rating.total_votes) / 50.0).min(1.0) * 0.2;
    if provider.verified {
        score += 0.2;
    }
    score += (provider.badge_count() as f64 / 10.0).min(1.0) * 0.1;

    let months_active = (now - provider.created_at).num_days() as f64 / 30.0;
    score + (months_active / 12.0).clamp(0.0, 1.0) * 0.1
}
