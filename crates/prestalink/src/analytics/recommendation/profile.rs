//! Preference profile derivation: turns a client's accumulated history into
//! the weighted preference lists the recommendation scorer consumes. All
//! tallies degrade to empty lists for cold-start clients; the scorer treats
//! empty lists as "no opinion" rather than "match nothing".

use std::collections::HashMap;

use chrono::{Datelike, NaiveTime, Timelike};

use crate::domain::{
    BudgetRange, Client, DayOfWeek, DayPart, PreferredTimeSlot, Provider, ProviderId, TimeSlot,
};

/// Keyword table mapping free-text search queries to canonical service
/// labels. Matching is lowercase substring, same as the search layer.
const SERVICE_KEYWORDS: [(&str, &[&str]); 5] = [
    ("ménage", &["ménage", "nettoyage", "clean", "housekeeping"]),
    ("jardinage", &["jardin", "jardinage", "garden", "entretien"]),
    ("babysitting", &["baby", "enfant", "garde", "babysitting"]),
    ("cuisine", &["cuisine", "repas", "cook", "culinaire"]),
    ("réparation", &["réparation", "réparer", "fix", "reparation"]),
];

/// Canonical service labels whose keywords appear in the query.
pub fn service_keywords_in(query: &str) -> Vec<&'static str> {
    let lowered = query.to_lowercase();
    SERVICE_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(service, _)| *service)
        .collect()
}

const PREFERRED_SERVICES_CAP: usize = 5;
const PREFERRED_ZONES_CAP: usize = 3;
const PREFERRED_PARTS_CAP: usize = 2;
const PREFERRED_DAYS_CAP: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct QualityPreferences {
    pub min_rating: f64,
    pub require_verification: bool,
}

impl Default for QualityPreferences {
    fn default() -> Self {
        QualityPreferences {
            min_rating: 3.0,
            require_verification: false,
        }
    }
}

/// Coarse booking-time habits: which day parts and weekdays the client
/// tends to reach out on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimePreferences {
    pub preferred_parts: Vec<DayPart>,
    pub preferred_days: Vec<DayOfWeek>,
}

const fn part_window(part: DayPart) -> (u32, u32) {
    match part {
        DayPart::Morning => (8, 12),
        DayPart::Afternoon => (12, 17),
        DayPart::Evening => (17, 21),
    }
}

impl TimePreferences {
    /// Expand the day-part × weekday habits into concrete weekly windows
    /// for the availability matcher.
    pub fn as_slots(&self) -> Vec<PreferredTimeSlot> {
        let mut slots = Vec::new();
        for &day in &self.preferred_days {
            for &part in &self.preferred_parts {
                let (from, to) = part_window(part);
                let (Some(from), Some(to)) = (
                    NaiveTime::from_hms_opt(from, 0, 0),
                    NaiveTime::from_hms_opt(to, 0, 0),
                ) else {
                    continue;
                };
                slots.push(PreferredTimeSlot {
                    day,
                    time_range: TimeSlot { from, to },
                    preference_score: 1,
                });
            }
        }
        slots
    }
}

/// Per-client weighting of the engagement sub-score components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementPatterns {
    pub responsiveness_importance: f64,
    pub profile_completeness_importance: f64,
    pub popularity_importance: f64,
}

impl Default for EngagementPatterns {
    fn default() -> Self {
        EngagementPatterns {
            responsiveness_importance: 0.5,
            profile_completeness_importance: 0.3,
            popularity_importance: 0.2,
        }
    }
}

/// Everything the scorer needs to know about one client's tastes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceProfile {
    pub preferred_services: Vec<String>,
    pub preferred_zones: Vec<String>,
    pub quality: QualityPreferences,
    pub time: TimePreferences,
    pub budget: BudgetRange,
    pub engagement: EngagementPatterns,
}

/// Derive the full profile. `resolve` looks up providers referenced from
/// the client's history; unresolvable references are silently skipped so a
/// deleted provider never poisons recommendations.
pub fn derive<F>(client: &Client, resolve: F) -> PreferenceProfile
where
    F: Fn(&ProviderId) -> Option<Provider>,
{
    let mut cache: HashMap<ProviderId, Option<Provider>> = HashMap::new();
    let mut lookup = |id: &ProviderId| {
        cache
            .entry(id.clone())
            .or_insert_with(|| resolve(id))
            .clone()
    };

    let services = preferred_services(client, &mut lookup);
    let zones = preferred_zones(client, &mut lookup);
    let quality = quality_preferences(client, &mut lookup);

    PreferenceProfile {
        preferred_services: services,
        preferred_zones: zones,
        quality,
        time: time_preferences(client),
        budget: client.preferences.budget_range.unwrap_or_default(),
        engagement: engagement_patterns(client),
    }
}

/// Top tallied entries, highest weight first; label order breaks ties so
/// the output is stable across runs.
fn top_tallied(tally: HashMap<String, f64>, cap: usize) -> Vec<String> {
    let mut entries: Vec<(String, f64)> = tally.into_iter().collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(cap);
    entries.into_iter().map(|(label, _)| label).collect()
}

/// Weighted service tally: contacts +2, search-keyword matches +1,
/// favorited providers' offerings +1.5. Top five by weight.
fn preferred_services<F>(client: &Client, mut resolve: F) -> Vec<String>
where
    F: FnMut(&ProviderId) -> Option<Provider>,
{
    let mut tally: HashMap<String, f64> = HashMap::new();

    for search in &client.search_history {
        for service in service_keywords_in(&search.query) {
            *tally.entry(service.to_string()).or_default() += 1.0;
        }
    }

    for contact in &client.activity.contacts_made {
        if let Some(service) = &contact.service_type {
            *tally.entry(service.clone()).or_default() += 2.0;
        }
    }

    for favorite in &client.favorites {
        if let Some(provider) = resolve(&favorite.provider_id) {
            for service in &provider.services {
                *tally.entry(service.label.clone()).or_default() += 1.5;
            }
        }
    }

    top_tallied(tally, PREFERRED_SERVICES_CAP)
}

/// Weighted zone tally: viewed +1, contacted +2, explicit preference +3.
/// Top three by weight.
fn preferred_zones<F>(client: &Client, mut resolve: F) -> Vec<String>
where
    F: FnMut(&ProviderId) -> Option<Provider>,
{
    let mut tally: HashMap<String, f64> = HashMap::new();

    for view in &client.activity.profiles_viewed {
        if let Some(provider) = resolve(&view.provider_id) {
            for zone in &provider.zones {
                *tally.entry(zone.clone()).or_default() += 1.0;
            }
        }
    }

    for contact in &client.activity.contacts_made {
        if let Some(provider) = resolve(&contact.provider_id) {
            for zone in &provider.zones {
                *tally.entry(zone.clone()).or_default() += 2.0;
            }
        }
    }

    for zone in &client.preferences.preferred_zones {
        *tally.entry(zone.clone()).or_default() += 3.0;
    }

    top_tallied(tally, PREFERRED_ZONES_CAP)
}

/// Quality floor inferred from the providers the client actually contacted:
/// half a star below their average, never under 3.0. Verification becomes
/// required once the client has contacted any verified provider.
fn quality_preferences<F>(client: &Client, mut resolve: F) -> QualityPreferences
where
    F: FnMut(&ProviderId) -> Option<Provider>,
{
    let contacted: Vec<Provider> = client
        .activity
        .contacts_made
        .iter()
        .filter_map(|contact| resolve(&contact.provider_id))
        .collect();

    if contacted.is_empty() {
        return QualityPreferences::default();
    }

    let average: f64 = contacted
        .iter()
        .map(|provider| provider.rating.average)
        .sum::<f64>()
        / contacted.len() as f64;

    QualityPreferences {
        min_rating: (average - 0.5).max(3.0),
        require_verification: contacted.iter().any(|provider| provider.verified),
    }
}

/// Bucket contact timestamps into day parts (top two) and weekdays (top
/// two). Ties resolve in enum order, which is chronological week order.
fn time_preferences(client: &Client) -> TimePreferences {
    let mut part_tally: HashMap<DayPart, u32> = HashMap::new();
    let mut day_tally: HashMap<DayOfWeek, u32> = HashMap::new();

    for contact in &client.activity.contacts_made {
        let part = DayPart::from_hour(contact.contact_date.hour());
        *part_tally.entry(part).or_default() += 1;
        let day = DayOfWeek::from_weekday(contact.contact_date.weekday());
        *day_tally.entry(day).or_default() += 1;
    }

    let mut parts: Vec<(DayPart, u32)> = part_tally.into_iter().collect();
    parts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    parts.truncate(PREFERRED_PARTS_CAP);

    let mut days: Vec<(DayOfWeek, u32)> = day_tally.into_iter().collect();
    days.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    days.truncate(PREFERRED_DAYS_CAP);

    TimePreferences {
        preferred_parts: parts.into_iter().map(|(part, _)| part).collect(),
        preferred_days: days.into_iter().map(|(day, _)| day).collect(),
    }
}

/// Clients who contact within an hour of viewing weigh responsiveness
/// higher: 0.5 base plus 0.1 per quick conversion, capped at 0.8.
fn engagement_patterns(client: &Client) -> EngagementPatterns {
    let quick_conversions = client
        .activity
        .profiles_viewed
        .iter()
        .filter(|view| {
            client.activity.contacts_made.iter().any(|contact| {
                contact.provider_id == view.provider_id
                    && contact.contact_date - view.viewed_at < chrono::Duration::hours(1)
            })
        })
        .count();

    let mut patterns = EngagementPatterns::default();
    if quick_conversions > 0 {
        patterns.responsiveness_importance = (0.5 + quick_conversions as f64 * 0.1).min(0.8);
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::common::{sample_client, sample_provider};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn keyword_extraction_matches_substrings_case_insensitively() {
        assert_eq!(service_keywords_in("Nettoyage de bureau"), vec!["ménage"]);
        assert_eq!(
            service_keywords_in("garde enfant et repas"),
            vec!["babysitting", "cuisine"]
        );
        assert!(service_keywords_in("plomberie").is_empty());
    }

    #[test]
    fn cold_start_profile_is_all_defaults() {
        let client = sample_client("c1");
        let profile = derive(&client, |_| None);

        assert!(profile.preferred_services.is_empty());
        assert!(profile.preferred_zones.is_empty());
        assert!((profile.quality.min_rating - 3.0).abs() < f64::EPSILON);
        assert!(!profile.quality.require_verification);
        assert!(profile.time.preferred_parts.is_empty());
        assert!((profile.engagement.responsiveness_importance - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn contacts_outweigh_searches_in_service_tally() {
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 10, 0, 0).unwrap();
        let mut client = sample_client("c1");
        // Two keyword hits for ménage, one double-weight contact for cuisine.
        client.search_history.push(crate::domain::SearchRecord {
            query: "nettoyage appartement".to_string(),
            results_count: 3,
            searched_at: now,
        });
        client.search_history.push(crate::domain::SearchRecord {
            query: "ménage plateau".to_string(),
            results_count: 5,
            searched_at: now,
        });
        client.record_contact(
            crate::domain::ProviderId("p1".to_string()),
            Some("cuisine".to_string()),
            now,
        );

        let profile = derive(&client, |_| None);
        assert_eq!(profile.preferred_services, vec!["cuisine", "ménage"]);
    }

    #[test]
    fn quality_floor_follows_contacted_providers() {
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 10, 0, 0).unwrap();
        let mut client = sample_client("c1");
        client.record_contact(crate::domain::ProviderId("p1".to_string()), None, now);

        let mut contacted = sample_provider("p1");
        contacted.rating.average = 4.6;
        contacted.verified = true;

        let profile = derive(&client, |id| (id.0 == "p1").then(|| contacted.clone()));
        assert!((profile.quality.min_rating - 4.1).abs() < 1e-9);
        assert!(profile.quality.require_verification);

        // A low-rated history never drags the floor under 3.0.
        contacted.rating.average = 2.0;
        let profile = derive(&client, |id| (id.0 == "p1").then(|| contacted.clone()));
        assert!((profile.quality.min_rating - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn quick_conversions_raise_responsiveness_weight() {
        let now = Utc.with_ymd_and_hms(2025, 9, 10, 10, 0, 0).unwrap();
        let mut client = sample_client("c1");
        let provider = crate::domain::ProviderId("p1".to_string());
        client.record_view(provider.clone(), 30, now);
        client.record_contact(provider, None, now + Duration::minutes(20));

        let profile = derive(&client, |_| None);
        assert!((profile.engagement.responsiveness_importance - 0.6).abs() < 1e-9);
    }

    #[test]
    fn time_slots_expand_days_times_parts() {
        let prefs = TimePreferences {
            preferred_parts: vec![DayPart::Morning, DayPart::Evening],
            preferred_days: vec![DayOfWeek::Monday, DayOfWeek::Saturday],
        };
        let slots = prefs.as_slots();
        assert_eq!(slots.len(), 4);
        assert!(slots
            .iter()
            .any(|slot| slot.day == DayOfWeek::Saturday
                && slot.time_range.from == NaiveTime::from_hms_opt(17, 0, 0).unwrap()));
    }
}
