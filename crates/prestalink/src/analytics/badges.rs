//! Badge engine: evaluates the static badge table against a provider's
//! metrics and emits the full badge set for that provider. The set replaces
//! whatever the provider held before, so a badge can regress in level when
//! the underlying metrics drop; that is intended behavior, not drift.

use chrono::{DateTime, Utc};

use crate::domain::{Badge, BadgeLevel, BadgeName, Provider};

/// Progress counts required for each tier of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeThresholds {
    pub bronze: u64,
    pub silver: u64,
    pub gold: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct BadgeDefinition {
    pub name: BadgeName,
    pub thresholds: BadgeThresholds,
}

/// The full badge table. Order matters only for presentation.
pub const BADGE_TABLE: [BadgeDefinition; 5] = [
    BadgeDefinition {
        name: BadgeName::ResponseRapide,
        thresholds: BadgeThresholds {
            bronze: 10,
            silver: 50,
            gold: 100,
        },
    },
    BadgeDefinition {
        name: BadgeName::Fiable,
        thresholds: BadgeThresholds {
            bronze: 5,
            silver: 25,
            gold: 100,
        },
    },
    BadgeDefinition {
        name: BadgeName::TopNote,
        thresholds: BadgeThresholds {
            bronze: 10,
            silver: 30,
            gold: 50,
        },
    },
    BadgeDefinition {
        name: BadgeName::SuperDispo,
        thresholds: BadgeThresholds {
            bronze: 1,
            silver: 2,
            gold: 4,
        },
    },
    BadgeDefinition {
        name: BadgeName::Populaire,
        thresholds: BadgeThresholds {
            bronze: 100,
            silver: 500,
            gold: 1000,
        },
    },
];

/// Whether the provider currently qualifies for the badge at all.
fn condition_holds(name: BadgeName, provider: &Provider) -> bool {
    match name {
        BadgeName::ResponseRapide => provider.average_response_time() < 30.0,
        BadgeName::Fiable => provider.rating.average >= 4.5,
        BadgeName::TopNote => provider.rating.average >= 4.8,
        BadgeName::SuperDispo => provider.availability_score() > 0.8,
        BadgeName::Populaire => provider.profile_stats.total_views > 100,
    }
}

/// Progress metric for level mapping; the unit differs per badge kind.
pub fn badge_progress(name: BadgeName, provider: &Provider) -> u64 {
    match name {
        BadgeName::ResponseRapide | BadgeName::Fiable | BadgeName::TopNote => {
            u64::from(provider.rating.total_votes)
        }
        BadgeName::SuperDispo => u64::from(provider.consecutive_weeks_with_views()),
        BadgeName::Populaire => provider.profile_stats.total_views,
    }
}

/// Gold wins over silver wins over bronze; below silver is always bronze
/// because the qualifying condition already held.
pub fn level_for(progress: u64, thresholds: BadgeThresholds) -> BadgeLevel {
    if progress >= thresholds.gold {
        BadgeLevel::Gold
    } else if progress >= thresholds.silver {
        BadgeLevel::Silver
    } else {
        BadgeLevel::Bronze
    }
}

/// Compute the provider's complete badge set from current metrics.
pub fn evaluate(provider: &Provider, now: DateTime<Utc>) -> Vec<Badge> {
    BADGE_TABLE
        .iter()
        .filter(|definition| condition_holds(definition.name, provider))
        .map(|definition| {
            let progress = badge_progress(definition.name, provider);
            Badge {
                name: definition.name,
                category: definition.name.category(),
                level: level_for(progress, definition.thresholds),
                earned_at: now,
                progress,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::tests::common::{provider_with_reviews, sample_provider};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 2, 0, 0).unwrap()
    }

    #[test]
    fn fiable_maps_vote_count_to_silver_then_gold() {
        let mut provider = provider_with_reviews("p1", 4.6, 30);
        let badges = evaluate(&provider, at());
        let fiable = badges
            .iter()
            .find(|badge| badge.name == BadgeName::Fiable)
            .expect("fiable earned at 4.6 average");
        assert_eq!(fiable.level, BadgeLevel::Silver);

        provider.rating.total_votes = 150;
        let badges = evaluate(&provider, at());
        let fiable = badges
            .iter()
            .find(|badge| badge.name == BadgeName::Fiable)
            .expect("fiable still earned");
        assert_eq!(fiable.level, BadgeLevel::Gold, "level follows current metrics");
    }

    #[test]
    fn badge_can_regress_when_metrics_drop() {
        let mut provider = provider_with_reviews("p1", 4.9, 40);
        let before = evaluate(&provider, at());
        assert!(before.iter().any(|badge| badge.name == BadgeName::TopNote));

        provider.rating.average = 4.2;
        let after = evaluate(&provider, at());
        assert!(
            !after.iter().any(|badge| badge.name == BadgeName::TopNote),
            "top_note disappears below 4.8"
        );
        assert!(
            !after.iter().any(|badge| badge.name == BadgeName::Fiable),
            "fiable disappears below 4.5"
        );
    }

    #[test]
    fn populaire_tracks_total_views() {
        let mut provider = sample_provider("p1");
        provider.profile_stats.total_views = 99;
        assert!(evaluate(&provider, at())
            .iter()
            .all(|badge| badge.name != BadgeName::Populaire));

        provider.profile_stats.total_views = 600;
        let badges = evaluate(&provider, at());
        let populaire = badges
            .iter()
            .find(|badge| badge.name == BadgeName::Populaire)
            .expect("populaire above 100 views");
        assert_eq!(populaire.level, BadgeLevel::Silver);
        assert_eq!(populaire.progress, 600);
    }
}
