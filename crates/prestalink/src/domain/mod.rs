//! Typed marketplace entities and the rules that live on them.

pub mod client;
pub mod provider;
pub mod schedule;

pub use client::{
    ActivityStats, BehavioralPreferences, BudgetRange, Client, ClientActivity, ClientId,
    ClientPreferences, ContactRecord, ContactStatus, FavoriteEntry, PlanType, PreferredTimeSlot,
    ProfileViewRecord, ReliabilityPreferences, SearchRecord, Subscription, SubscriptionStatus,
    FREE_PLAN_WEEKLY_CONTACTS,
};
pub use provider::{
    Badge, BadgeCategory, BadgeLevel, BadgeName, BestWeek, CurrentStatus, Gamification, Points,
    ProfileStats, Provider, ProviderId, ProviderStatus, RankSlots, Rating, RecentView,
    ReviewRejection, Review, ServiceOffering, StatusChange, Streaks, WeeklyViewBucket,
};
pub use schedule::{week_number, week_start, DayAvailability, DayOfWeek, DayPart, TimeSlot};
