// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location filtering.
//!
//! Each filter is an independent predicate over a single location; the
//! active predicates are combined with AND. An empty or `all` value leaves
//! that filter off.

use crate::models::{LocationType, UserLocation, UserProfile};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// Location type filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeFilter {
    #[default]
    All,
    Only(LocationType),
}

impl TryFrom<String> for TypeFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "" | "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

/// Group membership filter, relative to the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum GroupFilter {
    #[default]
    All,
    /// Owner shares at least one group with the viewer
    SameGroup,
    /// Owner belongs to no group
    NoGroup,
}

impl TryFrom<String> for GroupFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "" | "all" => Ok(Self::All),
            "group" => Ok(Self::SameGroup),
            "no-group" => Ok(Self::NoGroup),
            other => Err(format!("unknown group filter: {other}")),
        }
    }
}

/// Filter settings as sent by the client (`?time&user&date&type&group`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocationFilters {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "type")]
    pub location_type: TypeFilter,
    #[serde(default)]
    pub group: GroupFilter,
}

/// A single active filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Time(String),
    User(String),
    Date(String),
    Type(LocationType),
    Group(GroupFilter),
}

/// Profiles needed to evaluate the group filter.
pub struct FilterContext<'a> {
    pub viewer: Option<&'a UserProfile>,
    pub profiles: &'a HashMap<String, UserProfile>,
}

impl Predicate {
    pub fn matches(&self, location: &UserLocation, ctx: &FilterContext<'_>) -> bool {
        match self {
            Predicate::Time(time) => location.time == *time,
            Predicate::User(uid) => location.user_id == *uid,
            Predicate::Date(date) => location.date == *date,
            Predicate::Type(kind) => location.location_type == *kind,
            Predicate::Group(GroupFilter::All) => true,
            Predicate::Group(GroupFilter::SameGroup) => {
                match (ctx.viewer, ctx.profiles.get(&location.user_id)) {
                    (Some(viewer), Some(owner)) => owner.shares_group_with(viewer),
                    _ => false,
                }
            }
            // Unknown owners count as having no group
            Predicate::Group(GroupFilter::NoGroup) => ctx
                .profiles
                .get(&location.user_id)
                .map_or(true, |owner| owner.group_ids.is_empty()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "all")
        .map(str::to_string)
}

impl LocationFilters {
    /// The active predicates, in the client's canonical order.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(time) = non_empty(&self.time) {
            predicates.push(Predicate::Time(time));
        }
        if let Some(user) = non_empty(&self.user) {
            predicates.push(Predicate::User(user));
        }
        if let Some(date) = non_empty(&self.date) {
            predicates.push(Predicate::Date(date));
        }
        if let TypeFilter::Only(kind) = self.location_type {
            predicates.push(Predicate::Type(kind));
        }
        if self.group != GroupFilter::All {
            predicates.push(Predicate::Group(self.group));
        }
        predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }
}

/// Apply predicates one after another, keeping input order.
pub fn apply_predicates(
    locations: Vec<UserLocation>,
    predicates: &[Predicate],
    ctx: &FilterContext<'_>,
) -> Vec<UserLocation> {
    predicates.iter().fold(locations, |remaining, predicate| {
        remaining
            .into_iter()
            .filter(|loc| predicate.matches(loc, ctx))
            .collect()
    })
}

pub fn apply_filters(
    locations: Vec<UserLocation>,
    filters: &LocationFilters,
    ctx: &FilterContext<'_>,
) -> Vec<UserLocation> {
    apply_predicates(locations, &filters.predicates(), ctx)
}

/// Sorted distinct dates, for the date filter's options.
pub fn date_options(locations: &[UserLocation]) -> Vec<String> {
    locations
        .iter()
        .filter(|l| !l.date.is_empty())
        .map(|l| l.date.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, user: &str, kind: LocationType, date: &str, time: &str) -> UserLocation {
        UserLocation {
            id: id.to_string(),
            user_id: user.to_string(),
            x: 0.0,
            y: 0.0,
            date: date.to_string(),
            time: time.to_string(),
            end_time: None,
            comment: None,
            location: None,
            location_type: kind,
            is_active: true,
            timestamp: String::new(),
        }
    }

    fn profile(uid: &str, groups: &[&str]) -> UserProfile {
        UserProfile {
            group_ids: groups.iter().map(|g| g.to_string()).collect(),
            display_name: uid.to_string(),
            ..UserProfile::placeholder(uid)
        }
    }

    fn ids(locations: &[UserLocation]) -> Vec<&str> {
        locations.iter().map(|l| l.id.as_str()).collect()
    }

    fn sample() -> (Vec<UserLocation>, HashMap<String, UserProfile>) {
        let locations = vec![
            location("l1", "alice", LocationType::Current, "2025-08-09", "09:00"),
            location("l2", "alice", LocationType::Scheduled, "2025-08-10", "13:00"),
            location("l3", "bob", LocationType::Scheduled, "2025-08-10", "09:00"),
            location("l4", "carol", LocationType::Current, "2025-08-10", "13:00"),
            location("l5", "dave", LocationType::Scheduled, "2025-08-09", "13:00"),
        ];
        let profiles = [
            profile("alice", &["g1"]),
            profile("bob", &["g2"]),
            profile("carol", &[]),
            profile("viewer", &["g1", "g3"]),
        ]
        .into_iter()
        .map(|p| (p.uid.clone(), p))
        .collect();
        (locations, profiles)
    }

    #[test]
    fn test_date_and_type_filters() {
        let locations = vec![
            location("match", "alice", LocationType::Scheduled, "2025-08-10", "13:00"),
            location("other", "alice", LocationType::Current, "2025-08-09", "09:00"),
        ];
        let profiles = HashMap::new();
        let ctx = FilterContext {
            viewer: None,
            profiles: &profiles,
        };
        let filters = LocationFilters {
            date: Some("2025-08-10".to_string()),
            location_type: TypeFilter::Only(LocationType::Scheduled),
            ..Default::default()
        };

        let result = apply_filters(locations, &filters, &ctx);
        assert_eq!(ids(&result), vec!["match"]);
    }

    #[test]
    fn test_sentinels_disable_filters() {
        let (locations, profiles) = sample();
        let ctx = FilterContext {
            viewer: None,
            profiles: &profiles,
        };
        let filters = LocationFilters {
            time: Some(String::new()),
            user: Some("all".to_string()),
            ..Default::default()
        };
        assert!(filters.is_empty());
        assert_eq!(apply_filters(locations.clone(), &filters, &ctx), locations);
    }

    #[test]
    fn test_group_filters() {
        let (locations, profiles) = sample();
        let ctx = FilterContext {
            viewer: profiles.get("viewer"),
            profiles: &profiles,
        };

        let same = apply_predicates(
            locations.clone(),
            &[Predicate::Group(GroupFilter::SameGroup)],
            &ctx,
        );
        assert_eq!(ids(&same), vec!["l1", "l2"]);

        // dave has no profile and is treated as ungrouped
        let none = apply_predicates(locations, &[Predicate::Group(GroupFilter::NoGroup)], &ctx);
        assert_eq!(ids(&none), vec!["l4", "l5"]);
    }

    #[test]
    fn test_same_group_without_viewer_profile_matches_nothing() {
        let (locations, profiles) = sample();
        let ctx = FilterContext {
            viewer: None,
            profiles: &profiles,
        };
        let same = apply_predicates(locations, &[Predicate::Group(GroupFilter::SameGroup)], &ctx);
        assert!(same.is_empty());
    }

    #[test]
    fn test_predicate_order_does_not_matter() {
        let (locations, profiles) = sample();
        let ctx = FilterContext {
            viewer: profiles.get("viewer"),
            profiles: &profiles,
        };
        let predicates = vec![
            Predicate::Time("13:00".to_string()),
            Predicate::Date("2025-08-10".to_string()),
            Predicate::Type(LocationType::Scheduled),
            Predicate::Group(GroupFilter::SameGroup),
        ];
        let expected = apply_predicates(locations.clone(), &predicates, &ctx);
        assert_eq!(ids(&expected), vec!["l2"]);

        // Every rotation and its reverse
        for shift in 0..predicates.len() {
            let mut order = predicates.clone();
            order.rotate_left(shift);
            assert_eq!(apply_predicates(locations.clone(), &order, &ctx), expected);
            order.reverse();
            assert_eq!(apply_predicates(locations.clone(), &order, &ctx), expected);
        }
    }

    #[test]
    fn test_query_deserialization() {
        let filters: LocationFilters =
            serde_json::from_str(r#"{"type":"scheduled","group":"no-group","date":""}"#).unwrap();
        assert_eq!(filters.location_type, TypeFilter::Only(LocationType::Scheduled));
        assert_eq!(filters.group, GroupFilter::NoGroup);
        assert_eq!(filters.predicates().len(), 2);

        assert!(serde_json::from_str::<LocationFilters>(r#"{"type":"later"}"#).is_err());
    }

    #[test]
    fn test_date_options_sorted_distinct() {
        let (locations, _) = sample();
        assert_eq!(date_options(&locations), vec!["2025-08-09", "2025-08-10"]);
    }
}
