//! Subnet selection queries.

use crate::error::{PlanError, Result};
use crate::models::{AccessibilityClass, SubnetRecord};
use itertools::Itertools;
use std::collections::HashSet;

/// Criteria for picking subnets out of a locked network. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubnetSelection {
    /// Only subnets of this group.
    pub group: Option<String>,
    /// Only subnets of this class.
    pub class: Option<AccessibilityClass>,
    /// Only these subnets, by [`SubnetRecord::id`].
    pub subnet_ids: Option<Vec<String>>,
    /// Only subnets in these zones.
    pub zones: Option<Vec<String>>,
    /// Keep the first subnet of each zone.
    pub one_per_zone: bool,
}

impl SubnetSelection {
    /// Select everything the default class allows.
    pub fn new() -> SubnetSelection {
        SubnetSelection::default()
    }

    /// Restrict to a subnet group.
    pub fn group(mut self, group: impl Into<String>) -> SubnetSelection {
        self.group = Some(group.into());
        self
    }

    /// Restrict to an accessibility class.
    pub fn class(mut self, class: AccessibilityClass) -> SubnetSelection {
        self.class = Some(class);
        self
    }

    /// Restrict to an explicit set of subnet ids.
    pub fn subnets<I, S>(mut self, ids: I) -> SubnetSelection
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subnet_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict to a list of zones.
    pub fn zones<I, S>(mut self, zones: I) -> SubnetSelection
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = Some(zones.into_iter().map(Into::into).collect());
        self
    }

    /// Keep at most one subnet per zone.
    pub fn one_per_zone(mut self) -> SubnetSelection {
        self.one_per_zone = true;
        self
    }
}

/// Apply `selection` to `subnets`, keeping registration order.
///
/// `default_class` is used when the selection names neither a class, a group
/// nor an explicit subnet list.
pub fn select<'a>(
    subnets: &'a [SubnetRecord],
    default_class: &AccessibilityClass,
    selection: &SubnetSelection,
) -> Result<Vec<&'a SubnetRecord>> {
    if let Some(group) = &selection.group {
        if !subnets.iter().any(|s| &s.group == group) {
            let available: Vec<String> = subnets.iter().map(|s| s.group.clone()).unique().collect();
            log::warn!("unknown subnet group '{group}', have [{}]", available.join(", "));
            return Err(PlanError::UnknownGroup {
                group: group.clone(),
                available,
            });
        }
    }

    let class = match (&selection.class, &selection.group, &selection.subnet_ids) {
        (Some(class), _, _) => Some(class),
        (None, None, None) => Some(default_class),
        _ => None,
    };
    let ids: Option<HashSet<&str>> = selection
        .subnet_ids
        .as_ref()
        .map(|ids| ids.iter().map(String::as_str).collect());

    let mut seen_zones = HashSet::new();
    let picked: Vec<&SubnetRecord> = subnets
        .iter()
        .filter(|s| selection.group.as_ref().map_or(true, |g| &s.group == g))
        .filter(|s| class.map_or(true, |c| &s.class == c))
        .filter(|s| ids.as_ref().map_or(true, |ids| ids.contains(s.id().as_str())))
        .filter(|s| selection.zones.as_ref().map_or(true, |zones| zones.contains(&s.zone)))
        .filter(|s| !selection.one_per_zone || seen_zones.insert(s.zone.as_str()))
        .collect();

    log::debug!(
        "selected {} of {} subnets: [{}]",
        picked.len(),
        subnets.len(),
        picked.iter().map(|s| s.id()).join(", ")
    );
    Ok(picked)
}
