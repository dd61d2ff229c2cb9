// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use chrono::{NaiveDateTime, TimeDelta};

use crate::opening_hours::{OpeningHours, OpeningState};
use crate::{Error, RoadPoint};

/// Half-width of the window around the simulated arrival time in which
/// conditional access rules are evaluated.
const CONFIDENCE_WINDOW_MINUTES: i64 = 7;

/// Who may use a road or pass through a point.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoadAccessType {
    No,
    Private,
    Destination,
    #[default]
    Yes,
}

impl RoadAccessType {
    /// Folds an access tag value into one of the access types.
    pub fn from_tag(tag: &str) -> Result<Self, Error> {
        match tag {
            "no" => Ok(Self::No),
            "private" | "customers" | "delivery" | "agricultural" | "forestry" => {
                Ok(Self::Private)
            }
            "destination" => Ok(Self::Destination),
            "yes" | "permissive" | "designated" | "official" => Ok(Self::Yes),
            _ => Err(Error::UnknownAccessTag(tag.to_string())),
        }
    }
}

/// How certain an access evaluation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    /// The access may change around the evaluated moment, or depends on unknown hours.
    Maybe,
    Sure,
}

/// Ordered list of time-dependent access rules. The first rule applying
/// at the evaluated moment wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Conditional {
    rules: Vec<(RoadAccessType, OpeningHours)>,
}

impl Conditional {
    pub fn new(rules: Vec<(RoadAccessType, OpeningHours)>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parses a conditional access tag value, like `no @ (22:00-06:00); destination @ (Sa,Su)`.
    ///
    /// Malformed rules are logged and skipped.
    pub fn from_tag(tag: &str) -> Self {
        let mut rules = Vec::default();

        for rule in split_top_level(tag) {
            match parse_conditional_rule(rule) {
                Ok(parsed) => rules.push(parsed),
                Err(e) => log::warn!("skipping conditional access rule {:?}: {}", rule, e),
            }
        }

        Self { rules }
    }

    /// Returns the access of the first rule applying around `time`, or `None` if no rule applies.
    ///
    /// A rule is evaluated at `time` ± 7 minutes. Closed at both moments means the rule
    /// does not apply, open at both moments gives a sure result, while any
    /// other combination (including unknown hours) gives an uncertain one.
    pub fn evaluate(&self, time: NaiveDateTime) -> Option<(RoadAccessType, Confidence)> {
        let window = TimeDelta::minutes(CONFIDENCE_WINDOW_MINUTES);
        let before = time.checked_sub_signed(window).unwrap_or(time);
        let after = time.checked_add_signed(window).unwrap_or(time);

        self.rules.iter().find_map(|(access, hours)| {
            match (hours.state_at(before), hours.state_at(after)) {
                (OpeningState::Closed, OpeningState::Closed) => None,
                (OpeningState::Open, OpeningState::Open) => Some((*access, Confidence::Sure)),
                _ => Some((*access, Confidence::Maybe)),
            }
        })
    }
}

/// Splits on `;` outside of parentheses.
fn split_top_level(s: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::default();
    let mut depth: usize = 0;
    let mut begin = 0;

    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                parts.push(&s[begin..i]);
                begin = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[begin..]);

    parts.into_iter().map(str::trim).filter(|p| !p.is_empty())
}

fn parse_conditional_rule(rule: &str) -> Result<(RoadAccessType, OpeningHours), Error> {
    let (access, hours) = rule
        .split_once('@')
        .ok_or_else(|| Error::MalformedOpeningHours {
            rule: rule.to_string(),
            reason: "missing '@'",
        })?;

    let hours = hours.trim();
    let hours = hours
        .strip_prefix('(')
        .and_then(|h| h.strip_suffix(')'))
        .unwrap_or(hours);

    Ok((RoadAccessType::from_tag(access.trim())?, hours.parse()?))
}

/// Access tables of a single region.
#[derive(Debug, Default, Clone)]
pub struct RoadAccess {
    features: HashMap<u32, RoadAccessType>,
    points: HashMap<RoadPoint, RoadAccessType>,
    conditional_features: HashMap<u32, Conditional>,
    conditional_points: HashMap<RoadPoint, Conditional>,
}

impl RoadAccess {
    pub fn set_feature_access(&mut self, feature_id: u32, access: RoadAccessType) {
        self.features.insert(feature_id, access);
    }

    pub fn set_point_access(&mut self, point: RoadPoint, access: RoadAccessType) {
        self.points.insert(point, access);
    }

    pub fn set_feature_conditional(&mut self, feature_id: u32, conditional: Conditional) {
        if !conditional.is_empty() {
            self.conditional_features.insert(feature_id, conditional);
        }
    }

    pub fn set_point_conditional(&mut self, point: RoadPoint, conditional: Conditional) {
        if !conditional.is_empty() {
            self.conditional_points.insert(point, conditional);
        }
    }

    /// Access of a whole feature, evaluated at `time` (if known).
    pub fn feature_access(
        &self,
        feature_id: u32,
        time: Option<NaiveDateTime>,
    ) -> (RoadAccessType, Confidence) {
        Self::resolve(
            self.features.get(&feature_id),
            self.conditional_features.get(&feature_id),
            time,
        )
    }

    /// Access through a single point, evaluated at `time` (if known).
    pub fn point_access(
        &self,
        point: RoadPoint,
        time: Option<NaiveDateTime>,
    ) -> (RoadAccessType, Confidence) {
        Self::resolve(
            self.points.get(&point),
            self.conditional_points.get(&point),
            time,
        )
    }

    fn resolve(
        unconditional: Option<&RoadAccessType>,
        conditional: Option<&Conditional>,
        time: Option<NaiveDateTime>,
    ) -> (RoadAccessType, Confidence) {
        if let (Some(conditional), Some(time)) = (conditional, time) {
            if let Some(result) = conditional.evaluate(time) {
                return result;
            }
        }

        (
            unconditional.copied().unwrap_or_default(),
            Confidence::Sure,
        )
    }
}
