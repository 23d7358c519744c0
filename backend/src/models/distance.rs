//! Point-pair distance table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use super::diagnostics::{Diagnostic, DiagnosticKind};
use crate::api::{km, Distance, PointId};

/// Raw route distance row as returned by the data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDistanceRow {
    #[serde(default)]
    pub origin_point: Option<String>,
    #[serde(default)]
    pub destination_point: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
}

impl RouteDistanceRow {
    pub fn new(origin: &str, destination: &str, distance: f64) -> Self {
        Self {
            origin_point: Some(origin.to_string()),
            destination_point: Some(destination.to_string()),
            distance: Some(distance),
        }
    }
}

/// How to settle several distances supplied for one ordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDistancePolicy {
    /// Smallest value wins.
    #[default]
    Min,
    /// First row in provider order wins.
    FirstSeen,
}

impl FromStr for DuplicateDistancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(DuplicateDistancePolicy::Min),
            "first_seen" | "first-seen" | "first" => Ok(DuplicateDistancePolicy::FirstSeen),
            other => Err(format!("unknown duplicate distance policy '{}'", other)),
        }
    }
}

/// Directed distance lookup. Not assumed symmetric or total.
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    entries: HashMap<(PointId, PointId), Distance>,
}

impl DistanceTable {
    /// Build the table, rejecting unusable rows and settling duplicates with
    /// `policy`. Every rejected or collapsed row is reported.
    pub fn from_rows(
        rows: &[RouteDistanceRow],
        policy: DuplicateDistancePolicy,
    ) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut grouped: BTreeMap<(PointId, PointId), Vec<f64>> = BTreeMap::new();

        for row in rows {
            let from = PointId::parse(row.origin_point.as_deref());
            let to = PointId::parse(row.destination_point.as_deref());
            let value = row.distance.filter(|d| d.is_finite() && *d >= 0.0);

            match (from, to, value) {
                (Some(from), Some(to), Some(value)) => {
                    grouped.entry((from, to)).or_default().push(value);
                }
                (from, to, _) => diagnostics.push(Diagnostic::for_dataset(
                    DiagnosticKind::InvalidDistance {
                        from,
                        to,
                        value: row.distance,
                    },
                )),
            }
        }

        let mut entries = HashMap::with_capacity(grouped.len());
        for ((from, to), candidates) in grouped {
            let kept = match policy {
                DuplicateDistancePolicy::Min => {
                    candidates.iter().copied().fold(f64::INFINITY, f64::min)
                }
                DuplicateDistancePolicy::FirstSeen => candidates[0],
            };

            if candidates.len() > 1 {
                diagnostics.push(Diagnostic::for_dataset(DiagnosticKind::DuplicateDistance {
                    from: from.clone(),
                    to: to.clone(),
                    candidates: candidates.clone(),
                    kept,
                }));
            }
            entries.insert((from, to), km(kept));
        }

        if !diagnostics.is_empty() {
            log::debug!(
                "Distance table built with {} pairs, {} rows rejected or collapsed",
                entries.len(),
                diagnostics.len()
            );
        }

        (Self { entries }, diagnostics)
    }

    /// Build directly from known pairs. Later pairs overwrite earlier ones.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S, f64)>,
        S: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(from, to, d)| ((PointId::new(from), PointId::new(to)), km(d)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, from: &PointId, to: &PointId) -> Option<Distance> {
        self.entries.get(&(from.clone(), to.clone())).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
