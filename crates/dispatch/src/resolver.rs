//! Tiered match-then-rank selection of a collector for a site visit.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::geo::{Coordinates, UNKNOWN_DISTANCE_KM, distance_km};

/// Geographic-affinity bucket a candidate falls into, evaluated in priority
/// order. The first non-empty tier wins the whole resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchTier {
    PerfectMatch,
    StateMatch,
    HubMatch,
    AnyCandidate,
}

/// Projection of a site visit for assignment purposes. Strings may be empty;
/// an empty field never matches anything.
#[derive(Debug, Clone, Default)]
pub struct VisitTarget {
    pub state: String,
    pub locality: String,
    pub hub: String,
    pub coordinates: Option<Coordinates>,
}

/// A collector eligible for assignment. Callers pre-filter the pool by role
/// (and by availability if they want to); the resolver only ranks.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: Uuid,
    pub home_state: Option<String>,
    pub home_locality: Option<String>,
    pub home_hub: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Outcome of one resolution. `assigned_to` is `None` only for an empty
/// pool; a non-empty pool always produces exactly one collector.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct AssignmentDecision {
    pub assigned_to: Option<Uuid>,
    pub tier: Option<MatchTier>,
    pub workload: Option<u32>,
    /// Distance to the winner when both sides had usable coordinates.
    pub distance_km: Option<f64>,
}

impl AssignmentDecision {
    fn unassigned() -> Self {
        Self {
            assigned_to: None,
            tier: None,
            workload: None,
            distance_km: None,
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Both sides must be non-empty after trim+lowercase for a match.
fn fields_match(candidate: Option<&str>, target: &str) -> bool {
    let target = normalize(target);
    if target.is_empty() {
        return false;
    }
    match candidate {
        Some(candidate) => {
            let candidate = normalize(candidate);
            !candidate.is_empty() && candidate == target
        }
        None => false,
    }
}

struct Scored<'a> {
    candidate: &'a Candidate,
    state_match: bool,
    locality_match: bool,
    hub_match: bool,
    workload: u32,
    distance: f64,
}

/// Select at most one candidate for a visit.
///
/// Candidates are partitioned into tiers (state+locality, state, hub, any),
/// and within the winning tier ranked ascending by `(workload, distance)`.
/// The sort is stable, so remaining ties fall back to pool order and the
/// result is deterministic for a fixed input.
pub fn resolve_assignment<F>(
    target: &VisitTarget,
    pool: &[Candidate],
    mut workload_of: F,
) -> AssignmentDecision
where
    F: FnMut(Uuid) -> u32,
{
    if pool.is_empty() {
        return AssignmentDecision::unassigned();
    }

    let target_coords = target.coordinates.filter(Coordinates::is_valid);

    let scored: Vec<Scored<'_>> = pool
        .iter()
        .map(|candidate| {
            let distance = match (target_coords, candidate.coordinates.filter(Coordinates::is_valid))
            {
                (Some(site), Some(collector)) => distance_km(site, collector),
                _ => UNKNOWN_DISTANCE_KM,
            };
            Scored {
                state_match: fields_match(candidate.home_state.as_deref(), &target.state),
                locality_match: fields_match(candidate.home_locality.as_deref(), &target.locality),
                hub_match: fields_match(candidate.home_hub.as_deref(), &target.hub),
                workload: workload_of(candidate.id),
                distance,
                candidate,
            }
        })
        .collect();

    let mut members: Vec<&Scored<'_>> = scored
        .iter()
        .filter(|s| s.state_match && s.locality_match)
        .collect();
    let tier = if !members.is_empty() {
        MatchTier::PerfectMatch
    } else {
        members = scored.iter().filter(|s| s.state_match).collect();
        if !members.is_empty() {
            MatchTier::StateMatch
        } else {
            members = scored.iter().filter(|s| s.hub_match).collect();
            if !members.is_empty() {
                MatchTier::HubMatch
            } else {
                members = scored.iter().collect();
                MatchTier::AnyCandidate
            }
        }
    };

    members.sort_by(|a, b| {
        a.workload
            .cmp(&b.workload)
            .then_with(|| a.distance.total_cmp(&b.distance))
    });

    let best = members[0];
    AssignmentDecision {
        assigned_to: Some(best.candidate.id),
        tier: Some(tier),
        workload: Some(best.workload),
        distance_km: (best.distance < UNKNOWN_DISTANCE_KM).then_some(best.distance),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn candidate(id: Uuid, state: &str, locality: &str) -> Candidate {
        Candidate {
            id,
            home_state: Some(state.to_string()),
            home_locality: Some(locality.to_string()),
            home_hub: None,
            coordinates: None,
        }
    }

    fn target(state: &str, locality: &str) -> VisitTarget {
        VisitTarget {
            state: state.to_string(),
            locality: locality.to_string(),
            hub: String::new(),
            coordinates: None,
        }
    }

    fn workloads(pairs: &[(Uuid, u32)]) -> HashMap<Uuid, u32> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn empty_pool_returns_unassigned() {
        let decision = resolve_assignment(&target("Khartoum", "Bahri"), &[], |_| 0);
        assert_eq!(decision.assigned_to, None);
        assert_eq!(decision.tier, None);
    }

    #[test]
    fn perfect_match_beats_state_match_despite_workload() {
        // W1 perfect-matches with workload 1, W2 only state-matches with
        // workload 0. W1 must still win.
        let w1 = Uuid::new_v4();
        let w2 = Uuid::new_v4();
        let pool = vec![
            candidate(w1, "Khartoum", "Bahri"),
            candidate(w2, "Khartoum", "Omdurman"),
        ];
        let counts = workloads(&[(w1, 1), (w2, 0)]);

        let decision = resolve_assignment(&target("Khartoum", "Bahri"), &pool, |id| {
            counts.get(&id).copied().unwrap_or(0)
        });

        assert_eq!(decision.assigned_to, Some(w1));
        assert_eq!(decision.tier, Some(MatchTier::PerfectMatch));
        assert_eq!(decision.workload, Some(1));
    }

    #[test]
    fn workload_breaks_ties_within_a_tier() {
        let busy = Uuid::new_v4();
        let idle = Uuid::new_v4();
        let pool = vec![
            candidate(busy, "Khartoum", "Bahri"),
            candidate(idle, "Khartoum", "Bahri"),
        ];
        let counts = workloads(&[(busy, 2), (idle, 0)]);

        let decision = resolve_assignment(&target("Khartoum", "Bahri"), &pool, |id| {
            counts.get(&id).copied().unwrap_or(0)
        });

        assert_eq!(decision.assigned_to, Some(idle));
    }

    #[test]
    fn distance_breaks_ties_at_equal_workload() {
        let far = Uuid::new_v4();
        let near = Uuid::new_v4();
        let site = Coordinates::new(15.5007, 32.5599);
        let mut far_candidate = candidate(far, "Khartoum", "Bahri");
        far_candidate.coordinates = Some(Coordinates::new(19.6158, 37.2164));
        let mut near_candidate = candidate(near, "Khartoum", "Bahri");
        near_candidate.coordinates = Some(Coordinates::new(15.6, 32.5));

        let mut visit = target("Khartoum", "Bahri");
        visit.coordinates = Some(site);

        let decision = resolve_assignment(&visit, &[far_candidate, near_candidate], |_| 0);
        assert_eq!(decision.assigned_to, Some(near));
        assert!(decision.distance_km.unwrap() < 20.0);
    }

    #[test]
    fn origin_coordinates_never_win_a_distance_tie() {
        let unknown = Uuid::new_v4();
        let located = Uuid::new_v4();
        let mut unknown_candidate = candidate(unknown, "Khartoum", "Bahri");
        unknown_candidate.coordinates = Some(Coordinates::new(0.0, 0.0));
        let mut located_candidate = candidate(located, "Khartoum", "Bahri");
        located_candidate.coordinates = Some(Coordinates::new(15.6, 32.5));

        let mut visit = target("Khartoum", "Bahri");
        visit.coordinates = Some(Coordinates::new(15.5007, 32.5599));

        // unknown first in pool order so a stable-sort tie would pick it
        let decision = resolve_assignment(&visit, &[unknown_candidate, located_candidate], |_| 0);
        assert_eq!(decision.assigned_to, Some(located));
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        let id = Uuid::new_v4();
        let pool = vec![candidate(id, " khartoum ", "BAHRI")];

        let decision = resolve_assignment(&target("Khartoum", "Bahri"), &pool, |_| 0);
        assert_eq!(decision.tier, Some(MatchTier::PerfectMatch));
        assert_eq!(decision.assigned_to, Some(id));
    }

    #[test]
    fn empty_fields_never_match() {
        let id = Uuid::new_v4();
        let pool = vec![candidate(id, "", "")];

        // Both sides empty is not a match; falls through to AnyCandidate.
        let decision = resolve_assignment(&target("", ""), &pool, |_| 0);
        assert_eq!(decision.tier, Some(MatchTier::AnyCandidate));
        assert_eq!(decision.assigned_to, Some(id));
    }

    #[test]
    fn hub_match_ranks_above_any_candidate() {
        let hub_worker = Uuid::new_v4();
        let other = Uuid::new_v4();
        let pool = vec![
            candidate(other, "Kassala", "Kassala Town"),
            Candidate {
                id: hub_worker,
                home_state: Some("Gezira".to_string()),
                home_locality: None,
                home_hub: Some("East Hub".to_string()),
                coordinates: None,
            },
        ];

        let mut visit = target("Khartoum", "Bahri");
        visit.hub = "East Hub".to_string();

        let counts = workloads(&[(hub_worker, 5), (other, 0)]);
        let decision = resolve_assignment(&visit, &pool, |id| {
            counts.get(&id).copied().unwrap_or(0)
        });

        assert_eq!(decision.tier, Some(MatchTier::HubMatch));
        assert_eq!(decision.assigned_to, Some(hub_worker));
    }

    #[test]
    fn falls_back_to_any_candidate() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let pool = vec![
            candidate(a, "Kassala", "Kassala Town"),
            candidate(b, "Gezira", "Wad Madani"),
        ];
        let counts = workloads(&[(a, 3), (b, 1)]);

        let decision = resolve_assignment(&target("Khartoum", "Bahri"), &pool, |id| {
            counts.get(&id).copied().unwrap_or(0)
        });

        assert_eq!(decision.tier, Some(MatchTier::AnyCandidate));
        assert_eq!(decision.assigned_to, Some(b));
    }

    #[test]
    fn equal_rank_falls_back_to_pool_order() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let pool = vec![
            candidate(first, "Khartoum", "Bahri"),
            candidate(second, "Khartoum", "Bahri"),
        ];

        let decision = resolve_assignment(&target("Khartoum", "Bahri"), &pool, |_| 0);
        assert_eq!(decision.assigned_to, Some(first));
    }

    #[test]
    fn repeated_resolution_is_deterministic() {
        let ids: Vec<Uuid> = (0..20).map(|_| Uuid::new_v4()).collect();
        let pool: Vec<Candidate> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let state = if i % 2 == 0 { "Khartoum" } else { "Kassala" };
                candidate(*id, state, "Bahri")
            })
            .collect();
        let counts: HashMap<Uuid, u32> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, (i % 3) as u32))
            .collect();

        let visit = target("Khartoum", "Bahri");
        let first = resolve_assignment(&visit, &pool, |id| counts[&id]);
        for _ in 0..10 {
            let again = resolve_assignment(&visit, &pool, |id| counts[&id]);
            assert_eq!(first, again);
        }
    }

    #[test]
    fn missing_coordinates_use_sentinel_distance() {
        let id = Uuid::new_v4();
        let pool = vec![candidate(id, "Khartoum", "Bahri")];
        let mut visit = target("Khartoum", "Bahri");
        visit.coordinates = Some(Coordinates::new(15.5007, 32.5599));

        let decision = resolve_assignment(&visit, &pool, |_| 0);
        assert_eq!(decision.assigned_to, Some(id));
        assert_eq!(decision.distance_km, None);
    }
}
