//! Pure target selection over provider-supplied candidates.
//!
//! The selector ranks what the candidate provider surfaced; it does no
//! spatial queries of its own. Ranking is fully deterministic: priority
//! bucket first, then squared distance, then entity id as the final
//! tie-break.

use crate::math::{Fixed, Vec3Fixed};
use crate::targeting::{Candidate, EntityId, OwnerId, TargetCategory, TargetingPolicy};

/// An eligible candidate with its precomputed ranking key.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    id: EntityId,
    bucket: usize,
    distance_sq: Fixed,
}

impl Ranked {
    /// Strict ordering: lower bucket, then nearer, then lower id.
    fn precedes(&self, other: &Ranked) -> bool {
        (self.bucket, self.distance_sq, self.id) < (other.bucket, other.distance_sq, other.id)
    }
}

/// Priority bucket of a category under the given ordering.
///
/// Lower index = higher priority; categories absent from the ordering
/// rank below every listed one.
fn priority_bucket(priorities: &[TargetCategory], category: TargetCategory) -> usize {
    priorities
        .iter()
        .position(|&c| c == category)
        .unwrap_or(priorities.len())
}

/// Select a target among `candidates` for a turret at `origin`.
///
/// Filtering:
/// 1. Distance must be within the policy's live `range` (`max_range`
///    is only a configuration bound and never considered here).
/// 2. The candidate's category must be enabled in the policy.
/// 3. Candidates sharing the turret's owner are always excluded,
///    regardless of category.
///
/// Ranking is by priority bucket, then ascending distance, then
/// ascending id. A previous target that is still eligible is retained
/// over equally-or-lower ranked newcomers; only a strictly
/// higher-priority-bucket candidate displaces it. This keeps a turret
/// from flickering between two near-equal targets.
///
/// Returns `None` when no candidate survives filtering.
#[must_use]
pub fn select_target(
    origin: Vec3Fixed,
    candidates: &[Candidate],
    policy: &TargetingPolicy,
    priorities: &[TargetCategory],
    previous: Option<EntityId>,
    owner: Option<OwnerId>,
) -> Option<EntityId> {
    let range = Fixed::from_num(policy.range());
    let range_sq = range * range;

    let mut best: Option<Ranked> = None;
    let mut retained: Option<Ranked> = None;

    for candidate in candidates {
        let distance_sq = origin.distance_squared(candidate.position);
        if distance_sq > range_sq {
            continue;
        }

        if !policy.allows(candidate.category) {
            continue;
        }

        // No friendly fire: same owner is excluded unconditionally.
        if owner.is_some() && candidate.owner == owner {
            continue;
        }

        let ranked = Ranked {
            id: candidate.id,
            bucket: priority_bucket(priorities, candidate.category),
            distance_sq,
        };

        if previous == Some(candidate.id) {
            retained = Some(ranked);
        }

        match &mut best {
            Some(existing) => {
                if ranked.precedes(existing) {
                    *existing = ranked;
                }
            }
            None => best = Some(ranked),
        }
    }

    match (retained, best) {
        // Sustained-target rule: hold the previous target unless a
        // strictly higher-priority bucket showed up.
        (Some(prev), Some(top)) if top.bucket >= prev.bucket => Some(prev.id),
        (_, Some(top)) => Some(top.id),
        (_, None) => None,
    }
}
