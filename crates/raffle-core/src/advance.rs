// Tier advancement after a confirmed winner.

use crate::model::PrizeTier;
use crate::pool;

/// What the advancement policy did to the active tier selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advancement {
    /// The active tier was not in the pool (deleted mid-draw). Nothing changed.
    TierMissing,
    /// The tier was decremented and still has budget.
    Stayed { tier: String, remaining: u32 },
    /// The tier ran out and the selector moved to another tier.
    Advanced { from: String, to: String },
    /// Every tier is exhausted; the selector now holds the sentinel label.
    AllDrawn { from: String },
}

impl Advancement {
    /// The selector value after advancement, or `None` when it is unchanged.
    pub fn next_active(&self, exhausted_label: &str) -> Option<String> {
        match self {
            Advancement::TierMissing | Advancement::Stayed { .. } => None,
            Advancement::Advanced { to, .. } => Some(to.clone()),
            Advancement::AllDrawn { .. } => Some(exhausted_label.to_string()),
        }
    }
}

/// Decrement the tier named `active` and work out the next active tier.
///
/// The search for a replacement starts strictly after the exhausted tier and
/// wraps to the front of the pool. Order is positional only.
pub fn advance(pool: &mut [PrizeTier], active: &str) -> Advancement {
    let Some(idx) = pool::position_of(pool, active) else {
        return Advancement::TierMissing;
    };

    let tier = &mut pool[idx];
    tier.remaining_count = tier.remaining_count.saturating_sub(1);
    if tier.remaining_count > 0 {
        return Advancement::Stayed {
            tier: tier.name.clone(),
            remaining: tier.remaining_count,
        };
    }

    let from = tier.name.clone();
    let next = pool[idx + 1..]
        .iter()
        .chain(pool[..idx].iter())
        .find(|t| t.is_available());

    match next {
        Some(t) => Advancement::Advanced {
            from,
            to: t.name.clone(),
        },
        None => Advancement::AllDrawn { from },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL: &str = "All prizes drawn";

    fn pool(tiers: &[(&str, u32)]) -> Vec<PrizeTier> {
        tiers.iter().map(|&(n, c)| PrizeTier::new(n, c)).collect()
    }

    fn counts(pool: &[PrizeTier]) -> Vec<u32> {
        pool.iter().map(|t| t.remaining_count).collect()
    }

    #[test]
    fn stays_on_tier_with_budget_left() {
        let mut p = pool(&[("A", 0), ("B", 2), ("C", 0)]);
        let adv = advance(&mut p, "B");
        assert_eq!(adv, Advancement::Stayed { tier: "B".into(), remaining: 1 });
        assert_eq!(adv.next_active(SENTINEL), None);
        assert_eq!(counts(&p), vec![0, 1, 0]);
    }

    #[test]
    fn exhausting_tier_scans_forward_first() {
        let mut p = pool(&[("A", 3), ("B", 1), ("C", 2)]);
        let adv = advance(&mut p, "B");
        assert_eq!(adv, Advancement::Advanced { from: "B".into(), to: "C".into() });
    }

    #[test]
    fn exhausting_tier_wraps_to_front() {
        let mut p = pool(&[("A", 2), ("B", 1), ("C", 0)]);
        let adv = advance(&mut p, "B");
        assert_eq!(adv, Advancement::Advanced { from: "B".into(), to: "A".into() });
        assert_eq!(adv.next_active(SENTINEL).as_deref(), Some("A"));
    }

    #[test]
    fn all_exhausted_yields_sentinel() {
        let mut p = pool(&[("A", 0), ("B", 1), ("C", 0)]);
        let adv = advance(&mut p, "B");
        assert_eq!(adv, Advancement::AllDrawn { from: "B".into() });
        assert_eq!(adv.next_active(SENTINEL).as_deref(), Some(SENTINEL));
        assert_eq!(counts(&p), vec![0, 0, 0]);
    }

    #[test]
    fn missing_tier_is_a_no_op() {
        let mut p = pool(&[("A", 1)]);
        assert_eq!(advance(&mut p, "Deleted"), Advancement::TierMissing);
        assert_eq!(counts(&p), vec![1]);
    }

    #[test]
    fn count_floors_at_zero() {
        let mut p = pool(&[("A", 0), ("B", 1)]);
        let adv = advance(&mut p, "A");
        assert_eq!(p[0].remaining_count, 0);
        assert_eq!(adv, Advancement::Advanced { from: "A".into(), to: "B".into() });
    }

    #[test]
    fn budgets_never_increase() {
        let mut p = pool(&[("A", 2), ("B", 1), ("C", 3)]);
        let mut active = "A".to_string();
        let mut previous = counts(&p);
        for _ in 0..10 {
            if let Some(next) = advance(&mut p, &active).next_active(SENTINEL) {
                active = next;
            }
            let now = counts(&p);
            assert!(now.iter().zip(&previous).all(|(n, o)| n <= o));
            previous = now;
        }
        assert_eq!(counts(&p), vec![0, 0, 0]);
        assert_eq!(active, SENTINEL);
    }
}
