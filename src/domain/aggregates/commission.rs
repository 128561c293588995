//! Commission schedule and the referral credit computation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::domain::value_objects::Money;
use crate::error::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "commission_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CommissionStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    /// PENDING -> APPROVED -> PAID, with CANCELLED reachable until payout.
    pub fn allows(self, to: CommissionStatus) -> bool {
        use CommissionStatus::*;
        matches!(
            (self, to),
            (Pending, Approved) | (Approved, Paid) | (Pending, Cancelled) | (Approved, Cancelled)
        )
    }

    pub fn transition(self, to: CommissionStatus) -> Result<CommissionStatus, StoreError> {
        if self.allows(to) {
            Ok(to)
        } else {
            Err(StoreError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "commission_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CommissionKind {
    Referral,
    Level,
    Bonus,
}

/// One admin-configured commission level, as loaded from storage.
#[derive(Clone, Debug)]
pub struct LevelSetting {
    pub level: u32,
    pub percentage: Decimal,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// The active percentage-per-level table the engine consults.
///
/// Levels with no active setting are absent, so no zero-amount credits are
/// ever produced for them. Duplicate rows per level should not exist, but if
/// they do the most recently updated one wins.
#[derive(Clone, Debug, Default)]
pub struct CommissionSchedule {
    levels: BTreeMap<u32, Decimal>,
}

impl CommissionSchedule {
    pub fn from_settings(settings: impl IntoIterator<Item = LevelSetting>) -> Self {
        let mut latest: BTreeMap<u32, (DateTime<Utc>, Decimal)> = BTreeMap::new();
        for s in settings {
            if !s.is_active || s.level == 0 {
                continue;
            }
            match latest.get(&s.level) {
                Some((seen, _)) if *seen >= s.updated_at => {}
                _ => {
                    latest.insert(s.level, (s.updated_at, s.percentage));
                }
            }
        }
        Self {
            levels: latest.into_iter().map(|(l, (_, p))| (l, p)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Highest configured level; bounds the referral-chain walk.
    pub fn max_level(&self) -> u32 {
        self.levels.keys().next_back().copied().unwrap_or(0)
    }

    pub fn rate(&self, level: u32) -> Option<Decimal> {
        self.levels.get(&level).copied()
    }
}

/// A single planned credit, before persistence.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedCredit {
    pub recipient_id: Uuid,
    pub level: u32,
    pub amount: Decimal,
}

/// Maps a referral ancestry (index 0 = direct referrer) onto the schedule.
/// A chain shorter than the table credits fewer levels; a level without an
/// active rate is skipped outright.
pub fn plan_credits(
    schedule: &CommissionSchedule,
    order_total: &Money,
    ancestors: &[Uuid],
) -> Vec<PlannedCredit> {
    let mut credits = Vec::new();
    for (idx, recipient) in ancestors.iter().enumerate() {
        let level = idx as u32 + 1;
        if level > schedule.max_level() {
            break;
        }
        if let Some(rate) = schedule.rate(level) {
            credits.push(PlannedCredit {
                recipient_id: *recipient,
                level,
                amount: order_total.percent(rate).amount(),
            });
        }
    }
    credits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn setting(level: u32, percentage: Decimal, active: bool) -> LevelSetting {
        LevelSetting {
            level,
            percentage,
            is_active: active,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_two_level_chain_credits() {
        let schedule = CommissionSchedule::from_settings(vec![
            setting(1, dec!(10), true),
            setting(2, dec!(5), true),
        ]);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let credits = plan_credits(&schedule, &Money::inr(dec!(1000)), &[a, b]);
        assert_eq!(
            credits,
            vec![
                PlannedCredit { recipient_id: a, level: 1, amount: dec!(100.00) },
                PlannedCredit { recipient_id: b, level: 2, amount: dec!(50.00) },
            ]
        );
    }

    #[test]
    fn test_chain_shorter_than_table() {
        let schedule = CommissionSchedule::from_settings(vec![
            setting(1, dec!(10), true),
            setting(2, dec!(5), true),
            setting(3, dec!(2), true),
        ]);
        let a = Uuid::new_v4();
        let credits = plan_credits(&schedule, &Money::inr(dec!(200)), &[a]);
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].amount, dec!(20.00));
    }

    #[test]
    fn test_inactive_level_skipped_entirely() {
        let schedule = CommissionSchedule::from_settings(vec![
            setting(1, dec!(10), true),
            setting(2, dec!(5), false),
            setting(3, dec!(2), true),
        ]);
        let chain = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let credits = plan_credits(&schedule, &Money::inr(dec!(1000)), &chain);
        // Level 2 produces no row at all, not a zero-amount row.
        let levels: Vec<u32> = credits.iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![1, 3]);
    }

    #[test]
    fn test_duplicate_level_latest_wins() {
        let older = LevelSetting {
            level: 1,
            percentage: dec!(10),
            is_active: true,
            updated_at: Utc::now() - chrono::Duration::days(1),
        };
        let newer = LevelSetting {
            level: 1,
            percentage: dec!(12),
            is_active: true,
            updated_at: Utc::now(),
        };
        let schedule = CommissionSchedule::from_settings(vec![older, newer]);
        assert_eq!(schedule.rate(1), Some(dec!(12)));
    }

    #[test]
    fn test_chain_capped_at_max_level() {
        let schedule = CommissionSchedule::from_settings(vec![setting(1, dec!(10), true)]);
        let chain: Vec<Uuid> = (0..10).map(|_| Uuid::new_v4()).collect();
        let credits = plan_credits(&schedule, &Money::inr(dec!(1000)), &chain);
        assert_eq!(credits.len(), 1);
    }

    #[test]
    fn test_commission_status_transitions() {
        use CommissionStatus::*;
        assert!(Pending.allows(Approved));
        assert!(Approved.allows(Paid));
        assert!(Pending.allows(Cancelled));
        assert!(Approved.allows(Cancelled));
        assert!(!Paid.allows(Cancelled));
        assert!(!Cancelled.allows(Pending));
        assert!(matches!(
            Paid.transition(Pending),
            Err(StoreError::InvalidTransition { .. })
        ));
    }
}
