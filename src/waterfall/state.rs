//! Running state of a waterfall between years

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::cashflow::InvestedCapital;
use crate::structure::{PromoteStructure, WaterfallTier};

/// An LP hurdle balance at or below this is treated as met (one cent)
pub const HURDLE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// What the LP is still owed before reaching a tier's hurdle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HurdleBalance {
    /// Cash still required; zero or negative once the hurdle is met
    Outstanding(Decimal),
    /// Open-ended tier, or a balance grown past what a decimal can hold
    Unbounded,
}

/// LP hurdle account for one tier.
///
/// Starts at the LP's capital, compounds yearly at the tier's hurdle rate,
/// goes down with every LP distribution and up with every LP capital call.
/// The balance is the future value of the LP's negative NPV at the hurdle
/// rate, so it reaches zero exactly when the LP's IRR-to-date reaches the
/// hurdle.
#[derive(Debug, Clone)]
pub struct HurdleAccount {
    pub tier_order: u32,
    growth: Option<Decimal>,
    balance: HurdleBalance,
}

impl HurdleAccount {
    pub fn open(tier: &WaterfallTier, lp_capital: Decimal) -> Self {
        let growth = if tier.is_open_ended() {
            None
        } else {
            Decimal::from_f64(tier.hurdle).map(|h| Decimal::ONE + h / Decimal::ONE_HUNDRED)
        };

        let balance = match growth {
            Some(_) => HurdleBalance::Outstanding(settle(lp_capital)),
            None => HurdleBalance::Unbounded,
        };

        Self {
            tier_order: tier.tier_order,
            growth,
            balance,
        }
    }

    /// Compound the balance over whole years
    pub fn accrue(&mut self, years: usize) {
        let (HurdleBalance::Outstanding(mut balance), Some(growth)) = (self.balance, self.growth) else {
            return;
        };

        for _ in 0..years {
            match balance.checked_mul(growth) {
                Some(next) => balance = next,
                None if balance.is_sign_positive() => {
                    self.balance = HurdleBalance::Unbounded;
                    return;
                }
                None => {
                    balance = Decimal::MIN;
                    break;
                }
            }
        }

        self.balance = HurdleBalance::Outstanding(balance);
    }

    /// LP received cash
    pub fn record_distribution(&mut self, lp_amount: Decimal) {
        if let HurdleBalance::Outstanding(balance) = self.balance {
            let next = balance.checked_sub(lp_amount).unwrap_or(Decimal::MIN);
            self.balance = HurdleBalance::Outstanding(settle(next));
        }
    }

    /// LP funded a capital call
    pub fn record_contribution(&mut self, lp_amount: Decimal) {
        if let HurdleBalance::Outstanding(balance) = self.balance {
            self.balance = match balance.checked_add(lp_amount) {
                Some(next) => HurdleBalance::Outstanding(next),
                None => HurdleBalance::Unbounded,
            };
        }
    }

    pub fn is_satisfied(&self) -> bool {
        match self.balance {
            HurdleBalance::Outstanding(balance) => balance <= HURDLE_TOLERANCE,
            HurdleBalance::Unbounded => false,
        }
    }

    pub fn balance(&self) -> HurdleBalance {
        self.balance
    }

    /// Cash the LP must still receive to meet the hurdle; None if unreachable
    pub fn lp_shortfall(&self) -> Option<Decimal> {
        match self.balance {
            HurdleBalance::Outstanding(balance) => Some(balance.max(Decimal::ZERO)),
            HurdleBalance::Unbounded => None,
        }
    }
}

/// Snap a balance inside the tolerance band to zero so a met hurdle cannot
/// reopen just from compounding leftover fractions of a cent
fn settle(balance: Decimal) -> Decimal {
    if balance > Decimal::ZERO && balance <= HURDLE_TOLERANCE {
        Decimal::ZERO
    } else {
        balance
    }
}

/// State carried from one projection year to the next
#[derive(Debug, Clone)]
pub struct WaterfallState {
    /// Years since close of the last processed year
    pub period: usize,

    pub hurdle_accounts: Vec<HurdleAccount>,

    /// Capital put in so far, initial plus calls
    pub gp_contributed: Decimal,
    pub lp_contributed: Decimal,

    pub cumulative_gp: Decimal,
    pub cumulative_lp: Decimal,
    pub cumulative_total: Decimal,
}

impl WaterfallState {
    /// Initialize state at close
    pub fn new(structure: &PromoteStructure, capital: &InvestedCapital) -> Self {
        Self {
            period: 0,
            hurdle_accounts: structure
                .tiers
                .iter()
                .map(|tier| HurdleAccount::open(tier, capital.lp))
                .collect(),
            gp_contributed: capital.gp,
            lp_contributed: capital.lp,
            cumulative_gp: Decimal::ZERO,
            cumulative_lp: Decimal::ZERO,
            cumulative_total: Decimal::ZERO,
        }
    }

    /// Move forward to a later period, compounding every hurdle account
    pub fn advance_to(&mut self, period: usize) {
        let years = period.saturating_sub(self.period);
        for account in &mut self.hurdle_accounts {
            account.accrue(years);
        }
        self.period = period;
    }

    /// Index of the lowest tier whose hurdle the LP has not yet met
    pub fn first_unsatisfied_tier(&self) -> Option<usize> {
        self.hurdle_accounts.iter().position(|a| !a.is_satisfied())
    }

    pub fn record_lp_distribution(&mut self, lp_amount: Decimal) {
        for account in &mut self.hurdle_accounts {
            account.record_distribution(lp_amount);
        }
    }

    pub fn record_capital_call(&mut self, gp_amount: Decimal, lp_amount: Decimal) {
        self.gp_contributed += gp_amount;
        self.lp_contributed += lp_amount;
        for account in &mut self.hurdle_accounts {
            account.record_contribution(lp_amount);
        }
    }

    /// Roll the cumulative totals forward by one year's split
    pub fn record_year(&mut self, gp_amount: Decimal, lp_amount: Decimal) {
        self.cumulative_gp += gp_amount;
        self.cumulative_lp += lp_amount;
        self.cumulative_total += gp_amount + lp_amount;
    }

    /// GP share of capital contributed so far, if anyone has contributed
    pub fn gp_capital_share(&self) -> Option<Decimal> {
        let total = self.gp_contributed + self.lp_contributed;
        if total.is_zero() {
            None
        } else {
            Some(self.gp_contributed / total)
        }
    }
}
