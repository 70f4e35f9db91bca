//! Currency ledger and tick-driven income.

mod grid_income;

pub use grid_income::GridIncome;

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::EconomyConfig;
use crate::error::{Outcome, Rejection};
use crate::events::{Outbox, SimEvent};

const EPS: f64 = 1e-6;

/// Progressive price: `starting_cost * cost_multiplier ^ count`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostCurve {
    pub starting_cost: f64,
    pub cost_multiplier: f64,
}

impl CostCurve {
    pub const FREE: CostCurve = CostCurve {
        starting_cost: 0.0,
        cost_multiplier: 1.0,
    };

    pub fn new(starting_cost: f64, cost_multiplier: f64) -> Self {
        Self {
            starting_cost,
            cost_multiplier,
        }
    }

    pub fn cost_for_next(&self, count: u32) -> f64 {
        let base = self.starting_cost.max(0.0);
        if count == 0 {
            return base;
        }
        let multiplier = self.cost_multiplier.max(0.0);
        if multiplier < EPS {
            return 0.0;
        }
        if (multiplier - 1.0).abs() < EPS {
            return base;
        }
        base * multiplier.powi(count.min(i32::MAX as u32) as i32)
    }
}

impl Default for CostCurve {
    fn default() -> Self {
        Self::FREE
    }
}

/// Anything that pays into the ledger every tick.
pub trait IncomeSource {
    fn income_per_tick(&self) -> f64;
}

/// A source paying a constant amount per tick.
#[derive(Debug, Default)]
pub struct FixedIncome {
    per_tick: Cell<f64>,
}

impl FixedIncome {
    pub fn new(per_tick: f64) -> Self {
        Self {
            per_tick: Cell::new(per_tick),
        }
    }

    pub fn set(&self, per_tick: f64) {
        self.per_tick.set(per_tick);
    }
}

impl IncomeSource for FixedIncome {
    fn income_per_tick(&self) -> f64 {
        self.per_tick.get()
    }
}

/// Credit applied by one [`EconomyLedger::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeTick {
    pub per_tick: f64,
    pub ticks: u64,
    pub credited: f64,
}

pub struct EconomyLedger {
    currency: f64,
    tick_interval: f64,
    timer: f64,
    sources: Vec<Rc<dyn IncomeSource>>,
    expansion: CostCurve,
    next_expansion_cost: f64,
    outbox: Outbox<SimEvent>,
}

impl std::fmt::Debug for EconomyLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EconomyLedger")
            .field("currency", &self.currency)
            .field("tick_interval", &self.tick_interval)
            .field("timer", &self.timer)
            .field("sources", &self.sources.len())
            .field("next_expansion_cost", &self.next_expansion_cost)
            .finish()
    }
}

impl EconomyLedger {
    pub fn new(config: &EconomyConfig) -> Self {
        Self {
            currency: config.starting_currency.max(0.0),
            tick_interval: config.tick_interval,
            timer: 0.0,
            sources: Vec::new(),
            expansion: config.expansion,
            next_expansion_cost: config.expansion.cost_for_next(0),
            outbox: Outbox::default(),
        }
    }

    /// Restores starting conditions: balance, timer and expansion price.
    /// Registered sources are kept.
    pub fn reinitialize(&mut self, config: &EconomyConfig) {
        self.currency = config.starting_currency.max(0.0);
        self.tick_interval = config.tick_interval;
        self.timer = 0.0;
        self.expansion = config.expansion;
        self.next_expansion_cost = config.expansion.cost_for_next(0);
        self.outbox.push(SimEvent::CurrencyChanged {
            balance: self.currency,
        });
    }

    pub fn currency(&self) -> f64 {
        self.currency
    }

    pub fn tick_interval(&self) -> f64 {
        self.tick_interval
    }

    /// Seconds accumulated towards the next tick.
    pub fn carried_time(&self) -> f64 {
        self.timer
    }

    /// Returns `false` when `source` was already registered.
    pub fn register(&mut self, source: Rc<dyn IncomeSource>) -> bool {
        if self.sources.iter().any(|s| same_source(s, &source)) {
            return false;
        }
        self.sources.push(source);
        true
    }

    pub fn unregister(&mut self, source: &Rc<dyn IncomeSource>) -> bool {
        let before = self.sources.len();
        self.sources.retain(|s| !same_source(s, source));
        before != self.sources.len()
    }

    pub fn clear_sources(&mut self) {
        self.sources.clear();
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn income_per_tick(&self) -> f64 {
        self.sources
            .iter()
            .map(|s| s.income_per_tick().max(0.0))
            .sum()
    }

    /// Moves the tick clock forward by `dt` seconds and pays out every whole
    /// tick that elapsed, all at once.
    pub fn advance(&mut self, dt: f64) -> Option<IncomeTick> {
        if self.sources.is_empty() || self.tick_interval <= 0.0 || !dt.is_finite() {
            return None;
        }

        self.timer += dt.max(0.0);
        if self.timer < self.tick_interval {
            return None;
        }

        let whole = (self.timer / self.tick_interval).floor();
        self.timer = (self.timer - whole * self.tick_interval).max(0.0);
        let ticks = whole as u64;

        let per_tick = self.income_per_tick();
        let credited = per_tick * whole;
        if credited > 0.0 {
            self.credit(credited);
        }
        trace!(per_tick, ticks, balance = self.currency, "economy.tick");
        self.outbox.push(SimEvent::IncomeTicked { per_tick, ticks });
        Some(IncomeTick {
            per_tick,
            ticks,
            credited,
        })
    }

    pub fn add_income(&mut self, amount: f64) {
        if amount > 0.0 {
            self.credit(amount);
        }
    }

    pub fn can_afford(&self, cost: f64) -> bool {
        cost <= 0.0 || self.currency >= cost
    }

    /// Debits `cost` or leaves the balance untouched.
    pub fn try_spend(&mut self, cost: f64) -> Outcome<()> {
        if cost <= 0.0 {
            return Ok(());
        }
        if self.currency < cost {
            debug!(cost, balance = self.currency, "economy.spend.rejected");
            return Err(Rejection::InsufficientFunds {
                cost,
                balance: self.currency,
            });
        }
        self.currency -= cost;
        self.outbox.push(SimEvent::CurrencyChanged {
            balance: self.currency,
        });
        Ok(())
    }

    pub fn expansion_curve(&self) -> CostCurve {
        self.expansion
    }

    pub fn next_expansion_cost(&self) -> f64 {
        self.next_expansion_cost
    }

    /// Re-prices the next expansion after the occupied tile count changed.
    pub fn refresh_expansion_cost(&mut self, occupied_count: usize) {
        self.next_expansion_cost = self.expansion.cost_for_next(saturating_u32(occupied_count));
    }

    pub fn expansion_option(&self) -> Outcome<f64> {
        let cost = self.next_expansion_cost;
        if self.can_afford(cost) {
            Ok(cost)
        } else {
            Err(Rejection::InsufficientFunds {
                cost,
                balance: self.currency,
            })
        }
    }

    pub fn try_spend_for_expansion(&mut self) -> Outcome<f64> {
        let cost = self.next_expansion_cost;
        self.try_spend(cost)?;
        Ok(cost)
    }

    pub fn outbox(&mut self) -> &mut Outbox<SimEvent> {
        &mut self.outbox
    }

    fn credit(&mut self, amount: f64) {
        self.currency += amount;
        self.outbox.push(SimEvent::CurrencyChanged {
            balance: self.currency,
        });
    }
}

fn same_source(a: &Rc<dyn IncomeSource>, b: &Rc<dyn IncomeSource>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(starting_currency: f64, tick_interval: f64) -> EconomyLedger {
        EconomyLedger::new(&EconomyConfig {
            starting_currency,
            tick_interval,
            ..EconomyConfig::default()
        })
    }

    #[test]
    fn cost_curve_edge_cases() {
        let curve = CostCurve::new(10.0, 2.0);
        assert_eq!(curve.cost_for_next(0), 10.0);
        assert_eq!(curve.cost_for_next(1), 20.0);
        assert_eq!(curve.cost_for_next(2), 40.0);

        assert_eq!(CostCurve::new(10.0, 0.0).cost_for_next(3), 0.0);
        assert_eq!(CostCurve::new(10.0, 0.0).cost_for_next(0), 10.0);
        assert_eq!(CostCurve::new(10.0, 1.0).cost_for_next(50), 10.0);
        assert_eq!(CostCurve::new(-4.0, 3.0).cost_for_next(0), 0.0);
    }

    #[test]
    fn ticks_credit_whole_intervals_and_carry_the_rest() {
        let mut ledger = ledger(0.0, 1.0);
        ledger.register(Rc::new(FixedIncome::new(2.0)));
        ledger.register(Rc::new(FixedIncome::new(3.0)));

        let tick = ledger.advance(2.5).unwrap();
        assert_eq!(tick.ticks, 2);
        assert_eq!(tick.per_tick, 5.0);
        assert_eq!(ledger.currency(), 10.0);
        assert!((ledger.carried_time() - 0.5).abs() < 1e-9);

        assert!(ledger.advance(0.25).is_none());
        assert_eq!(ledger.advance(0.25).map(|t| t.ticks), Some(1));
        assert_eq!(ledger.currency(), 15.0);
    }

    #[test]
    fn huge_steps_pay_every_tick() {
        let mut ledger = ledger(0.0, 0.5);
        ledger.register(Rc::new(FixedIncome::new(1.0)));

        let tick = ledger.advance(3.0e9).unwrap();
        assert_eq!(tick.ticks, 6_000_000_000);
        assert_eq!(tick.credited, 6.0e9);
        assert_eq!(ledger.currency(), 6.0e9);
        assert_eq!(ledger.carried_time(), 0.0);
    }

    #[test]
    fn negative_sources_are_floored() {
        let mut ledger = ledger(0.0, 1.0);
        ledger.register(Rc::new(FixedIncome::new(-7.0)));
        ledger.register(Rc::new(FixedIncome::new(1.0)));
        assert_eq!(ledger.income_per_tick(), 1.0);
    }

    #[test]
    fn duplicate_registration_is_a_no_op() {
        let mut ledger = ledger(0.0, 1.0);
        let source: Rc<dyn IncomeSource> = Rc::new(FixedIncome::new(2.0));
        assert!(ledger.register(source.clone()));
        assert!(!ledger.register(source.clone()));
        assert_eq!(ledger.income_per_tick(), 2.0);

        assert!(ledger.unregister(&source));
        assert!(!ledger.unregister(&source));
        assert_eq!(ledger.source_count(), 0);
    }

    #[test]
    fn no_sources_means_no_accumulation() {
        let mut ledger = ledger(0.0, 1.0);
        assert!(ledger.advance(5.0).is_none());
        assert_eq!(ledger.carried_time(), 0.0);
    }

    #[test]
    fn spend_is_check_then_debit() {
        let mut ledger = ledger(5.0, 1.0);
        assert!(ledger.try_spend(0.0).is_ok());
        assert!(ledger.try_spend(-3.0).is_ok());
        assert!(ledger.outbox().is_empty());

        assert_eq!(
            ledger.try_spend(6.0),
            Err(Rejection::InsufficientFunds {
                cost: 6.0,
                balance: 5.0
            })
        );
        assert_eq!(ledger.currency(), 5.0);

        assert!(ledger.try_spend(5.0).is_ok());
        assert_eq!(ledger.currency(), 0.0);
        let events: Vec<_> = ledger.outbox().drain().collect();
        assert_eq!(events, vec![SimEvent::CurrencyChanged { balance: 0.0 }]);
    }

    #[test]
    fn expansion_cost_follows_occupied_count() {
        let mut ledger = ledger(100.0, 1.0);
        assert_eq!(ledger.next_expansion_cost(), 1.0);
        ledger.refresh_expansion_cost(1);
        assert_eq!(ledger.next_expansion_cost(), 5.0);
        ledger.refresh_expansion_cost(2);
        assert_eq!(ledger.try_spend_for_expansion(), Ok(25.0));
        assert_eq!(ledger.currency(), 75.0);
    }
}
