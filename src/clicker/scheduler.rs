//! Passive production.
//!
//! The aggregate rate is rebuilt from the catalog whenever a purchase or a
//! multiplier change happens, never adjusted incrementally. Ticks have a
//! fixed length; a host that suspends the page loses production for the
//! suspended time beyond the clock's clamp (see `time::GameTime`).

use super::state::{Ledger, Producer};

/// `Σ owned * base_rate * multiplier`, in currency per second.
pub fn aggregate_rate(producers: &[Producer], multiplier: f64) -> f64 {
    producers.iter().map(Producer::rate).sum::<f64>() * multiplier
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductionScheduler {
    rate: f64,
    tick_fraction: f64,
}

impl ProductionScheduler {
    pub fn new(tick_interval_ms: u32) -> Self {
        Self {
            rate: 0.0,
            tick_fraction: tick_interval_ms as f64 / 1000.0,
        }
    }

    /// Rebuild the cached rate from scratch.
    pub fn recompute(&mut self, producers: &[Producer], multiplier: f64) {
        self.rate = aggregate_rate(producers, multiplier);
    }

    /// Currency per second at the last recompute.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Credit `delta_ticks` ticks of production. Returns the amount added.
    pub fn tick(&self, ledger: &mut Ledger, delta_ticks: u32) -> f64 {
        if delta_ticks == 0 {
            return 0.0;
        }
        let produced = self.rate * self.tick_fraction * delta_ticks as f64;
        ledger.add_currency(produced);
        produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clicker::config::ProducerType;

    fn producers(counts: &[u32]) -> Vec<Producer> {
        let kinds = [
            ProducerType::new("cursor", "Cursor", 15.0, 0.1),
            ProducerType::new("grandma", "Grandma", 100.0, 1.0),
            ProducerType::new("farm", "Farm", 1_100.0, 8.0),
        ];
        kinds
            .iter()
            .zip(counts)
            .map(|(k, &n)| Producer {
                kind: k.clone(),
                owned: n,
            })
            .collect()
    }

    #[test]
    fn aggregate_rate_closed_form() {
        let ps = producers(&[10, 3, 2]);
        let expected = (10.0 * 0.1 + 3.0 * 1.0 + 2.0 * 8.0) * 1.5;
        assert!((aggregate_rate(&ps, 1.5) - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_catalog_produces_nothing() {
        let mut sched = ProductionScheduler::new(100);
        sched.recompute(&producers(&[0, 0, 0]), 4.0);
        let mut ledger = Ledger::new();
        assert_eq!(sched.tick(&mut ledger, 100), 0.0);
        assert_eq!(ledger.balance(), 0.0);
    }

    #[test]
    fn tick_scales_by_fraction() {
        let mut sched = ProductionScheduler::new(100);
        sched.recompute(&producers(&[10, 0, 0]), 1.0); // 1.0/s
        let mut ledger = Ledger::new();
        sched.tick(&mut ledger, 10);
        assert!((ledger.balance() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn one_second_ticks() {
        let mut sched = ProductionScheduler::new(1000);
        sched.recompute(&producers(&[0, 2, 0]), 1.0);
        let mut ledger = Ledger::new();
        sched.tick(&mut ledger, 1);
        assert!((ledger.balance() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn tick_zero_does_nothing() {
        let mut sched = ProductionScheduler::new(100);
        sched.recompute(&producers(&[5, 5, 5]), 1.0);
        let mut ledger = Ledger::new();
        sched.tick(&mut ledger, 0);
        assert_eq!(ledger, Ledger::new());
    }

    #[test]
    fn no_drift_after_ten_thousand_ticks() {
        let ps = producers(&[7, 3, 1]);
        let mut sched = ProductionScheduler::new(100);
        sched.recompute(&ps, 2.0);
        let mut ledger = Ledger::new();
        for _ in 0..10_000 {
            sched.tick(&mut ledger, 1);
            assert_eq!(sched.rate(), aggregate_rate(&ps, 2.0));
        }
        let expected = aggregate_rate(&ps, 2.0) * 0.1 * 10_000.0;
        let rel = (ledger.balance() - expected).abs() / expected;
        assert!(rel < 1e-9, "relative drift {rel}");
    }
}
