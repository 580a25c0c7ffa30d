//! Weighted round scheduler.
//!
//! A round is built in two steps:
//!
//! 1. `slots_per_round` slots are apportioned across awake engines by the
//!    largest-remainder method on weight (ties go to the engine registered
//!    first). Every awake engine gets at least one slot.
//! 2. Slots are interleaved with smooth weighted round robin, so a heavy
//!    engine's turns are spread through the round instead of clustered.
//!
//! The result depends only on registration order, weights and the sleep
//! set; there is no cursor carried between calls.

use std::cmp::Ordering;

use conductor_core::config::DEFAULT_SLOTS_PER_ROUND;
use conductor_core::{Error, Result};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    weight: f64,
    sleeping: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    entries: Vec<Entry>,
    slots_per_round: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SLOTS_PER_ROUND)
    }
}

impl Scheduler {
    pub fn new(slots_per_round: usize) -> Self {
        Self {
            entries: Vec::new(),
            slots_per_round: slots_per_round.max(1),
        }
    }

    pub fn slots_per_round(&self) -> usize {
        self.slots_per_round
    }

    pub fn register(&mut self, name: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::Config(format!(
                "engine {} has invalid weight {}",
                name, weight
            )));
        }
        if self.position(name).is_some() {
            return Err(Error::DuplicateEngine(name.to_string()));
        }
        self.entries.push(Entry {
            name: name.to_string(),
            weight,
            sleeping: false,
        });
        Ok(())
    }

    /// Build the next round: awake engine names, possibly repeated, in run
    /// order.
    pub fn schedule(&self) -> Vec<String> {
        let awake: Vec<&Entry> = self.entries.iter().filter(|e| !e.sleeping).collect();
        if awake.is_empty() {
            return Vec::new();
        }

        let weights: Vec<f64> = awake.iter().map(|e| e.weight).collect();
        let slots = apportion(&weights, self.slots_per_round);
        let round: Vec<String> = interleave(&slots)
            .into_iter()
            .map(|i| awake[i].name.clone())
            .collect();

        debug!(awake = awake.len(), slots = round.len(), "Round scheduled");
        round
    }

    /// Exclude an engine from rounds built after this call.
    pub fn sleep(&mut self, name: &str) -> Result<()> {
        self.entry_mut(name)?.sleeping = true;
        debug!(engine = name, "Engine asleep");
        Ok(())
    }

    /// Re-include an engine in rounds built after this call.
    pub fn wake(&mut self, name: &str) -> Result<()> {
        self.entry_mut(name)?.sleeping = false;
        debug!(engine = name, "Engine awake");
        Ok(())
    }

    pub fn is_sleeping(&self, name: &str) -> Result<bool> {
        self.entry(name).map(|e| e.sleeping)
    }

    pub fn weight(&self, name: &str) -> Result<f64> {
        self.entry(name).map(|e| e.weight)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Names of engines that are not asleep, in registration order.
    pub fn awake(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.sleeping)
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    fn entry(&self, name: &str) -> Result<&Entry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::UnknownEngine(name.to_string()))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::UnknownEngine(name.to_string()))
    }
}

/// Largest-remainder apportionment of `total` slots by weight.
///
/// Remainder ties go to the lower index. Every weight receives at least one
/// slot, so the sum can exceed `total`. All-zero weights give one slot each.
pub fn apportion(weights: &[f64], total: usize) -> Vec<usize> {
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return vec![1; weights.len()];
    }

    let quotas: Vec<f64> = weights
        .iter()
        .map(|w| w / sum * total as f64)
        .collect();
    let mut slots: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
    let assigned: usize = slots.iter().sum();

    let mut by_remainder: Vec<usize> = (0..weights.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal).then(a.cmp(&b))
    });
    for &i in by_remainder.iter().take(total.saturating_sub(assigned)) {
        slots[i] += 1;
    }

    for s in &mut slots {
        if *s == 0 {
            *s = 1;
        }
    }
    slots
}

/// Smooth weighted round robin over slot counts; yields indices.
fn interleave(slots: &[usize]) -> Vec<usize> {
    let total: usize = slots.iter().sum();
    let mut credit = vec![0i64; slots.len()];
    let mut order = Vec::with_capacity(total);

    for _ in 0..total {
        for (c, &s) in credit.iter_mut().zip(slots) {
            *c += s as i64;
        }
        let mut best = 0;
        for i in 1..credit.len() {
            if credit[i] > credit[best] {
                best = i;
            }
        }
        credit[best] -= total as i64;
        order.push(best);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(round: &[String], name: &str) -> usize {
        round.iter().filter(|n| *n == name).count()
    }

    fn two_engines() -> Scheduler {
        let mut sched = Scheduler::default();
        sched.register("e1", 70.0).unwrap();
        sched.register("e2", 30.0).unwrap();
        sched
    }

    #[test]
    fn test_apportion_exact_shares() {
        assert_eq!(apportion(&[70.0, 30.0], 10), vec![7, 3]);
        assert_eq!(apportion(&[50.0, 50.0], 10), vec![5, 5]);
    }

    #[test]
    fn test_apportion_largest_remainder() {
        // Quotas 3.33.., 3.33.., 3.33..: the one spare slot goes to index 0.
        assert_eq!(apportion(&[1.0, 1.0, 1.0], 10), vec![4, 3, 3]);
        // Quotas 6.5, 2.5, 1.0: tie on remainder resolved by index.
        assert_eq!(apportion(&[65.0, 25.0, 10.0], 10), vec![7, 2, 1]);
    }

    #[test]
    fn test_apportion_minimum_one_slot() {
        assert_eq!(apportion(&[99.0, 1.0], 10), vec![10, 1]);
        assert_eq!(apportion(&[0.0, 0.0], 10), vec![1, 1]);
        assert_eq!(apportion(&[50.0, 0.0], 10), vec![10, 1]);
    }

    #[test]
    fn test_round_respects_weights() {
        let round = two_engines().schedule();
        assert_eq!(round.len(), 10);
        assert_eq!(count(&round, "e1"), 7);
        assert_eq!(count(&round, "e2"), 3);
    }

    #[test]
    fn test_round_is_interleaved() {
        let round = two_engines().schedule();
        assert_eq!(round[0], "e1");
        // e2's three turns are spread out rather than bunched at the end.
        let positions: Vec<usize> = round
            .iter()
            .enumerate()
            .filter(|(_, n)| *n == "e2")
            .map(|(i, _)| i)
            .collect();
        assert!(positions.windows(2).all(|w| w[1] - w[0] > 1));
    }

    #[test]
    fn test_schedule_is_deterministic() {
        let sched = two_engines();
        let first = sched.schedule();
        for _ in 0..5 {
            assert_eq!(sched.schedule(), first);
        }
        assert_eq!(two_engines().schedule(), first);
    }

    #[test]
    fn test_sleep_excludes_until_wake() {
        let mut sched = two_engines();
        sched.sleep("e2").unwrap();
        for _ in 0..3 {
            let round = sched.schedule();
            assert!(!round.iter().any(|n| n == "e2"));
            assert!(!round.is_empty());
        }
        assert!(sched.is_sleeping("e2").unwrap());

        sched.wake("e2").unwrap();
        assert!(sched.schedule().iter().any(|n| n == "e2"));
    }

    #[test]
    fn test_sole_awake_engine_fills_round() {
        let mut sched = two_engines();
        sched.sleep("e1").unwrap();
        let round = sched.schedule();
        assert_eq!(round.len(), 10);
        assert!(round.iter().all(|n| n == "e2"));
    }

    #[test]
    fn test_all_asleep_gives_empty_round() {
        let mut sched = two_engines();
        sched.sleep("e1").unwrap();
        sched.sleep("e2").unwrap();
        assert!(sched.schedule().is_empty());
        assert!(sched.awake().is_empty());
    }

    #[test]
    fn test_duplicate_and_unknown() {
        let mut sched = two_engines();
        assert!(matches!(
            sched.register("e1", 5.0),
            Err(Error::DuplicateEngine(_))
        ));
        assert!(matches!(sched.sleep("nope"), Err(Error::UnknownEngine(_))));
        assert!(matches!(sched.wake("nope"), Err(Error::UnknownEngine(_))));
        assert!(sched.weight("nope").is_err());
    }

    #[test]
    fn test_names_in_registration_order() {
        let sched = two_engines();
        assert_eq!(sched.names(), vec!["e1", "e2"]);
        assert_eq!(sched.len(), 2);
        assert_eq!(sched.weight("e2").unwrap(), 30.0);
    }
}
