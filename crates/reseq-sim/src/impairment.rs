//! Deterministic in-process impairment.
//!
//! Turns an in-order packet list into an arrival schedule the way a lossy,
//! reordering network would: shuffled arrival order, duplicated packets, and
//! packets that only show up after a retransmission timeout. The same seed
//! always yields the same schedule.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::RngExt as _;
use rand::SeedableRng;
use serde::Deserialize;

use crate::scenario::Step;

/// Impairment parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImpairmentConfig {
    pub seed: u64,
    /// Deliver packets in a random order instead of sequence order.
    pub shuffle: bool,
    /// Chance (0-100) that a delivered packet arrives a second time later on.
    pub duplicate_percent: f32,
    /// Chance (0-100) that a packet is lost on first transmission and only
    /// arrives after a timeout.
    pub holdback_percent: f32,
}

impl Default for ImpairmentConfig {
    fn default() -> Self {
        ImpairmentConfig {
            seed: 0,
            shuffle: true,
            duplicate_percent: 0.0,
            holdback_percent: 0.0,
        }
    }
}

impl ImpairmentConfig {
    /// A network that delivers everything once, in order.
    pub fn none() -> Self {
        ImpairmentConfig {
            shuffle: false,
            ..Default::default()
        }
    }

    /// Build the arrival schedule for `payloads`, where `payloads[i]` is the
    /// payload of sequence `i`.
    pub fn schedule<S: AsRef<str>>(&self, payloads: &[S]) -> Vec<Step> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let duplicate_p = probability(self.duplicate_percent);
        let holdback_p = probability(self.holdback_percent);

        let mut order: Vec<usize> = (0..payloads.len()).collect();
        if self.shuffle {
            order.shuffle(&mut rng);
        }

        let deliver = |idx: usize| Step::Deliver {
            sequence: idx as i64,
            payload: payloads[idx].as_ref().to_string(),
        };

        let mut first_pass = Vec::with_capacity(order.len());
        let mut held_back = Vec::new();
        for idx in order {
            if rng.random_bool(holdback_p) {
                held_back.push(idx);
            } else {
                first_pass.push(idx);
            }
        }

        let mut steps: Vec<Step> = first_pass.iter().map(|&idx| deliver(idx)).collect();

        // Duplicates land anywhere after their original.
        for (pos, &idx) in first_pass.iter().enumerate().rev() {
            if rng.random_bool(duplicate_p) {
                let at = rng.random_range(pos + 1..=steps.len());
                steps.insert(at, deliver(idx));
            }
        }

        if !held_back.is_empty() {
            steps.push(Step::Timeout);
            steps.extend(held_back.into_iter().map(deliver));
        }

        steps
    }
}

/// Percent to probability. NaN counts as zero.
fn probability(percent: f32) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    (f64::from(percent) / 100.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

    fn delivered(steps: &[Step]) -> Vec<i64> {
        steps
            .iter()
            .filter_map(|s| match s {
                Step::Deliver { sequence, .. } => Some(*sequence),
                Step::Timeout => None,
            })
            .collect()
    }

    #[test]
    fn no_impairment_is_identity() {
        let steps = ImpairmentConfig::none().schedule(&WORDS);
        assert_eq!(delivered(&steps), vec![0, 1, 2, 3, 4, 5]);
        assert!(!steps.contains(&Step::Timeout));
    }

    #[test]
    fn schedule_is_deterministic_for_seed() {
        let cfg = ImpairmentConfig {
            seed: 42,
            shuffle: true,
            duplicate_percent: 30.0,
            holdback_percent: 20.0,
        };
        assert_eq!(cfg.schedule(&WORDS), cfg.schedule(&WORDS));
    }

    #[test]
    fn every_packet_arrives_at_least_once() {
        for seed in 0..32 {
            let cfg = ImpairmentConfig {
                seed,
                shuffle: true,
                duplicate_percent: 50.0,
                holdback_percent: 50.0,
            };
            let mut seen = delivered(&cfg.schedule(&WORDS));
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen, vec![0, 1, 2, 3, 4, 5], "seed {seed}");
        }
    }

    #[test]
    fn full_holdback_puts_everything_after_timeout() {
        let cfg = ImpairmentConfig {
            holdback_percent: 100.0,
            ..ImpairmentConfig::none()
        };
        let steps = cfg.schedule(&WORDS);
        assert_eq!(steps[0], Step::Timeout);
        assert_eq!(delivered(&steps), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn full_duplication_doubles_arrivals() {
        let cfg = ImpairmentConfig {
            duplicate_percent: 100.0,
            ..ImpairmentConfig::none()
        };
        assert_eq!(delivered(&cfg.schedule(&WORDS)).len(), WORDS.len() * 2);
    }

    #[test]
    fn shuffle_permutes_every_sequence() {
        let cfg = ImpairmentConfig {
            seed: 3,
            ..Default::default()
        };
        let mut seen = delivered(&cfg.schedule(&WORDS));
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn out_of_range_percent_is_clamped() {
        assert_eq!(probability(250.0), 1.0);
        assert_eq!(probability(-5.0), 0.0);
        assert_eq!(probability(f32::INFINITY), 1.0);
    }

    #[test]
    fn nan_percent_means_no_impairment() {
        assert_eq!(probability(f32::NAN), 0.0);

        let cfg = ImpairmentConfig {
            duplicate_percent: f32::NAN,
            holdback_percent: f32::NAN,
            ..ImpairmentConfig::none()
        };
        assert_eq!(cfg.schedule(&["a", "b"]), ImpairmentConfig::none().schedule(&["a", "b"]));
    }
}
