//! Village summon cooldowns for the bell-rung merchant.

use log::{debug, info};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;

use super::types::{BlockPos, Tick, VillageId};

pub const TICKS_PER_SECOND: Tick = 20;
pub const TICKS_PER_MINUTE: Tick = 1_200;
pub const TICKS_PER_DAY: Tick = 24_000;

/// Blocks per chunk; spawn offsets are whole chunks.
pub const CHUNK_SIZE: i32 = 16;
const MIN_DISTANCE_CHUNKS: i32 = 2;
const CHUNK_RADIUS: i32 = 3;

pub const SUMMONED_MESSAGE: &str = "Wandering Trader is on his way";

/// Time left on a village cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownRemaining {
    pub ticks: Tick,
}

impl CooldownRemaining {
    /// Rounded amount and unit: days above one day, minutes above one
    /// minute, seconds otherwise.
    pub fn bucketed(&self) -> (i64, &'static str) {
        let (divisor, unit) = if self.ticks > TICKS_PER_DAY {
            (TICKS_PER_DAY, "day")
        } else if self.ticks > TICKS_PER_MINUTE {
            (TICKS_PER_MINUTE, "minute")
        } else {
            (TICKS_PER_SECOND, "second")
        };
        (round_half_up(self.ticks, divisor), unit)
    }

    pub fn message(&self) -> String {
        format!(
            "There aren't any new traders nearby, come back in {}",
            self
        )
    }
}

impl fmt::Display for CooldownRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (amount, unit) = self.bucketed();
        let plural = if amount == 1 { "" } else { "s" };
        write!(f, "{} {}{}", amount, unit, plural)
    }
}

fn round_half_up(value: Tick, divisor: Tick) -> i64 {
    let rounds_up = value.rem_euclid(divisor) >= divisor - divisor / 2;
    value.div_euclid(divisor) + i64::from(rounds_up)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummonOutcome {
    /// Cooldown recorded; spawn the merchant at `at` and send it towards the bell.
    Spawn { at: BlockPos },
    Denied(CooldownRemaining),
    /// Summoning is switched off in the configuration.
    Disabled,
}

/// Last successful summon per village. Held in memory only.
#[derive(Debug, Default)]
pub struct SummonCooldowns {
    last_summon: HashMap<VillageId, Tick>,
}

impl SummonCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_summon(&self, village: VillageId) -> Option<Tick> {
        self.last_summon.get(&village).copied()
    }

    /// Gate a summon for `village`. On approval the cooldown restarts at `now`
    /// and the spawn point is a random whole-chunk offset from `bell`.
    pub fn try_summon<R: Rng>(
        &mut self,
        rng: &mut R,
        village: VillageId,
        bell: BlockPos,
        now: Tick,
        cooldown: Tick,
    ) -> SummonOutcome {
        if let Some(last) = self.last_summon(village) {
            if now < last.saturating_add(cooldown) {
                let remaining = CooldownRemaining {
                    ticks: cooldown.saturating_sub(now.saturating_sub(last)),
                };
                debug!("Summon for village {} denied, {} left", village, remaining);
                return SummonOutcome::Denied(remaining);
            }
        }

        self.last_summon.insert(village, now);
        let at = spawn_point(rng, bell);
        info!(
            "Summoning merchant for village {} at ({}, {})",
            village, at.x, at.z
        );
        SummonOutcome::Spawn { at }
    }
}

/// Offset `bell` by between -2 and +4 chunks on each horizontal axis.
pub fn spawn_point<R: Rng>(rng: &mut R, bell: BlockPos) -> BlockPos {
    let span = 2 * MIN_DISTANCE_CHUNKS + CHUNK_RADIUS;
    let mut offset = || (rng.gen_range(0..span) - MIN_DISTANCE_CHUNKS) * CHUNK_SIZE;
    let dx = offset();
    let dz = offset();
    bell.offset(dx, dz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn remaining(ticks: Tick) -> String {
        CooldownRemaining { ticks }.to_string()
    }

    #[test]
    fn second_summon_inside_cooldown_is_denied() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut cooldowns = SummonCooldowns::new();
        let bell = BlockPos::new(100, 64, -40);

        assert!(matches!(
            cooldowns.try_summon(&mut rng, 1, bell, 0, 96_000),
            SummonOutcome::Spawn { .. }
        ));
        match cooldowns.try_summon(&mut rng, 1, bell, 50_000, 96_000) {
            SummonOutcome::Denied(left) => {
                assert_eq!(left.ticks, 46_000);
                assert_eq!(left.to_string(), "2 days");
            }
            other => panic!("expected denial, got {:?}", other),
        }
        assert_eq!(cooldowns.last_summon(1), Some(0));
    }

    #[test]
    fn summon_after_cooldown_resets_timer() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut cooldowns = SummonCooldowns::new();
        let bell = BlockPos::new(0, 70, 0);
        cooldowns.try_summon(&mut rng, 9, bell, 0, 1_000);
        assert!(matches!(
            cooldowns.try_summon(&mut rng, 9, bell, 1_000, 1_000),
            SummonOutcome::Spawn { .. }
        ));
        assert_eq!(cooldowns.last_summon(9), Some(1_000));
        assert!(matches!(
            cooldowns.try_summon(&mut rng, 9, bell, 1_500, 1_000),
            SummonOutcome::Denied(_)
        ));
    }

    #[test]
    fn villages_are_independent() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut cooldowns = SummonCooldowns::new();
        let bell = BlockPos::new(0, 70, 0);
        cooldowns.try_summon(&mut rng, 1, bell, 0, 96_000);
        assert!(matches!(
            cooldowns.try_summon(&mut rng, 2, bell, 10, 96_000),
            SummonOutcome::Spawn { .. }
        ));
    }

    #[test]
    fn maximum_cooldown_denies_without_overflow() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut cooldowns = SummonCooldowns::new();
        let bell = BlockPos::new(0, 70, 0);
        cooldowns.try_summon(&mut rng, 4, bell, 0, i64::MAX);
        match cooldowns.try_summon(&mut rng, 4, bell, 1, i64::MAX) {
            SummonOutcome::Denied(left) => {
                assert_eq!(left.ticks, i64::MAX - 1);
                let (days, unit) = left.bucketed();
                assert_eq!(unit, "day");
                assert_eq!(days, (i64::MAX - 1) / TICKS_PER_DAY);
            }
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[test]
    fn remaining_time_buckets() {
        assert_eq!(remaining(46_000), "2 days");
        assert_eq!(remaining(30_000), "1 day");
        assert_eq!(remaining(24_000), "20 minutes");
        assert_eq!(remaining(1_800), "2 minutes");
        assert_eq!(remaining(1_200), "60 seconds");
        assert_eq!(remaining(20), "1 second");
        assert_eq!(remaining(5), "0 seconds");
    }

    #[test]
    fn denial_message_text() {
        let left = CooldownRemaining { ticks: 46_000 };
        assert_eq!(
            left.message(),
            "There aren't any new traders nearby, come back in 2 days"
        );
    }

    #[test]
    fn spawn_offsets_are_whole_chunks_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let bell = BlockPos::new(10, 64, 20);
        for _ in 0..200 {
            let at = spawn_point(&mut rng, bell);
            let (dx, dz) = (at.x - bell.x, at.z - bell.z);
            assert_eq!(dx % CHUNK_SIZE, 0);
            assert_eq!(dz % CHUNK_SIZE, 0);
            assert!((-32..=64).contains(&dx));
            assert!((-32..=64).contains(&dz));
            assert_eq!(at.y, bell.y);
        }
    }
}
