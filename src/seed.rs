//! Sources of fresh generator seeds.

use crate::types::Seed;

/// Produces fresh seeds for new mazes.
///
/// Called only for an explicit "new seed" action or when a fragment carries no
/// usable seed.
pub trait SeedSource {
    /// Returns a new seed. Successive calls are expected to differ.
    fn fresh_seed(&mut self) -> Seed;
}

/// Seeds drawn from the operating system's random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSeeds;

impl SeedSource for RandomSeeds {
    fn fresh_seed(&mut self) -> Seed {
        match getrandom::u64() {
            Ok(value) => Seed(value),
            Err(err) => {
                log::warn!("random source unavailable ({err}); deriving seed from the clock");
                Seed(clock_seed())
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
fn clock_seed() -> u64 {
    // Date.now() is milliseconds; Math.random() fills the low bits.
    let millis = js_sys::Date::now() as u64;
    let noise = (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    (millis << 20) ^ noise
}

/// Deterministic seeds counting up from a starting value.
///
/// Useful for reproducible exports and for tests.
#[derive(Debug, Clone)]
pub struct SequenceSeeds {
    next: u64,
}

impl SequenceSeeds {
    /// Starts the sequence at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }
}

impl SeedSource for SequenceSeeds {
    fn fresh_seed(&mut self) -> Seed {
        let seed = Seed(self.next);
        self.next = self.next.wrapping_add(1);
        seed
    }
}

impl<S: SeedSource + ?Sized> SeedSource for &mut S {
    fn fresh_seed(&mut self) -> Seed {
        (**self).fresh_seed()
    }
}
