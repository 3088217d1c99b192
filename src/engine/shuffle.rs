use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of orderings for every shuffle the quiz performs.
///
/// `permute` receives the identity order `0..len` and rearranges it in place.
/// Implementations must keep it a permutation.
pub trait Shuffler {
    fn permute(&mut self, order: &mut [usize]);
}

/// Reorder `items` with a permutation drawn from `shuffler`.
pub fn shuffled<T>(shuffler: &mut dyn Shuffler, items: Vec<T>) -> Vec<T> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    shuffler.permute(&mut order);
    debug_assert!({
        let mut check = order.clone();
        check.sort_unstable();
        check.iter().copied().eq(0..items.len())
    });

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect()
}

/// Uniform random permutations.
pub struct RngShuffler<R: Rng> {
    rng: R,
}

impl<R: Rng> RngShuffler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngShuffler<SmallRng> {
    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Shuffler for RngShuffler<R> {
    fn permute(&mut self, order: &mut [usize]) {
        order.shuffle(&mut self.rng);
    }
}

/// Leaves every ordering as given.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepOrder;

impl Shuffler for KeepOrder {
    fn permute(&mut self, _order: &mut [usize]) {}
}
