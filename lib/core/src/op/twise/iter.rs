//! Lazy enumeration of `t`-subsets of `0..n` via the combinatorial number system.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snafu::{OptionExt, Snafu};

#[derive(Debug, Snafu)]
pub enum CombinationError {
    #[snafu(display("C({}, {}) does not fit into 64 bits", n, t))]
    TooManyCombinations { n: usize, t: usize },
}

/// Binomial coefficient `C(n, k)`, or `None` on overflow.
pub fn binomial(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        // Every intermediate value is C(n, i + 1), bounded by the final one.
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > u64::MAX as u128 {
            return None;
        }
    }
    Some(result as u64)
}

fn num_combinations(n: usize, t: usize) -> Result<u64, CombinationError> {
    binomial(n as u64, t as u64).context(TooManyCombinationsSnafu { n, t })
}

/// Tuple at position `rank` of the colexicographic order of `t`-subsets.
pub fn unrank(mut rank: u64, t: usize) -> Vec<usize> {
    let mut tuple = vec![0; t];
    for i in (0..t).rev() {
        let k = (i + 1) as u64;
        // Largest c with C(c, k) <= rank, found by doubling and bisection.
        let mut low = i as u64;
        let mut high = low + 1;
        while binomial(high, k).map_or(false, |b| b <= rank) {
            low = high;
            high *= 2;
        }
        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if binomial(mid, k).map_or(false, |b| b <= rank) {
                low = mid;
            } else {
                high = mid;
            }
        }
        // C(low, k) <= rank by construction, so this never underflows.
        rank -= binomial(low, k).unwrap_or(0);
        tuple[i] = low as usize;
    }
    tuple
}

/// All `t`-subsets of `0..n` in colexicographic order.
#[derive(Debug, Clone)]
pub struct CombinationIter {
    n: usize,
    current: Option<Vec<usize>>,
    remaining: u64,
}

impl CombinationIter {
    pub fn new(n: usize, t: usize) -> Result<Self, CombinationError> {
        let total = num_combinations(n, t)?;
        Ok(Self {
            n,
            current: if total > 0 { Some((0..t).collect()) } else { None },
            remaining: total,
        })
    }

    fn advance(&mut self) {
        let n = self.n;
        let Some(tuple) = self.current.as_mut() else {
            return;
        };
        let t = tuple.len();
        for i in 0..t {
            let limit = if i + 1 < t { tuple[i + 1] } else { n };
            if tuple[i] + 1 < limit {
                tuple[i] += 1;
                for (j, x) in tuple[..i].iter_mut().enumerate() {
                    *x = j;
                }
                return;
            }
        }
        self.current = None;
    }
}

impl Iterator for CombinationIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tuple = self.current.clone()?;
        self.remaining -= 1;
        self.advance();
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, usize::try_from(self.remaining).ok())
    }
}

#[derive(Debug, Clone)]
struct Partition {
    offset: u64,
    size: u64,
    mult: u64,
    shift: u64,
}

impl Partition {
    fn new<R: Rng>(offset: u64, size: u64, rng: &mut R) -> Self {
        let (mult, shift) = if size < 2 {
            (1, 0)
        } else {
            let shift = rng.gen_range(0..size);
            let mult = loop {
                let candidate = rng.gen_range(1..size);
                if gcd(candidate, size) == 1 {
                    break candidate;
                }
            };
            (mult, shift)
        };
        Self {
            offset,
            size,
            mult,
            shift,
        }
    }

    /// Bijection of `0..size` onto the ranks of this partition.
    fn rank(&self, index: u64) -> u64 {
        let local = (self.mult as u128 * index as u128 + self.shift as u128) % self.size as u128;
        self.offset + local as u64
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Shuffled enumeration of all `t`-subsets of `0..n`.
///
/// The rank space is cut into [`NUM_PARTITIONS`](Self::NUM_PARTITIONS) contiguous
/// partitions, each visited in a seeded pseudo-random order; the partitions are
/// interleaved round-robin. The iterator state is a single position, so a run can be
/// resumed by rebuilding it with the same seed and calling [`resume`](Self::resume).
#[derive(Debug, Clone)]
pub struct RandomPartitionIter {
    t: usize,
    partitions: Vec<Partition>,
    total: u64,
    position: u64,
}

impl RandomPartitionIter {
    pub const NUM_PARTITIONS: u64 = 4;
    pub const DEFAULT_SEED: u64 = 42;

    pub fn new(n: usize, t: usize) -> Result<Self, CombinationError> {
        Self::with_seed(n, t, Self::DEFAULT_SEED)
    }

    pub fn with_seed(n: usize, t: usize, seed: u64) -> Result<Self, CombinationError> {
        let total = num_combinations(n, t)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let base = total / Self::NUM_PARTITIONS;
        let extra = total % Self::NUM_PARTITIONS;
        let mut offset = 0;
        let partitions = (0..Self::NUM_PARTITIONS)
            .map(|p| {
                let size = base + u64::from(p < extra);
                let partition = Partition::new(offset, size, &mut rng);
                offset += size;
                partition
            })
            .collect();
        Ok(Self {
            t,
            partitions,
            total,
            position: 0,
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of tuples produced so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Continues the enumeration after the first `position` tuples.
    pub fn resume(&mut self, position: u64) {
        self.position = position.min(self.total);
    }
}

impl Iterator for RandomPartitionIter {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.total {
            return None;
        }
        // Partition sizes differ by at most one, larger ones first, so plain
        // division gives the round-robin slot.
        let partition = &self.partitions[(self.position % Self::NUM_PARTITIONS) as usize];
        let index = self.position / Self::NUM_PARTITIONS;
        self.position += 1;
        Some(unrank(partition.rank(index), self.t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.position;
        let remaining = usize::try_from(remaining).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}
