use std::num::NonZeroUsize;

use rand::{Rng, seq::index};

use crate::{Result, ServerErr};

/// How many partitions take part in each round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Every partition, every round.
    All,
    /// A fixed amount of partitions sampled each round.
    Count(NonZeroUsize),
    /// `max(floor(fraction × N), 1)` partitions sampled each round.
    Fraction(f64),
}

/// Picks the participants of each round.
///
/// Sampling is uniform without replacement and independent between rounds,
/// except for `Selection::All` which always yields every index.
#[derive(Debug, Clone, Copy)]
pub struct ParticipantSelector {
    selection: Selection,
}

impl ParticipantSelector {
    /// Creates a new `ParticipantSelector`.
    ///
    /// # Returns
    /// An error if the selection can never be satisfied.
    pub fn new(selection: Selection) -> Result<Self> {
        if let Selection::Fraction(frac) = selection {
            if !(frac > 0.0 && frac <= 1.0) {
                return Err(ServerErr::InvalidFraction(frac));
            }
        }

        Ok(Self { selection })
    }

    /// Creates a new `ParticipantSelector` from the raw configuration options.
    ///
    /// `take_all` wins over everything else, then an explicit participant count, then the
    /// fraction.
    ///
    /// # Arguments
    /// * `take_all` - Whether every partition participates.
    /// * `num_participants` - An explicit amount of participants.
    /// * `frac` - The fraction of partitions participating.
    pub fn from_options(take_all: bool, num_participants: Option<usize>, frac: f64) -> Result<Self> {
        let selection = match (take_all, num_participants) {
            (true, _) => Selection::All,
            (false, Some(count)) => {
                Selection::Count(NonZeroUsize::new(count).ok_or(ServerErr::NoParticipants)?)
            }
            (false, None) => Selection::Fraction(frac),
        };

        Self::new(selection)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The amount of participants selected out of `n` partitions.
    ///
    /// # Returns
    /// An error if there are no partitions or fewer than the requested count.
    pub fn amount(&self, n: usize) -> Result<usize> {
        if n == 0 {
            return Err(ServerErr::EmptyPartitionSet);
        }

        match self.selection {
            Selection::All => Ok(n),
            Selection::Count(count) if count.get() > n => Err(ServerErr::TooManyParticipants {
                requested: count.get(),
                available: n,
            }),
            Selection::Count(count) => Ok(count.get()),
            Selection::Fraction(frac) => Ok(((frac * n as f64).floor() as usize).max(1)),
        }
    }

    /// Selects the participants for a round.
    ///
    /// # Arguments
    /// * `n` - The total amount of partitions.
    /// * `rng` - The random number generator used for sampling.
    ///
    /// # Returns
    /// The distinct, sorted indices of the participants in `[0, n)`.
    pub fn select<R: Rng>(&self, n: usize, rng: &mut R) -> Result<Vec<usize>> {
        let m = self.amount(n)?;

        if let Selection::All = self.selection {
            return Ok((0..n).collect());
        }

        let mut indices = index::sample(rng, n, m).into_vec();
        indices.sort_unstable();
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(5)
    }

    #[test]
    fn take_all_ignores_fraction_and_count() {
        let selector = ParticipantSelector::from_options(true, Some(2), 0.1).unwrap();
        assert_eq!(selector.select(5, &mut rng()).unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn fraction_of_partitions() {
        let selector = ParticipantSelector::from_options(false, None, 0.7).unwrap();
        let selected = selector.select(10, &mut rng()).unwrap();

        assert_eq!(selected.len(), 7);
        assert!(selected.iter().all(|&i| i < 10));
        assert_eq!(selected.iter().collect::<HashSet<_>>().len(), 7);
    }

    #[test]
    fn small_fractions_select_at_least_one() {
        let selector = ParticipantSelector::from_options(false, None, 0.01).unwrap();
        assert_eq!(selector.amount(10).unwrap(), 1);
    }

    #[test]
    fn explicit_count() {
        let selector = ParticipantSelector::from_options(false, Some(3), 0.7).unwrap();
        let selected = selector.select(10, &mut rng()).unwrap();

        assert_eq!(selected.len(), 3);
        assert_eq!(selected.iter().collect::<HashSet<_>>().len(), 3);
    }

    #[test]
    fn count_larger_than_partitions_fails() {
        let selector = ParticipantSelector::from_options(false, Some(20), 0.7).unwrap();
        let err = selector.select(10, &mut rng()).unwrap_err();

        assert!(matches!(
            err,
            ServerErr::TooManyParticipants {
                requested: 20,
                available: 10
            }
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn invalid_options_fail() {
        assert!(matches!(
            ParticipantSelector::from_options(false, Some(0), 0.7),
            Err(ServerErr::NoParticipants)
        ));
        assert!(matches!(
            ParticipantSelector::from_options(false, None, 0.0),
            Err(ServerErr::InvalidFraction(_))
        ));
        assert!(matches!(
            ParticipantSelector::from_options(false, None, 1.5),
            Err(ServerErr::InvalidFraction(_))
        ));
    }

    #[test]
    fn no_partitions_fails() {
        let selector = ParticipantSelector::new(Selection::All).unwrap();
        assert!(matches!(
            selector.select(0, &mut rng()),
            Err(ServerErr::EmptyPartitionSet)
        ));
    }

    #[test]
    fn rounds_resample_independently() {
        let selector = ParticipantSelector::new(Selection::Fraction(0.5)).unwrap();
        let mut rng = rng();

        let draws: HashSet<Vec<usize>> = (0..20)
            .map(|_| selector.select(20, &mut rng).unwrap())
            .collect();
        assert!(draws.len() > 1);
    }
}
