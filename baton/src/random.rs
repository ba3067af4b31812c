use rand::{Rng, SeedableRng, distr::Uniform};
use rand_distr::{Bernoulli, Normal};

use crate::Jiffies;

pub type Seed = u64;

#[derive(Copy, Clone, Debug)]
pub enum Distributions {
    Constant(Jiffies),
    Uniform(Jiffies, Jiffies),
    Bernoulli(f64, Jiffies),
    Normal(Jiffies, Jiffies),
}

pub(crate) struct Randomizer {
    rnd: rand::rngs::StdRng,
}

impl Randomizer {
    pub(crate) fn new(seed: Seed) -> Self {
        Self {
            rnd: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn sample(&mut self, d: Distributions) -> Jiffies {
        match d {
            Distributions::Constant(value) => value,
            Distributions::Uniform(Jiffies(from), Jiffies(to)) => {
                let distr = Uniform::new_inclusive(from, to).expect("Invalid bounds");
                Jiffies(self.rnd.sample(distr))
            }
            Distributions::Bernoulli(p, Jiffies(val)) => {
                let distr = Bernoulli::new(p).expect("Invalid probability");
                Jiffies(if self.rnd.sample(distr) { val } else { 0 })
            }
            Distributions::Normal(Jiffies(mean), Jiffies(std_dev)) => {
                let distr = Normal::new(mean as f64, std_dev as f64).expect("Invalid parameters");
                Jiffies(self.rnd.sample(distr).max(0.0).round() as usize)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_samples() {
        let mut a = Randomizer::new(42);
        let mut b = Randomizer::new(42);
        let d = Distributions::Uniform(Jiffies(0), Jiffies(1_000));
        for _ in 0..100 {
            assert_eq!(a.sample(d), b.sample(d));
        }
    }

    #[test]
    fn samples_stay_in_range() {
        let mut r = Randomizer::new(7);
        for _ in 0..1_000 {
            let j = r.sample(Distributions::Uniform(Jiffies(5), Jiffies(9)));
            assert!(Jiffies(5) <= j && j <= Jiffies(9));
            assert!(r.sample(Distributions::Normal(Jiffies(0), Jiffies(10))) >= Jiffies(0));
        }
        assert_eq!(r.sample(Distributions::Constant(Jiffies(3))), Jiffies(3));
    }
}
