//! Point-like ionization deposits and their lineage.
//!
//! Deposits of one event live in a [`DepoSet`] arena. A deposit may name an
//! earlier stage of the same track segment as its `prior` (for instance the
//! position before a space-charge shift). The prior is an index into the
//! same arena and must already be present when the deposit is pushed, so
//! every prior chain terminates.
//!
//! Once a deposit is named as a prior it stops being a primary: it stays in
//! the arena for lineage lookups but is no longer part of the deposit
//! stream returned by [`DepoSet::primaries`].

use crate::{Error, Point, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point-like charge deposition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Depo {
    /// Time of the deposit.
    pub time: f64,
    /// Position of the deposit.
    pub pos: Point,
    /// Number of ionization electrons (sign follows the producer).
    pub charge: f64,
    /// Deposited energy.
    pub energy: f64,
    /// Gaussian sigma along the drift direction, as a length.
    pub extent_long: f64,
    /// Gaussian sigma transverse to the drift direction.
    pub extent_tran: f64,
    /// Identifier, a track id or an index into the producing collection.
    pub id: i32,
    /// Particle type code.
    pub pdg: i32,
    /// Arena index of the earlier stage of this deposit.
    pub prior: Option<usize>,
}

impl Depo {
    /// Creates a deposit with zero extent, id, energy and no prior.
    pub fn new(time: f64, pos: Point, charge: f64) -> Self {
        Self {
            time,
            pos,
            charge,
            energy: 0.0,
            extent_long: 0.0,
            extent_tran: 0.0,
            id: 0,
            pdg: 0,
            prior: None,
        }
    }

    #[must_use]
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    #[must_use]
    pub fn with_extent(mut self, long: f64, tran: f64) -> Self {
        self.extent_long = long;
        self.extent_tran = tran;
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_pdg(mut self, pdg: i32) -> Self {
        self.pdg = pdg;
        self
    }

    #[must_use]
    pub fn with_prior(mut self, prior: usize) -> Self {
        self.prior = Some(prior);
        self
    }
}

/// Track identity and energy credited to the charge of a deposit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lineage {
    pub track_id: i32,
    pub energy: f64,
}

/// Arena of deposits for one event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepoSet {
    ident: i32,
    depos: Vec<Depo>,
    /// Set for deposits named as another deposit's prior.
    is_prior: Vec<bool>,
    nprimary: usize,
}

impl DepoSet {
    /// Creates an empty set with the given identifier.
    pub fn new(ident: i32) -> Self {
        Self {
            ident,
            ..Self::default()
        }
    }

    pub fn with_capacity(ident: i32, capacity: usize) -> Self {
        Self {
            ident,
            depos: Vec::with_capacity(capacity),
            is_prior: Vec::with_capacity(capacity),
            nprimary: 0,
        }
    }

    pub fn ident(&self) -> i32 {
        self.ident
    }

    /// Number of deposits in the arena, priors included.
    pub fn len(&self) -> usize {
        self.depos.len()
    }

    /// Number of deposits not named as any deposit's prior.
    pub fn num_primaries(&self) -> usize {
        self.nprimary
    }

    /// Arena indices of the primary deposits, in insertion order.
    pub fn primaries(&self) -> impl Iterator<Item = usize> + '_ {
        self.is_prior
            .iter()
            .enumerate()
            .filter_map(|(i, &prior)| (!prior).then_some(i))
    }

    pub fn is_primary(&self, index: usize) -> bool {
        self.is_prior.get(index).is_some_and(|&prior| !prior)
    }

    pub fn is_empty(&self) -> bool {
        self.depos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Depo> {
        self.depos.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Depo> {
        self.depos.iter()
    }

    /// Empties the arena, keeping the identifier.
    pub fn clear(&mut self) {
        self.depos.clear();
        self.is_prior.clear();
        self.nprimary = 0;
    }

    /// Adds a deposit and returns its index.
    ///
    /// Fails if the deposit's prior does not already exist in the arena.
    /// The prior, if any, is demoted from the primaries.
    pub fn push(&mut self, depo: Depo) -> Result<usize> {
        let index = self.depos.len();
        if let Some(prior) = depo.prior {
            if prior >= index {
                return Err(Error::InvalidPrior { index, prior });
            }
            if !self.is_prior[prior] {
                self.is_prior[prior] = true;
                self.nprimary -= 1;
            }
        }
        self.depos.push(depo);
        self.is_prior.push(false);
        self.nprimary += 1;
        Ok(index)
    }

    /// Moves all deposits of `other` to the end of this arena, shifting
    /// their prior links accordingly.
    pub fn append(&mut self, other: DepoSet) {
        let offset = self.depos.len();
        self.depos.extend(other.depos.into_iter().map(|mut d| {
            d.prior = d.prior.map(|p| p + offset);
            d
        }));
        self.is_prior.extend(other.is_prior);
        self.nprimary += other.nprimary;
    }

    /// The deposit immediately preceding `index` in its chain.
    pub fn prior(&self, index: usize) -> Option<&Depo> {
        self.depos.get(index)?.prior.and_then(|p| self.depos.get(p))
    }

    /// Iterates the chain starting at `index`: the deposit itself, then its
    /// prior, then the prior's prior, and so on.
    pub fn chain(&self, index: usize) -> DepoChain<'_> {
        DepoChain {
            set: self,
            next: Some(index),
        }
    }

    /// The oldest ancestor of `index`, which is the deposit itself when it
    /// has no prior.
    pub fn original(&self, index: usize) -> Option<&Depo> {
        self.chain(index).last()
    }

    /// Track id and energy to credit for the deposit at `index`.
    ///
    /// A deposit with a prior is credited to its immediate parent. A
    /// non-zero `nominal_energy` overrides the deposit energies.
    pub fn lineage(&self, index: usize, nominal_energy: f64) -> Option<Lineage> {
        let depo = self.depos.get(index)?;
        let source = self.prior(index).unwrap_or(depo);
        let energy = if nominal_energy == 0.0 {
            source.energy
        } else {
            nominal_energy
        };
        Some(Lineage {
            track_id: source.id,
            energy,
        })
    }
}

impl<'a> IntoIterator for &'a DepoSet {
    type Item = &'a Depo;
    type IntoIter = std::slice::Iter<'a, Depo>;

    fn into_iter(self) -> Self::IntoIter {
        self.depos.iter()
    }
}

/// Iterator over a deposit's prior chain, newest first.
pub struct DepoChain<'a> {
    set: &'a DepoSet,
    next: Option<usize>,
}

impl<'a> Iterator for DepoChain<'a> {
    type Item = &'a Depo;

    fn next(&mut self) -> Option<Self::Item> {
        let depo = self.set.depos.get(self.next?)?;
        self.next = depo.prior;
        Some(depo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chained() -> DepoSet {
        let mut set = DepoSet::new(0);
        let a = set
            .push(Depo::new(0.0, Point::new(1.0, 0.0, 0.0), 10.0).with_id(7).with_energy(2.0))
            .unwrap();
        let b = set
            .push(
                Depo::new(1.0, Point::new(2.0, 0.0, 0.0), 9.0)
                    .with_id(8)
                    .with_energy(1.5)
                    .with_prior(a),
            )
            .unwrap();
        set.push(
            Depo::new(2.0, Point::new(3.0, 0.0, 0.0), 8.0)
                .with_id(9)
                .with_prior(b),
        )
        .unwrap();
        set
    }

    #[test]
    fn test_prior_must_precede() {
        let mut set = DepoSet::new(0);
        let err = set
            .push(Depo::new(0.0, Point::default(), 1.0).with_prior(0))
            .unwrap_err();
        assert_eq!(err, Error::InvalidPrior { index: 0, prior: 0 });
    }

    #[test]
    fn test_chain_and_original() {
        let set = chained();
        let ids: Vec<i32> = set.chain(2).map(|d| d.id).collect();
        assert_eq!(ids, vec![9, 8, 7]);
        assert_eq!(set.original(2).unwrap().id, 7);
        assert_eq!(set.original(0).unwrap().id, 7);
        assert!(set.original(5).is_none());
    }

    #[test]
    fn test_lineage_uses_immediate_parent() {
        let set = chained();
        let l = set.lineage(2, 0.0).unwrap();
        assert_eq!(l.track_id, 8);
        assert!((l.energy - 1.5).abs() < f64::EPSILON);

        let own = set.lineage(0, 0.0).unwrap();
        assert_eq!(own.track_id, 7);
        assert!((own.energy - 2.0).abs() < f64::EPSILON);

        let nominal = set.lineage(2, 0.25).unwrap();
        assert!((nominal.energy - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_append_shifts_priors() {
        let mut set = chained();
        set.append(chained());
        assert_eq!(set.len(), 6);
        assert_eq!(set.get(5).unwrap().prior, Some(4));
        assert_eq!(set.original(5).unwrap().pos, Point::new(1.0, 0.0, 0.0));
        assert_eq!(set.primaries().collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(set.num_primaries(), 2);
    }

    #[test]
    fn test_priors_leave_the_primaries() {
        let set = chained();
        assert_eq!(set.len(), 3);
        assert_eq!(set.num_primaries(), 1);
        assert_eq!(set.primaries().collect::<Vec<_>>(), vec![2]);
        assert!(!set.is_primary(0));
        assert!(set.is_primary(2));
        assert!(!set.is_primary(3));

        // a shared prior is demoted once
        let mut set = DepoSet::new(1);
        let a = set.push(Depo::new(0.0, Point::default(), 1.0)).unwrap();
        set.push(Depo::new(1.0, Point::default(), 1.0).with_prior(a))
            .unwrap();
        set.push(Depo::new(2.0, Point::default(), 1.0).with_prior(a))
            .unwrap();
        assert_eq!(set.num_primaries(), 2);
        assert_eq!(set.primaries().collect::<Vec<_>>(), vec![1, 2]);

        let mut empty = set.clone();
        empty.clear();
        assert_eq!(empty.num_primaries(), 0);
        assert_eq!(empty.primaries().count(), 0);
    }
}
