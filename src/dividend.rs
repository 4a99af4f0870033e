use crate::denomination::Denomination;
use crate::model::{Amendment, Coin};
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

pub type AmendmentNumber = u64;

/// Outstanding dividend per amendment, ascending amendment number.
/// Amendments with nothing left to claim are absent.
pub type Remainders = BTreeMap<AmendmentNumber, u64>;

/// One row of the mintable-denomination plan: how many coins of this
/// size could be minted in total across all amendments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DenominationCount {
    pub denomination: Denomination,
    pub available: u64,
}

/// Stage A: `dividend - sum(already issued)` per amendment, keeping
/// only positive remainders. Amendments without a dividend are skipped.
pub fn compute_remainders(
    amendments: &[Amendment],
    issued_by_amendment: &HashMap<AmendmentNumber, Vec<Coin>>,
) -> Remainders {
    let mut remainders = BTreeMap::new();
    for amendment in amendments.iter() {
        let dividend = match amendment.dividend {
            Some(dividend) if dividend > 0 => dividend,
            _ => continue,
        };
        let issued: u64 = issued_by_amendment
            .get(&amendment.number)
            .map(|coins| coins.iter().map(Coin::amount).sum())
            .unwrap_or(0);
        if dividend > issued {
            remainders.insert(amendment.number, dividend - issued);
        }
    }
    remainders
}

/// Stage B, planning: the denomination series up to the largest single
/// remainder, with the total mintable count for each size.
pub fn plan_denominations(remainders: &Remainders) -> Vec<DenominationCount> {
    let max_remainder = remainders.values().copied().max().unwrap_or(0);
    Denomination::series_up_to(max_remainder)
        .into_iter()
        .map(|denomination| {
            let amount = denomination.amount();
            DenominationCount {
                denomination,
                available: remainders.values().map(|remainder| remainder / amount).sum(),
            }
        })
        .collect()
}

/// Stage B, allocation: expand the requested per-denomination
/// quantities into per-amendment issuance lists.
///
/// Amendments are served in ascending number order and consume a single
/// shared quantity pool, largest denomination first. A remainder is
/// only ever decremented by coins that fit under it, so it cannot go
/// negative and no amendment is allocated more than its remainder.
pub fn allocate(
    remainders: &Remainders,
    requested: &[(Denomination, u64)],
) -> BTreeMap<AmendmentNumber, Vec<Denomination>> {
    let mut remainders = remainders.clone();
    let mut pool: Vec<(Denomination, u64)> = requested
        .iter()
        .copied()
        .sorted_by_key(|(denomination, _)| Reverse(*denomination))
        .collect();

    let mut issuances = BTreeMap::new();
    for (amendment, remainder) in remainders.iter_mut() {
        let issuance: &mut Vec<Denomination> = issuances.entry(*amendment).or_default();
        for (denomination, quantity) in pool.iter_mut() {
            if *quantity == 0 {
                continue;
            }
            let amount = denomination.amount();
            if amount > *remainder {
                continue;
            }
            let usable = (*remainder / amount).min(*quantity);
            *remainder -= usable * amount;
            *quantity -= usable;
            issuance.extend(std::iter::repeat(*denomination).take(usable as usize));
        }
    }
    issuances
}
