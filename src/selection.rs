use crate::error::WalletError;
use crate::model::Coin;
use itertools::Itertools;
use std::cmp::Reverse;

/// An exact-sum subset of a wallet's coins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub coins: Vec<Coin>,
    pub total: u64,
}

/// Greedy largest-first coin selection.
///
/// Walks coin instances by descending amount and takes every coin that
/// still fits under the target. No backtracking: with the 1/2/5 series
/// this hits any reachable amount, and anything else is reported as
/// unreachable rather than searched for combinatorially.
pub fn select_coins(inventory: &[Coin], target: u64) -> Result<Selection, WalletError> {
    if target == 0 {
        return Err(WalletError::UnreachableAmount { requested: 0 });
    }

    let mut total = 0u64;
    let mut coins = Vec::new();
    for coin in inventory
        .iter()
        .sorted_by_key(|coin| Reverse(coin.amount()))
    {
        if total >= target {
            break;
        }
        let amount = coin.amount();
        if total + amount <= target {
            coins.push(coin.clone());
            total += amount;
        }
    }

    if total != target {
        return Err(WalletError::UnreachableAmount { requested: target });
    }
    Ok(Selection { coins, total })
}
