//! Position valuator: turns raw staked and held balances into human-scaled
//! per-wallet totals.

use std::collections::HashMap;

use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

use crate::price::LpRates;

/// Raw staked amounts from a stake record, in integer base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakedAmounts {
    pub pt: u64,
    pub yt: u64,
    pub lp: u64,
}

/// Token class of a held token-account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Principal,
    Yield,
    Liquidity,
}

/// One unscaled credit against a wallet. LP credits carry their PT/YT
/// backing alongside so the accumulators only ever add and scale.
#[derive(Debug, Clone, Copy)]
pub struct Contribution {
    pt: Decimal,
    yt: Decimal,
    lp: Decimal,
    lp_pt: Decimal,
    lp_yt: Decimal,
}

impl Contribution {
    const ZERO: Contribution = Contribution {
        pt: Decimal::ZERO,
        yt: Decimal::ZERO,
        lp: Decimal::ZERO,
        lp_pt: Decimal::ZERO,
        lp_yt: Decimal::ZERO,
    };

    /// Credit from a stake record. LP backing is floored, matching the
    /// program's integer conversion. Returns `None` for all-zero records,
    /// which are not emitted at all.
    pub fn staked(amounts: StakedAmounts, rates: &LpRates) -> Option<Self> {
        if amounts.pt == 0 && amounts.yt == 0 && amounts.lp == 0 {
            return None;
        }

        let lp = Decimal::from(amounts.lp);
        Some(Self {
            pt: Decimal::from(amounts.pt),
            yt: Decimal::from(amounts.yt),
            lp,
            lp_pt: (lp * rates.lp_pt_rate).floor(),
            lp_yt: (lp * rates.lp_yt_rate).floor(),
        })
    }

    /// Credit from a held token-account balance. Held LP backing is NOT
    /// floored; the asymmetry with [`Contribution::staked`] is kept until
    /// the on-chain rounding is confirmed either way.
    pub fn held(class: TokenClass, amount: u64, rates: &LpRates) -> Self {
        let amount = Decimal::from(amount);
        match class {
            TokenClass::Principal => Self {
                pt: amount,
                ..Self::ZERO
            },
            TokenClass::Yield => Self {
                yt: amount,
                ..Self::ZERO
            },
            TokenClass::Liquidity => Self {
                lp: amount,
                lp_pt: amount * rates.lp_pt_rate,
                lp_yt: amount * rates.lp_yt_rate,
                ..Self::ZERO
            },
        }
    }
}

/// Human-scaled position totals for one wallet.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletPosition {
    pub wallet_address: String,
    pub pt_amount: Decimal,
    pub yt_amount: Decimal,
    pub lp_amount: Decimal,
    pub lp_pt_amount: Decimal,
    pub lp_yt_amount: Decimal,
}

impl WalletPosition {
    fn new(wallet_address: String) -> Self {
        Self {
            wallet_address,
            pt_amount: Decimal::ZERO,
            yt_amount: Decimal::ZERO,
            lp_amount: Decimal::ZERO,
            lp_pt_amount: Decimal::ZERO,
            lp_yt_amount: Decimal::ZERO,
        }
    }

    fn credit(&mut self, contribution: &Contribution, unit: Decimal) {
        self.pt_amount += contribution.pt / unit;
        self.yt_amount += contribution.yt / unit;
        self.lp_amount += contribution.lp / unit;
        self.lp_pt_amount += contribution.lp_pt / unit;
        self.lp_yt_amount += contribution.lp_yt / unit;
    }
}

/// Multi-wallet accumulator keyed by wallet address. One row per distinct
/// wallet regardless of how many records contributed to it.
pub struct PositionLedger {
    unit: Decimal,
    positions: HashMap<String, WalletPosition>,
}

impl PositionLedger {
    pub fn new(mint_decimals: u32) -> Self {
        Self {
            unit: Decimal::TEN.powu(u64::from(mint_decimals)),
            positions: HashMap::new(),
        }
    }

    pub fn credit(&mut self, wallet: &str, contribution: &Contribution) {
        self.positions
            .entry(wallet.to_owned())
            .or_insert_with(|| WalletPosition::new(wallet.to_owned()))
            .credit(contribution, self.unit);
    }

    /// Drain into rows, sorted by wallet address for deterministic output.
    pub fn into_positions(self) -> Vec<WalletPosition> {
        let mut positions: Vec<WalletPosition> = self.positions.into_values().collect();
        positions.sort_by(|a, b| a.wallet_address.cmp(&b.wallet_address));
        positions
    }
}

/// Accumulator scoped to a single known wallet; credits against any other
/// address are dropped.
pub struct SingleWalletLedger {
    unit: Decimal,
    position: WalletPosition,
}

impl SingleWalletLedger {
    pub fn new(wallet: &str, mint_decimals: u32) -> Self {
        Self {
            unit: Decimal::TEN.powu(u64::from(mint_decimals)),
            position: WalletPosition::new(wallet.to_owned()),
        }
    }

    pub fn credit(&mut self, wallet: &str, contribution: &Contribution) {
        if wallet != self.position.wallet_address {
            return;
        }
        self.position.credit(contribution, self.unit);
    }

    pub fn into_position(self) -> WalletPosition {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn rates(pt: &str, yt: &str) -> LpRates {
        LpRates {
            lp_pt_rate: dec(pt),
            lp_yt_rate: dec(yt),
        }
    }

    #[test]
    fn all_zero_stake_record_is_skipped() {
        let contribution = Contribution::staked(StakedAmounts::default(), &rates("0.5", "0.25"));
        assert!(contribution.is_none());
    }

    #[test]
    fn staked_lp_backing_is_floored() {
        let amounts = StakedAmounts {
            pt: 0,
            yt: 0,
            lp: 3,
        };
        let contribution = Contribution::staked(amounts, &rates("0.5", "0.25")).unwrap();

        let mut ledger = PositionLedger::new(0);
        ledger.credit("w", &contribution);
        let position = ledger.into_positions().remove(0);

        // 3 * 0.5 = 1.5 floored to 1; 3 * 0.25 = 0.75 floored to 0
        assert_eq!(position.lp_pt_amount, Decimal::ONE);
        assert_eq!(position.lp_yt_amount, Decimal::ZERO);
    }

    #[test]
    fn held_lp_backing_is_not_floored() {
        let contribution = Contribution::held(TokenClass::Liquidity, 3, &rates("0.5", "0.25"));

        let mut ledger = PositionLedger::new(0);
        ledger.credit("w", &contribution);
        let position = ledger.into_positions().remove(0);

        assert_eq!(position.lp_pt_amount, dec("1.5"));
        assert_eq!(position.lp_yt_amount, dec("0.75"));
    }

    #[test]
    fn staked_and_held_balances_merge_per_wallet() {
        let lp_rates = rates("0.5", "0.25");
        let mut ledger = PositionLedger::new(6);

        let staked = Contribution::staked(
            StakedAmounts {
                pt: 1_000_000,
                yt: 0,
                lp: 0,
            },
            &lp_rates,
        )
        .unwrap();
        ledger.credit("wallet-a", &staked);
        ledger.credit(
            "wallet-a",
            &Contribution::held(TokenClass::Principal, 500_000, &lp_rates),
        );

        let positions = ledger.into_positions();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].pt_amount, dec("1.5"));
        assert_eq!(positions[0].yt_amount, Decimal::ZERO);
    }

    #[test]
    fn distinct_wallets_get_distinct_rows() {
        let lp_rates = rates("1", "1");
        let mut ledger = PositionLedger::new(0);

        ledger.credit(
            "wallet-b",
            &Contribution::held(TokenClass::Yield, 10, &lp_rates),
        );
        ledger.credit(
            "wallet-a",
            &Contribution::held(TokenClass::Yield, 20, &lp_rates),
        );

        let positions = ledger.into_positions();
        assert_eq!(positions.len(), 2);
        // sorted by address
        assert_eq!(positions[0].wallet_address, "wallet-a");
        assert_eq!(positions[0].yt_amount, Decimal::from(20));
        assert_eq!(positions[1].wallet_address, "wallet-b");
    }

    #[test]
    fn single_wallet_ledger_ignores_other_wallets() {
        let lp_rates = rates("0.5", "0.25");
        let mut ledger = SingleWalletLedger::new("mine", 6);

        ledger.credit(
            "mine",
            &Contribution::held(TokenClass::Principal, 1_500_000, &lp_rates),
        );
        ledger.credit(
            "theirs",
            &Contribution::held(TokenClass::Principal, 9_000_000, &lp_rates),
        );

        let position = ledger.into_position();
        assert_eq!(position.wallet_address, "mine");
        assert_eq!(position.pt_amount, dec("1.5"));
    }

    #[test]
    fn amounts_scale_by_mint_decimals() {
        let lp_rates = rates("2", "0.5");
        let mut ledger = PositionLedger::new(9);

        ledger.credit(
            "w",
            &Contribution::held(TokenClass::Liquidity, 4_000_000_000, &lp_rates),
        );

        let position = ledger.into_positions().remove(0);
        assert_eq!(position.lp_amount, Decimal::from(4));
        assert_eq!(position.lp_pt_amount, Decimal::from(8));
        assert_eq!(position.lp_yt_amount, Decimal::from(2));
    }
}
