//! Account overview: balances and open positions
//!
//! Derived entirely from `/fapi/v2/account` plus one mark price per open
//! position. ROI is measured against the margin the position ties up,
//! `|amount| * entry / leverage`.

use crate::binance::rest::FuturesRestClient;
use crate::binance::types::{AccountInfo, PositionInfo};
use crate::errors::Result;
use crate::traits::HttpTransport;
use perpdesk_core::prelude::*;

use rust_decimal_macros::dec;
use tracing::warn;

/// Direction of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// Return on margin in percent; zero when any input makes it undefined.
pub fn roi_percent(
    unrealized_profit: Decimal,
    position_amt: Decimal,
    entry_price: Decimal,
    leverage: u32,
) -> Decimal {
    if position_amt.is_zero() || entry_price.is_zero() || leverage == 0 {
        return Decimal::ZERO;
    }
    let margin = position_amt.abs() * entry_price / Decimal::from(leverage);
    unrealized_profit / margin * dec!(100)
}

/// One open position, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionView {
    pub symbol: String,
    pub side: PositionSide,
    pub amount: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Option<Decimal>,
    pub leverage: u32,
    pub unrealized_profit: Decimal,
    pub roi: Decimal,
}

impl PositionView {
    /// `None` for flat positions
    pub fn from_position(position: &PositionInfo) -> Option<Self> {
        if position.position_amt.is_zero() {
            return None;
        }

        Some(Self {
            symbol: position.symbol.clone(),
            side: if position.position_amt > Decimal::ZERO {
                PositionSide::Long
            } else {
                PositionSide::Short
            },
            amount: position.position_amt.abs(),
            entry_price: position.entry_price,
            mark_price: None,
            leverage: position.leverage,
            unrealized_profit: position.unrealized_profit,
            roi: roi_percent(
                position.unrealized_profit,
                position.position_amt,
                position.entry_price,
                position.leverage,
            ),
        })
    }
}

/// Wallet totals and open positions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSummary {
    pub wallet_balance: Decimal,
    pub unrealized_profit: Decimal,
    pub total_balance: Decimal,
    pub positions: Vec<PositionView>,
}

impl AccountSummary {
    pub fn from_account(account: &AccountInfo) -> Self {
        Self {
            wallet_balance: account.total_wallet_balance,
            unrealized_profit: account.total_unrealized_profit,
            total_balance: account.total_wallet_balance + account.total_unrealized_profit,
            positions: account
                .positions
                .iter()
                .filter_map(PositionView::from_position)
                .collect(),
        }
    }

    pub fn has_positions(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Fetch the account and the mark price of every open position.
    ///
    /// A mark price that cannot be fetched is left empty rather than
    /// failing the whole overview.
    pub async fn fetch<T: HttpTransport>(client: &FuturesRestClient<T>) -> Result<Self> {
        let account = client.account().await?;
        let mut summary = Self::from_account(&account);

        for position in &mut summary.positions {
            match client.mark_price(&position.symbol).await {
                Ok(mark) => position.mark_price = Some(mark),
                Err(e) => warn!("⚠️ No mark price for {}: {}", position.symbol, e),
            }
        }

        Ok(summary)
    }
}
