//! Terminal output: grid tables and formatted summaries

use perpdesk_core::prelude::*;
use perpdesk_exchanges::binance::{AccountSummary, OrderOutcome, PositionView, SymbolSnapshot};
use perpdesk_exchanges::OrderSide;

const POSITION_HEADERS: [&str; 8] = [
    "Symbol", "Side", "Size", "Entry", "Mark", "Leverage", "Unrealized PnL", "ROI",
];

/// Render rows as a `+---+` bordered grid with a header row.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = Vec::with_capacity(rows.len() * 2 + 3);
    out.push(border(&widths, '-'));
    out.push(table_row(&widths, headers.iter().copied()));
    out.push(border(&widths, '='));
    for row in rows {
        out.push(table_row(&widths, row.iter().map(String::as_str)));
        out.push(border(&widths, '-'));
    }
    out.join("\n")
}

fn border(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat_n(fill, width + 2));
        line.push('+');
    }
    line
}

fn table_row<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for width in widths {
        let cell = cells.next().unwrap_or("");
        let pad = width.saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', pad + 1));
        line.push('|');
    }
    line
}

pub fn position_row(position: &PositionView) -> Vec<String> {
    vec![
        position.symbol.clone(),
        position.side.to_string(),
        format_grouped(position.amount, 4),
        format_grouped(position.entry_price, 4),
        position
            .mark_price
            .map(|mark| format_grouped(mark, 4))
            .unwrap_or_else(|| "-".to_string()),
        format!("{}x", position.leverage),
        format_grouped(position.unrealized_profit, 2),
        format!("{}%", format_grouped(position.roi, 2)),
    ]
}

pub fn print_account_summary(summary: &AccountSummary, testnet: bool) {
    println!("\n=== Account Overview ===");
    if testnet {
        println!("Environment: TESTNET");
    }
    println!("Wallet balance:  {} USDT", format_grouped(summary.wallet_balance, 2));
    println!("Unrealized PnL:  {} USDT", format_grouped(summary.unrealized_profit, 2));
    println!("Total equity:    {} USDT", format_grouped(summary.total_balance, 2));

    if summary.has_positions() {
        println!("\n=== Open Positions ===");
        let rows: Vec<Vec<String>> = summary.positions.iter().map(position_row).collect();
        println!("{}", render_table(&POSITION_HEADERS, &rows));
    } else {
        println!("\nNo open positions");
    }
}

pub fn print_symbol_snapshot(snapshot: &SymbolSnapshot) {
    println!("\nCurrent {} price: {} USDT", snapshot.symbol, format_grouped(snapshot.mark_price, 4));
    println!("Minimum quantity: {}", snapshot.min_qty.normalize());
    println!("Minimum order value: {} USDT", snapshot.min_notional.normalize());
}

/// `quantity * mark_price` for display; "-" when it does not fit a decimal.
pub fn order_value_label(quantity: Decimal, mark_price: Decimal) -> String {
    quantity
        .checked_mul(mark_price)
        .map(|value| format_grouped(value, 2))
        .unwrap_or_else(|| "-".to_string())
}

pub fn side_label(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "LONG",
        OrderSide::Sell => "SHORT",
    }
}

pub fn print_order_outcome(outcome: &OrderOutcome) {
    if let Some(error) = &outcome.primary_error {
        println!("\nFirst attempt failed: {error}");
        println!("Placed fallback limit order instead");
    }

    let order = &outcome.placed.order;
    let response = &outcome.placed.response;

    println!("\n=== Order Accepted ===");
    println!("Symbol:   {}", response.symbol);
    println!("Side:     {}", side_label(order.side));
    println!("Quantity: {}", response.orig_qty.normalize());

    let avg_price = response.avg_price.filter(|p| !p.is_zero());
    let price = response.price.filter(|p| !p.is_zero());
    if let Some(avg_price) = avg_price {
        println!("Avg fill: {}", format_grouped(avg_price, 4));
    } else if let Some(price) = price {
        println!("Price:    {}", format_grouped(price, 4));
    }
    println!("Status:   {}", response.status);
}
