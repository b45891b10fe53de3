//! Subcommands and interactive menus
//!
//! Everything here is operator I/O around [`TradingSession`]: prompts,
//! confirmations and printing. Validation and quantization happen in the
//! exchange crate.

use crate::display;
use anyhow::{Context, Result, anyhow, bail};
use perpdesk_core::prelude::*;
use perpdesk_exchanges::binance::{
    self, AccountSummary, Credentials, FuturesConfig, FuturesRestClient, LEVERAGE_RANGE,
    PREFERRED_SYMBOLS, TradingSession,
};
use perpdesk_exchanges::{HttpTransport, OrderSide};
use std::io::{self, BufRead, Write};

/// Symbol and size of the quick test trade
const QUICK_TEST_SYMBOL: &str = "XRPUSDT";
const QUICK_TEST_QUANTITY: u32 = 10;

/// Extra non-preferred symbols listed by the pair picker
const EXTRA_SYMBOLS_SHOWN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    OpenLong,
    OpenShort,
    ChangeLeverage,
    AccountStatus,
    QuickTest,
    Exit,
}

impl TradeAction {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::OpenLong),
            "2" => Some(Self::OpenShort),
            "3" => Some(Self::ChangeLeverage),
            "4" => Some(Self::AccountStatus),
            "5" => Some(Self::QuickTest),
            "6" => Some(Self::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainAction {
    TestnetTrading,
    MainnetOverview,
    Exit,
}

impl MainAction {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::TestnetTrading),
            "2" => Some(Self::MainnetOverview),
            "3" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Resolve a pair picker answer: a 1-based index into `symbols` or a
/// symbol name in any case.
pub fn resolve_symbol(input: &str, symbols: &[String]) -> Option<String> {
    let choice = input.trim().to_uppercase();
    if choice.is_empty() {
        return None;
    }

    if choice.chars().all(|c| c.is_ascii_digit()) {
        let index: usize = choice.parse().ok()?;
        return index.checked_sub(1).and_then(|i| symbols.get(i)).cloned();
    }

    symbols.iter().find(|s| **s == choice).cloned()
}

pub fn parse_quantity(input: &str) -> Result<Decimal> {
    let quantity = parse_decimal(input.trim()).map_err(|e| anyhow!("invalid quantity: {e}"))?;
    if quantity <= Decimal::ZERO {
        bail!("quantity must be greater than zero");
    }
    Ok(quantity)
}

pub fn parse_leverage(input: &str) -> Result<u32> {
    let leverage: u32 = input
        .trim()
        .parse()
        .map_err(|_| anyhow!("leverage must be a whole number"))?;
    if !LEVERAGE_RANGE.contains(&leverage) {
        bail!(
            "leverage must be between {} and {}",
            LEVERAGE_RANGE.start(),
            LEVERAGE_RANGE.end()
        );
    }
    Ok(leverage)
}

pub fn is_confirmed(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("y")
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        bail!("input closed");
    }
    Ok(line)
}

fn confirm(message: &str) -> Result<bool> {
    Ok(is_confirmed(&prompt(message)?))
}

/// Account overview for the network in `config`
pub async fn run_overview(config: FuturesConfig, credentials: Credentials) -> Result<()> {
    let testnet = config.testnet;
    let client = FuturesRestClient::new(config, Some(credentials))?;
    show_account(&client, testnet).await
}

async fn show_account<T: HttpTransport>(client: &FuturesRestClient<T>, testnet: bool) -> Result<()> {
    let summary = AccountSummary::fetch(client)
        .await
        .context("failed to load account")?;
    display::print_account_summary(&summary, testnet);
    Ok(())
}

/// Change leverage once and report the exchange's answer
pub async fn run_leverage(
    config: FuturesConfig,
    credentials: Credentials,
    symbol: &str,
    leverage: u32,
) -> Result<()> {
    let symbol = symbol.trim().to_uppercase();
    let session = binance::connect(config, credentials).await?;
    let response = session
        .set_leverage(&symbol, leverage)
        .await
        .with_context(|| format!("failed to set leverage for {symbol}"))?;
    println!("Leverage for {} set to {}x", symbol, response.leverage);
    Ok(())
}

/// Testnet overview, then the trade menu until the operator exits
pub async fn run_trade(credentials: Credentials) -> Result<()> {
    let session = binance::connect(FuturesConfig::testnet(), credentials).await?;
    if let Err(e) = show_account(session.client(), true).await {
        println!("\n{e:#}");
    }
    trade_menu(&session).await
}

/// Top-level menu shown when no subcommand is given
pub async fn run_interactive(credentials: Credentials) -> Result<()> {
    loop {
        println!("\n=== perpdesk ===");
        println!("1. Testnet trading");
        println!("2. Mainnet account overview");
        println!("3. Exit");

        match MainAction::parse(&prompt("\nSelect (1-3): ")?) {
            Some(MainAction::TestnetTrading) => {
                if let Err(e) = run_trade(credentials.clone()).await {
                    println!("\nTestnet session failed: {e:#}");
                }
            }
            Some(MainAction::MainnetOverview) => {
                if let Err(e) = run_overview(FuturesConfig::mainnet(), credentials.clone()).await {
                    println!("\n{e:#}");
                }
            }
            Some(MainAction::Exit) => return Ok(()),
            None => println!("Invalid choice, try again"),
        }
    }
}

async fn trade_menu<T: HttpTransport>(session: &TradingSession<T>) -> Result<()> {
    loop {
        println!("\n=== Test Trading ===");
        println!("1. Open long (limit)");
        println!("2. Open short (limit)");
        println!("3. Change leverage");
        println!("4. Account status");
        println!("5. Quick test ({QUICK_TEST_SYMBOL} long, market)");
        println!("6. Exit");

        let result = match TradeAction::parse(&prompt("\nSelect (1-6): ")?) {
            Some(TradeAction::OpenLong) => open_order(session, OrderSide::Buy).await,
            Some(TradeAction::OpenShort) => open_order(session, OrderSide::Sell).await,
            Some(TradeAction::ChangeLeverage) => change_leverage(session).await,
            Some(TradeAction::AccountStatus) => show_account(session.client(), true).await,
            Some(TradeAction::QuickTest) => quick_test_trade(session).await,
            Some(TradeAction::Exit) => {
                println!("Leaving test trading");
                return Ok(());
            }
            None => {
                println!("Invalid choice, try again");
                Ok(())
            }
        };

        if let Err(e) = result {
            perpdesk_core::log_error!("menu action", format!("{e:?}"));
            println!("\nOperation failed: {e:#}");
        }
    }
}

async fn price_label<T: HttpTransport>(session: &TradingSession<T>, symbol: &str) -> String {
    match session.client().mark_price(symbol).await {
        Ok(mark) => format!("{} USDT", format_grouped(mark, 4)),
        Err(_) => "-".to_string(),
    }
}

async fn select_trading_pair<T: HttpTransport>(session: &TradingSession<T>) -> Result<String> {
    let symbols = session.rules().tradable_symbols();
    let preferred = symbols
        .iter()
        .take_while(|s| PREFERRED_SYMBOLS.contains(&s.as_str()))
        .count();

    println!("\n=== Trading Pairs ===");
    println!("Popular:");
    for (i, symbol) in symbols.iter().enumerate().take(preferred) {
        println!("{}. {:<10} mark: {}", i + 1, symbol, price_label(session, symbol).await);
    }

    if symbols.len() > preferred {
        println!("\nOthers:");
        for (i, symbol) in symbols
            .iter()
            .enumerate()
            .skip(preferred)
            .take(EXTRA_SYMBOLS_SHOWN)
        {
            println!("{}. {:<10} mark: {}", i + 1, symbol, price_label(session, symbol).await);
        }
    }

    loop {
        let answer = prompt("\nPick a number or type a symbol (e.g. BTCUSDT): ")?;
        match resolve_symbol(&answer, &symbols) {
            Some(symbol) => return Ok(symbol),
            None => println!("Invalid choice, try again"),
        }
    }
}

async fn open_order<T: HttpTransport>(session: &TradingSession<T>, side: OrderSide) -> Result<()> {
    let symbol = select_trading_pair(session).await?;
    let mark_price = session.client().mark_price(&symbol).await?;
    display::print_symbol_snapshot(&session.rules().symbol_info(&symbol, mark_price));

    let quantity = parse_quantity(&prompt("Quantity: ")?)?;
    println!("Order value: {} USDT", display::order_value_label(quantity, mark_price));

    if !confirm("\nPlace order? (y/n): ")? {
        println!("Order cancelled");
        return Ok(());
    }

    let outcome = session.place_test_order(&symbol, side, quantity, false).await?;
    display::print_order_outcome(&outcome);
    Ok(())
}

async fn change_leverage<T: HttpTransport>(session: &TradingSession<T>) -> Result<()> {
    let symbol = select_trading_pair(session).await?;
    let leverage = parse_leverage(&prompt("Leverage (1-125): ")?)?;
    let response = session.set_leverage(&symbol, leverage).await?;
    println!("Leverage set to {}x", response.leverage);
    Ok(())
}

async fn quick_test_trade<T: HttpTransport>(session: &TradingSession<T>) -> Result<()> {
    let quantity = Decimal::from(QUICK_TEST_QUANTITY);
    let mark_price = session.client().mark_price(QUICK_TEST_SYMBOL).await?;
    let snapshot = session.rules().symbol_info(QUICK_TEST_SYMBOL, mark_price);

    println!("\n=== Quick Test Trade ===");
    println!("Symbol:   {QUICK_TEST_SYMBOL}");
    println!("Side:     {}", display::side_label(OrderSide::Buy));
    println!("Quantity: {quantity}");
    println!("Type:     MARKET");
    display::print_symbol_snapshot(&snapshot);
    println!("Order value: {} USDT", display::order_value_label(quantity, mark_price));

    if !confirm("\nPlace order? (y/n): ")? {
        println!("Order cancelled");
        return Ok(());
    }

    let outcome = session
        .place_test_order(QUICK_TEST_SYMBOL, OrderSide::Buy, quantity, true)
        .await?;
    display::print_order_outcome(&outcome);
    Ok(())
}
