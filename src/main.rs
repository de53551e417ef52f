use anyhow::Context;
use tradelink::{ExchangeCredentials, ExchangeFactory, ExchangeId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let exchange: ExchangeId = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "coinbase".to_string())
        .parse()
        .context("usage: tradelink [coinbase|okx] [SYMBOL]")?;
    let symbol = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "BTCUSD".to_string());

    // Sandbox endpoints only, for safety
    let mut connector = ExchangeFactory::create_connector(exchange, None, true)?;

    println!("Fetching {} market data from {}...", symbol, exchange);
    match connector.get_market_data(&symbol).await {
        Ok(data) => println!(
            "{}: last {} bid {} ask {} (24h {}%, vol {})",
            data.symbol, data.price, data.bid, data.ask, data.change_24h, data.volume_24h
        ),
        Err(e) => println!("Error fetching market data: {}", e),
    }

    match connector.get_order_book(&symbol, 5).await {
        Ok(book) => {
            println!("Order book for {}:", book.symbol);
            for level in &book.asks {
                println!("  ask {} @ {}", level.size, level.price);
            }
            for level in &book.bids {
                println!("  bid {} @ {}", level.size, level.price);
            }
        }
        Err(e) => println!("Error fetching order book: {}", e),
    }

    let credentials = match ExchangeCredentials::from_env_file(exchange.env_prefix()) {
        Ok(credentials) => credentials,
        Err(e) => {
            println!("Skipping account section: {}", e);
            return Ok(());
        }
    };

    connector.connect(credentials).await?;
    let account = connector.get_account_info().await?;
    println!("Balances ({}):", account.permissions.join(", "));
    for balance in &account.balances {
        println!(
            "  {}: free {} locked {}",
            balance.asset, balance.free, balance.locked
        );
    }
    connector.disconnect();

    Ok(())
}
