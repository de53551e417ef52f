/// Trading-pair syntax of one exchange.
///
/// Canonical symbols are uppercase `BASE+QUOTE` with no separator (`BTCUSD`);
/// exchange symbols join the two with the exchange's separator (`BTC-USD`).
/// Splitting a canonical symbol relies on a priority-ordered list of known quote
/// currencies: the first one that is a proper suffix wins. Symbols whose quote is
/// not listed fall back to a length heuristic that is not guaranteed to be
/// correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolFormat {
    separator: &'static str,
    quotes: &'static [&'static str],
}

impl SymbolFormat {
    pub const fn new(separator: &'static str, quotes: &'static [&'static str]) -> Self {
        Self { separator, quotes }
    }

    pub const fn separator(&self) -> &'static str {
        self.separator
    }

    pub const fn quotes(&self) -> &'static [&'static str] {
        self.quotes
    }

    /// Exchange symbol to canonical: drop the separator, uppercase.
    pub fn normalize(&self, exchange_symbol: &str) -> String {
        exchange_symbol
            .replace(self.separator, "")
            .trim()
            .to_ascii_uppercase()
    }

    /// Canonical symbol to exchange syntax.
    ///
    /// Input that already contains the separator is returned unchanged.
    pub fn denormalize(&self, canonical: &str) -> String {
        if canonical.contains(self.separator) {
            return canonical.to_string();
        }

        let symbol = canonical.trim().to_ascii_uppercase();
        if let Some((base, quote)) = self.split_known_quote(&symbol) {
            return self.join(base, quote);
        }

        // Best effort for quotes outside the known list
        let split_at = if symbol.len() >= 7 { 4 } else { 3 };
        if symbol.len() <= split_at || !symbol.is_char_boundary(split_at) {
            return symbol;
        }
        let (base, quote) = symbol.split_at(split_at);
        self.join(base, quote)
    }

    /// Splits a canonical symbol using the known quote list only.
    pub fn split_known_quote<'a>(&self, symbol: &'a str) -> Option<(&'a str, &'static str)> {
        self.quotes.iter().find_map(|quote| {
            symbol
                .strip_suffix(quote)
                .filter(|base| !base.is_empty())
                .map(|base| (base, *quote))
        })
    }

    fn join(&self, base: &str, quote: &str) -> String {
        format!("{}{}{}", base, self.separator, quote)
    }
}
