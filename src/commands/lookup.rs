//! Interactive lookup over the ranked pairs.

use crate::discovery::{format_lookup_line, QueryIndex};
use std::convert::Infallible;
use std::io::{BufRead, Write};

const PROMPT: &str =
    "Enter asset symbol (without USDT, e.g., BTC), 'list' to show all unique pairs, or 'x' to exit: ";

/// ANSI: clear screen and move the cursor home
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCommand {
    Exit,
    List,
    /// Upper-cased base asset
    Symbol(String),
}

impl LookupCommand {
    /// Every input is a valid command; unknown words are symbol queries
    pub fn from_input(s: &str) -> Self {
        let input = s.trim().to_uppercase();
        match input.as_str() {
            "X" => LookupCommand::Exit,
            "LIST" => LookupCommand::List,
            _ => LookupCommand::Symbol(input),
        }
    }
}

impl std::str::FromStr for LookupCommand {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_input(s))
    }
}

/// Serve lookups until `x` or end of input
pub fn run_lookup_loop<R, W>(index: &QueryIndex, mut input: R, mut output: W) -> std::io::Result<()>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "\n{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let command = LookupCommand::from_input(&line);

        write!(output, "{}", CLEAR_SCREEN)?;
        match command {
            LookupCommand::Exit => {
                writeln!(output, "Exiting lookup.")?;
                break;
            }
            LookupCommand::List => {
                writeln!(output, "\nAll unique cointegrated pairs:")?;
                for pair in index.list_all() {
                    writeln!(output, "{}", format_lookup_line(pair))?;
                }
            }
            LookupCommand::Symbol(symbol) => {
                let matches = index.find_by_symbol(&symbol);
                if matches.is_empty() {
                    writeln!(
                        output,
                        "\nNo cointegrated pairs found for asset {}. Please try another asset or press 'x' to exit.",
                        symbol
                    )?;
                } else {
                    writeln!(output, "\nCointegrated pairs containing {}:", symbol)?;
                    for pair in matches {
                        writeln!(output, "{}", format_lookup_line(pair))?;
                    }
                }
            }
        }
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::screener::rank;
    use crate::discovery::PairResult;
    use std::io::Cursor;

    fn index() -> QueryIndex {
        let pair = |a: &str, b: &str, p: f64| PairResult {
            symbol_a: a.into(),
            symbol_b: b.into(),
            p_value: p,
            statistic: -3.5,
        };
        QueryIndex::new(&rank(
            vec![
                pair("BTC/USDT", "ETH/USDT", 0.02),
                pair("SOL/USDT", "AVAX/USDT", 0.01),
            ],
            0.05,
            10,
        ))
    }

    fn run(input: &str) -> String {
        let mut out = Vec::new();
        run_lookup_loop(&index(), Cursor::new(input.to_string()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!("x\n".parse::<LookupCommand>(), Ok(LookupCommand::Exit));
        assert_eq!(" List ".parse::<LookupCommand>(), Ok(LookupCommand::List));
        assert_eq!(
            "btc".parse::<LookupCommand>(),
            Ok(LookupCommand::Symbol("BTC".into()))
        );
    }

    #[test]
    fn test_list_prints_ranked_order() {
        let out = run("list\nx\n");
        let sol = out.find("SOL/USDT - AVAX/USDT: p-value=0.0100, score=-3.50").unwrap();
        let btc = out.find("BTC/USDT - ETH/USDT: p-value=0.0200, score=-3.50").unwrap();
        assert!(sol < btc);
        assert!(out.ends_with("Exiting lookup.\n"));
    }

    #[test]
    fn test_symbol_lookup() {
        let out = run("eth\nxrp\nX\n");
        assert!(out.contains("Cointegrated pairs containing ETH:"));
        assert!(out.contains("BTC/USDT - ETH/USDT"));
        assert!(!out.contains("SOL/USDT - AVAX/USDT"));
        assert!(out.contains("No cointegrated pairs found for asset XRP."));
        assert!(out.contains(CLEAR_SCREEN));
    }

    #[test]
    fn test_stops_at_end_of_input() {
        let out = run("btc\n");
        assert!(out.contains("Cointegrated pairs containing BTC:"));
        assert!(!out.contains("Exiting lookup."));
    }
}
