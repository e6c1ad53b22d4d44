//! Terminal commands standing in for the widget's buttons and for actions
//! taken inside the wallet itself.

use std::str::FromStr;

use shared::domain::{Address, ChainId};
use thiserror::Error;
use wallet_core::units::{self, ETHER_DECIMALS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetCommand {
    Connect,
    Mint,
    Balance,
    Status,
    /// Pick another account in the wallet.
    Account(Address),
    /// Revoke the site's access from the wallet.
    Revoke,
    /// Switch chains from the wallet.
    Chain(ChainId),
    /// Set the wallet's balance, in ETH.
    Fund(u128),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'; try 'help'")]
    Unknown(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("invalid argument '{value}' for '{command}'")]
    InvalidArgument { command: &'static str, value: String },
}

pub const HELP: &str = "\
commands:
  connect            click the connect button
  mint               click the mint button
  balance            refresh the displayed balance
  status             print session and widget state
  account <address>  select another account in the wallet
  revoke             revoke site access from the wallet
  chain <0x-id>      switch chains from the wallet
  fund <eth>         set the wallet balance
  help               show this help
  quit               exit";

impl FromStr for WidgetCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(CommandParseError::Empty);
        };
        let argument = parts.next();

        match name.to_ascii_lowercase().as_str() {
            "connect" => Ok(Self::Connect),
            "mint" => Ok(Self::Mint),
            "balance" => Ok(Self::Balance),
            "status" => Ok(Self::Status),
            "revoke" | "disconnect" => Ok(Self::Revoke),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            "account" => {
                let value = argument.ok_or(CommandParseError::MissingArgument {
                    command: "account",
                    argument: "an address",
                })?;
                Ok(Self::Account(Address::from(value)))
            }
            "chain" => {
                let value = argument.ok_or(CommandParseError::MissingArgument {
                    command: "chain",
                    argument: "a 0x-prefixed chain id",
                })?;
                value
                    .parse()
                    .map(Self::Chain)
                    .map_err(|_| CommandParseError::InvalidArgument {
                        command: "chain",
                        value: value.to_string(),
                    })
            }
            "fund" => {
                let value = argument.ok_or(CommandParseError::MissingArgument {
                    command: "fund",
                    argument: "an ETH amount",
                })?;
                units::parse_units(value, ETHER_DECIMALS)
                    .map(Self::Fund)
                    .map_err(|_| CommandParseError::InvalidArgument {
                        command: "fund",
                        value: value.to_string(),
                    })
            }
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_button_commands_case_insensitively() {
        assert_eq!("connect".parse(), Ok(WidgetCommand::Connect));
        assert_eq!("  MINT ".parse(), Ok(WidgetCommand::Mint));
        assert_eq!("exit".parse(), Ok(WidgetCommand::Quit));
    }

    #[test]
    fn parses_wallet_side_commands() {
        assert_eq!(
            "account 0xabc".parse(),
            Ok(WidgetCommand::Account(Address::from("0xabc")))
        );
        assert_eq!("chain 0x1".parse(), Ok(WidgetCommand::Chain(ChainId(1))));
        assert_eq!(
            "fund 0.5".parse(),
            Ok(WidgetCommand::Fund(500_000_000_000_000_000))
        );
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!("".parse::<WidgetCommand>(), Err(CommandParseError::Empty));
        assert_eq!(
            "jump".parse::<WidgetCommand>(),
            Err(CommandParseError::Unknown("jump".into()))
        );
        assert_eq!(
            "chain".parse::<WidgetCommand>(),
            Err(CommandParseError::MissingArgument {
                command: "chain",
                argument: "a 0x-prefixed chain id"
            })
        );
        assert_eq!(
            "chain 8453".parse::<WidgetCommand>(),
            Err(CommandParseError::InvalidArgument {
                command: "chain",
                value: "8453".into()
            })
        );
    }
}
