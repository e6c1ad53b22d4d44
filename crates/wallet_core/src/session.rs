use shared::domain::{Address, ChainId};

use crate::units;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Minting,
}

impl ConnectionState {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Connecting | Self::Minting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub wei: u128,
    pub display: String,
}

impl Balance {
    pub fn from_wei(wei: u128) -> Self {
        Self {
            wei,
            display: units::format_ether(wei),
        }
    }

    pub fn zero() -> Self {
        Self::from_wei(0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

/// Page-wide wallet session. `address` is set exactly when `connected` is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub connected: bool,
    pub address: Option<Address>,
    pub balance: Balance,
    pub network: Option<ChainId>,
}

impl Session {
    pub fn adopt(&mut self, address: Address) {
        self.connected = true;
        self.address = Some(address);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn effective_wei(&self) -> u128 {
        if self.connected {
            self.balance.wei
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adopt_and_clear_keep_address_in_step_with_connected() {
        let mut session = Session::default();
        session.adopt(Address::from("0xabc"));
        assert!(session.connected);
        assert_eq!(session.address, Some(Address::from("0xabc")));

        session.balance = Balance::from_wei(5);
        session.network = Some(ChainId(1));
        session.clear();
        assert_eq!(session, Session::default());
        assert!(session.address.is_none());
    }

    #[test]
    fn balance_is_zero_while_disconnected() {
        let session = Session {
            balance: Balance::from_wei(units::WEI_PER_ETHER),
            ..Session::default()
        };
        assert_eq!(session.effective_wei(), 0);
    }
}
