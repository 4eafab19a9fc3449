use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of one account's holdings, the balance subset of
/// the account object returned by `condenser_api.get_accounts`.
///
/// Amounts are kept as the chain's asset strings ("1.000 GOLOS") rather than
/// parsed numbers; the monitor reports them, it does not do arithmetic on
/// them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    pub name: String,
    #[serde(default)]
    pub balance: String,
    #[serde(default)]
    pub savings_balance: String,
    #[serde(default)]
    pub sbd_balance: String,
    #[serde(default)]
    pub savings_sbd_balance: String,
    #[serde(default, alias = "vesting_shares")]
    pub vesting_balance: String,
}
