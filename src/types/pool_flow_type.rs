/// Payload shared by the user-facing pool events: liquidity supply and
/// withdraw, collateral supply, borrow and repay.
#[derive(Debug, Default)]
pub struct Pool_Flow_Type {
    pub user: String,
    pub amount: String,
    pub shares: Option<String>,
}
