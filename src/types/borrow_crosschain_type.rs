#[derive(Debug, Default)]
pub struct Borrow_Crosschain_Type {
    pub user: String,
    pub amount: String,
    pub shares: String,
    pub chain_id: String,
    pub bridge_token_sender: String,
}
