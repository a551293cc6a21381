#[derive(Debug, Default)]
pub struct Lending_Pool_Created_Type {
    pub lending_pool: String,
    pub collateral_token: String,
    pub borrow_token: String,
    pub ltv: String,
}
