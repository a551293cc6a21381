#[derive(Debug, Default)]
pub struct Create_Position_Type {
    pub user: String,
    pub position_address: String,
}
