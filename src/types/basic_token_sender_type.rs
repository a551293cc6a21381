#[derive(Debug, Default)]
pub struct Basic_Token_Sender_Type {
    pub chain_id: String,
    pub basic_token_sender: String,
}
