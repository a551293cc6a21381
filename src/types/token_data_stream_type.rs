#[derive(Debug, Default)]
pub struct Token_Data_Stream_Type {
    pub token: String,
    pub data_stream: String,
}
