use mongodb::bson;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Malformed job document: {0}")]
    Decode(#[from] bson::de::Error),
}
