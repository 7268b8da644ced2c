use serde::{Deserialize, Serialize};

/// A chat that receives event broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl Subscriber {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            username: None,
            first_name: None,
        }
    }
}
