use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::order::Counterparty;

/// A client from the directory. Orders snapshot the fields they need through
/// [`Client::counterparty`]; the directory record itself stays mutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct Client {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(name: String, email: Option<String>, address: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            address,
            created_at: Utc::now(),
        }
    }

    pub fn counterparty(&self) -> Counterparty {
        Counterparty {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }
}
