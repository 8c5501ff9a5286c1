pub mod customer;
pub mod invoice;
pub mod product;

use serde::Serialize;

/// Plain acknowledgement for deletes.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
