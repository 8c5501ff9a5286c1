// src/dtos/customer.rs
use serde::{Deserialize, Serialize};

/// Body for both registering and editing a customer. Editing replaces every
/// field, so omitted optional fields are cleared.
#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
}

impl CustomerRequest {
    /// Trimmed copy with blank optional fields turned into `None`.
    pub fn normalized(self) -> Self {
        fn clean(field: Option<String>) -> Option<String> {
            field
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: self.name.trim().to_string(),
            phone: clean(self.phone),
            national_id: clean(self.national_id),
            address: clean(self.address),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

impl From<crate::models::customer::Customer> for CustomerResponse {
    fn from(customer: crate::models::customer::Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            national_id: customer.national_id,
            address: customer.address,
            created_at: customer.created_at.to_rfc3339(),
        }
    }
}
