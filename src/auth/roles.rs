use std::fmt;
use std::str::FromStr;

/// Staff roles. Wire names follow the business vocabulary stored in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    SuperAdmin,
    Admin,
    Cashier,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateInvoice,
    ReverseInvoice,
    ListInvoices,
    ViewInvoice,
    ViewProducts,
    ManageProducts,
    CreateCustomer,
    ListCustomers,
    ManageCustomers,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Cashier => "cajero",
            Role::Seller => "vendedor",
        }
    }

    /// The one place that decides which role may do what.
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;
        match self {
            Role::SuperAdmin => matches!(capability, ReverseInvoice | ListInvoices),
            Role::Admin => true,
            Role::Cashier => matches!(
                capability,
                CreateInvoice
                    | ListInvoices
                    | ViewInvoice
                    | ViewProducts
                    | CreateCustomer
                    | ListCustomers
            ),
            Role::Seller => matches!(capability, ListInvoices),
        }
    }

    /// Restricted to invoices the user issued.
    pub fn sees_only_own_invoices(self) -> bool {
        matches!(self, Role::Cashier | Role::Seller)
    }

    /// Not bound to a single business.
    pub fn spans_tenants(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "superadmin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "cajero" => Ok(Role::Cashier),
            "vendedor" => Ok(Role::Seller),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
