use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use crate::auth::jwt::verify_token;
use crate::auth::roles::{Capability, Role};
use crate::error::AppError;
use crate::sales::InvoiceScope;
use crate::state::AppState;

/// Caller identity attached to every authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub tenant_id: Option<i64>,
    pub role: Role,
    pub name: String,
}

impl AuthContext {
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(AppError::forbidden("Not authorized"))
        }
    }

    /// The caller's business, for tenant-scoped operations.
    pub fn tenant(&self) -> Result<i64, AppError> {
        self.tenant_id
            .ok_or_else(|| AppError::forbidden("This account is not bound to a business"))
    }

    /// Which invoices the caller reaches: every business for roles that span
    /// tenants, otherwise only their own.
    pub fn scope(&self) -> Result<InvoiceScope, AppError> {
        if self.role.spans_tenants() {
            Ok(InvoiceScope::AnyTenant)
        } else {
            self.tenant().map(InvoiceScope::Tenant)
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let auth_header = match req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok()) {
        Some(h) => h,
        None => return AppError::unauthorized("Missing Authorization header").into_response(),
    };

    // Expect "Bearer <token>"
    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return AppError::unauthorized("Invalid Authorization format").into_response(),
    };

    let claims = match verify_token(token, &state.jwt_secret) {
        Ok(c) => c,
        Err(e) => return e.into_response(),
    };

    let role = match claims.role.parse::<Role>() {
        Ok(r) => r,
        Err(msg) => return AppError::unauthorized(msg).into_response(),
    };

    if claims.tenant_id.is_none() && !role.spans_tenants() {
        return AppError::unauthorized("Token is missing its business").into_response();
    }

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        tenant_id: claims.tenant_id,
        role,
        name: claims.name,
    });

    next.run(req).await
}
