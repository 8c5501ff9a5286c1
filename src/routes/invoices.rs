use axum::{
    routing::{get, post},
    Router,
};
use crate::state::AppState;
use crate::handlers::invoice;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(invoice::create_invoice).get(invoice::list_invoices))
        .route("/invoices/{id}", get(invoice::get_invoice).delete(invoice::reverse_invoice))
}
