//! Account route handlers.
//!
//! These routes require a logged-in customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};

use cartwright_core::{CustomerId, Realm};

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, auth::LOGIN_PATH};
use crate::models::{Customer, Order};
use crate::state::AppState;

/// Customer display data for templates.
#[derive(Clone)]
pub struct CustomerView {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub newsletter: bool,
    pub last_login: Option<String>,
    pub member_since: String,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            name: format!("{} {}", customer.data.first_name, customer.data.last_name),
            email: customer.data.email.to_string(),
            phone: customer.data.phone.clone(),
            newsletter: customer.data.subscribe_to_newsletter,
            last_login: customer
                .last_login
                .map(|at| at.format("%B %-d, %Y %H:%M UTC").to_string()),
            member_since: customer.created_at.format("%B %Y").to_string(),
        }
    }
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub placed: String,
    pub status: String,
    pub items: usize,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.order_number.to_string(),
            placed: order.created_at.format("%Y-%m-%d").to_string(),
            status: order.data.status.to_string(),
            items: order
                .data
                .items
                .iter()
                .map(|i| usize::try_from(i.quantity).unwrap_or(0))
                .sum(),
            total: order.data.total.to_string(),
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub customer: CustomerView,
    pub orders: Vec<OrderView>,
}

/// `GET /account`
///
/// Admin sessions and sessions whose customer was deleted are sent back to
/// the login page.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<Response> {
    if current_user.principal.realm != Realm::Customers {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    }

    let id = CustomerId::new(current_user.principal.id);
    let Some(customer) = state.store().find_customer(id).await? else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let orders = state.store().list_orders(Some(id)).await?;

    Ok(AccountTemplate {
        customer: CustomerView::from(&customer),
        orders: orders.iter().map(OrderView::from).collect(),
    }
    .into_response())
}
