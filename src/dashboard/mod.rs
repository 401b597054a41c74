//! The dashboard summary of a user's transactions.

mod handlers;

pub use handlers::get_dashboard;
