use std::sync::Arc;

use crate::application::accounts::AccountService;
use crate::application::blog::BlogService;

/// Shared state for the JSON API routes. Constructed once at startup and
/// cloned per request; both services are internally reference-counted.
#[derive(Clone)]
pub struct ApiState {
    pub accounts: Arc<AccountService>,
    pub blog: Arc<BlogService>,
}
