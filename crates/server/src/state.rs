//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::gateway::{QueryGateway, WarehouseHandle};

pub struct AppState {
    pub gateway: QueryGateway,
}

impl AppState {
    pub fn new(warehouse: WarehouseHandle) -> Arc<Self> {
        Arc::new(Self {
            gateway: QueryGateway::new(warehouse),
        })
    }
}
