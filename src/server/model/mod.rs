use serde::Serialize;
use uuid::Uuid;

pub(crate) mod bottle;
pub(crate) mod config;
pub(crate) mod menu;
pub(crate) mod report;
pub(crate) mod ticket;

#[derive(Debug, Serialize)]
pub(crate) struct CreatedResponse {
    pub id: Uuid,
}
