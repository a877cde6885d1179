//! Fresh persistent identifiers

use uuid::Uuid;

pub const NBN_PREFIX: &str = "urn:nbn:nl:ui:13-";

/// Stateless; clone or share freely between tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct IdMinter;

impl IdMinter {
    pub fn mint_urn_nbn(&self) -> String {
        format!("{}{}", NBN_PREFIX, Uuid::new_v4())
    }

    pub fn mint_bag_id(&self) -> String {
        format!("urn:uuid:{}", Uuid::new_v4())
    }
}
