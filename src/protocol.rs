//! Public HTTP response bodies that are not plain domain rows (serde ready).
//! Taxonomy rows and generated questions are served as their domain types.

use serde::Serialize;

pub const ROOT_MESSAGE: &str = "Question Maker API is running";

#[derive(Serialize)]
pub struct RootOut {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
