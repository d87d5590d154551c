use crate::session::{SessionGate, SessionSettings};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub gate: SessionGate,
}

impl AppState {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            gate: SessionGate::new(settings),
        }
    }
}
