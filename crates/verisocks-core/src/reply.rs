//! The closed reply shape of `spec.md` §3: `type ∈ {ack, result, error,
//! warning}`.

use serde_json::{json, Value as Json};

#[derive(Debug, Clone)]
pub enum Reply {
    Ack(String),
    Result(Json),
    Error(String),
    Warning(String),
}

impl Reply {
    pub fn to_json(&self) -> Json {
        match self {
            Reply::Ack(v) => json!({ "type": "ack", "value": v }),
            Reply::Result(fields) => {
                let mut obj = fields.clone();
                if let Json::Object(map) = &mut obj {
                    map.insert("type".to_string(), json!("result"));
                }
                obj
            }
            Reply::Error(v) => json!({ "type": "error", "value": v }),
            Reply::Warning(v) => json!({ "type": "warning", "value": v }),
        }
    }
}
