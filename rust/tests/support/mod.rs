#![allow(dead_code)]

mod infra;

use std::time::{Duration, Instant};

pub use infra::{unreachable_base_url, Canned, TestInfra};

pub fn write_config(data_dir: &str, v: serde_json::Value) {
    let path = std::path::Path::new(data_dir).join("xcel_config.json");
    std::fs::write(path, serde_json::to_vec(&v).unwrap()).unwrap();
}

pub fn wait_until(what: &str, timeout: Duration, mut f: impl FnMut() -> bool) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if f() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("{what}: condition not met within {timeout:?}");
}

/// JSON body for `/get-reaction` with one entry per code.
pub fn reaction_batch(session_id: &str, codes: &[i64]) -> String {
    let items: Vec<serde_json::Value> = codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            serde_json::json!({
                "reaction": code,
                "timeStamp": "2023-10-16T18:00:00Z",
                "sessionId": session_id,
                "userSessionId": format!("attendee-{i}"),
            })
        })
        .collect();
    serde_json::to_string(&items).unwrap()
}
