//! A scripted model provider for exercising the orchestration loop without
//! network access.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use super::content::{Content, Part};
use super::error::AgentError;
use super::provider::{GenerateRequest, ModelProvider, ModelResponse};

/// What the provider was asked, captured per `generate` call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub functions: Vec<String>,
    pub web_search: bool,
}

/// Replays queued replies in order and records every request.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Content, AgentError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    healthy: AtomicBool,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<Content, AgentError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<ModelResponse, AgentError> {
        self.requests.lock().push(RecordedRequest {
            model: request.model.to_string(),
            contents: request.contents.to_vec(),
            functions: request.functions.iter().map(|f| f.name.clone()).collect(),
            web_search: request.web_search,
        });

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or(Err(AgentError::EmptyResponse))?;

        Ok(ModelResponse {
            content: reply,
            finish_reason: Some("STOP".to_string()),
        })
    }

    async fn health_check(&self) -> Result<(), AgentError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AgentError::Transport("connection refused".to_string()))
        }
    }
}

pub fn reply_text(text: &str) -> Result<Content, AgentError> {
    Ok(Content::model(vec![Part::text(text)]))
}

pub fn reply_call(name: &str, args: Value) -> Result<Content, AgentError> {
    Ok(Content::model(vec![Part::function_call(name, args)]))
}

/// A complete report that passes build report validation.
pub fn sample_report() -> Value {
    json!({
        "report_meta": {
            "build_id": "sage-7f3a",
            "generated_at": "2026-10-19T09:30:00Z",
            "total_estimated_cost": 6115.0,
            "currency": "MYR"
        },
        "components": {
            "cpu": {
                "model_name": "Intel Core i5-14600K",
                "price": 1199.0,
                "vendor_url": "https://shop.example.my/cpu/14600k",
                "specs": { "socket": "LGA1700", "core_count": "14", "tdp_watts": 125 }
            },
            "gpu": {
                "model_name": "ASUS Dual GeForce RTX 4070 Super",
                "price": 2899.0,
                "vendor_url": "https://shop.example.my/gpu/4070s",
                "specs": { "chipset": "AD104", "vram": "12GB GDDR6X", "tgp_watts": 220, "length_mm": 267, "slot_width": 2.5 }
            },
            "motherboard": {
                "model_name": "MSI PRO B760M-A WIFI",
                "price": 689.0,
                "vendor_url": "https://shop.example.my/mobo/b760m",
                "specs": { "form_factor": "mATX", "socket": "LGA1700", "max_power_draw_watts": 50 }
            },
            "ram": {
                "model_name": "Kingston Fury Beast 32GB DDR5-6000",
                "price": 439.0,
                "vendor_url": "https://shop.example.my/ram/fury",
                "specs": { "capacity_gb": 32, "speed_mhz": 6000 }
            },
            "storage": {
                "model_name": "Samsung 990 EVO 1TB",
                "price": 379.0,
                "vendor_url": "https://shop.example.my/ssd/990evo",
                "specs": { "interface": "NVMe", "generation": "Gen4" }
            },
            "psu": {
                "model_name": "Cooler Master MWE Gold 750 V2",
                "price": 510.0,
                "vendor_url": "https://shop.example.my/psu/mwe750",
                "specs": { "wattage": 750, "rating": "80+ Gold", "modular": "Full" }
            }
        },
        "performance_estimates": {
            "calculated_total_wattage": 445,
            "gaming_1440p_fps": "110-140"
        }
    })
}
