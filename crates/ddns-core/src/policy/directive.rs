//! Create directive
//!
//! A single record the operator wants managed in every zone processed by a
//! run. It is considered absent when `content` is empty.
//!
//! ```yaml
//! content: 1.2.3.4
//! name: new.example.com
//! type: A
//! proxied: false
//! comment: managed by ddnsd
//! tags: []
//! ttl: 120
//! ```

use crate::record::{DnsRecord, RECORD_TYPE_A};
use serde::{Deserialize, Serialize};

/// An operator-supplied record to ensure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDirective {
    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default = "default_record_type")]
    pub record_type: String,

    #[serde(default)]
    pub proxied: bool,

    #[serde(default)]
    pub comment: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl Default for CreateDirective {
    fn default() -> Self {
        Self {
            content: String::new(),
            name: String::new(),
            record_type: default_record_type(),
            proxied: false,
            comment: String::new(),
            tags: Vec::new(),
            ttl: default_ttl(),
        }
    }
}

impl CreateDirective {
    /// A directive with empty content is treated as "not configured"
    pub fn is_present(&self) -> bool {
        !self.content.is_empty()
    }

    /// Synthesize a record with no id or zone; it has to be created
    pub fn to_record(&self) -> DnsRecord {
        DnsRecord {
            id: String::new(),
            zone_id: String::new(),
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            content: self.content.clone(),
            proxied: self.proxied,
            comment: Some(self.comment.clone()),
            tags: self.tags.clone(),
            ttl: self.ttl,
        }
    }
}

fn default_record_type() -> String {
    RECORD_TYPE_A.to_string()
}

// Cloudflare treats 1 as "automatic"
fn default_ttl() -> u32 {
    1
}
