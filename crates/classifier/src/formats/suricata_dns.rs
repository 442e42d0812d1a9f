//! Suricata parser for the DNS event type in the EVE JSON output.
//!
//! Reference: https://suricata.readthedocs.io/en/latest/output/eve/eve-json-output.html

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ParseError, ParseOutcome, ParsedEvent};
use crate::traits::LogParser;
use crate::MAX_LINE_SIZE;

pub const LOG_TYPE: &str = "Suricata.DNS";

/// Configuration for the EVE DNS parser
#[derive(Debug, Clone)]
pub struct SuricataDnsConfig {
    /// Maximum event size to prevent DoS with oversized records (default: 1MB)
    pub max_event_size: usize,
}

impl Default for SuricataDnsConfig {
    fn default() -> Self {
        Self {
            max_event_size: MAX_LINE_SIZE,
        }
    }
}

/// Parser for Suricata EVE DNS records.
///
/// EVE multiplexes many event types over one output file, so a record whose
/// `event_type` is anything but `"dns"` is a recognition failure here and
/// gets routed to the parser for that type instead.
pub struct SuricataDnsParser {
    config: SuricataDnsConfig,
}

impl SuricataDnsParser {
    pub fn new() -> Self {
        Self {
            config: SuricataDnsConfig::default(),
        }
    }

    pub fn with_config(config: SuricataDnsConfig) -> Self {
        Self { config }
    }
}

impl Default for SuricataDnsParser {
    fn default() -> Self {
        Self::new()
    }
}

/// One EVE DNS record. Required fields are non-`Option`, so
/// deserialization doubles as validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DnsEvent {
    timestamp: String,
    event_type: String,
    src_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    src_port: Option<u16>,
    dest_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dest_port: Option<u16>,
    proto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    flow_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    community_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pcap_cnt: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pcap_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vlan: Option<Vec<u32>>,
    dns: DnsDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DnsDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    record_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    qr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aa: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ra: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rrname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rrtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answers: Option<Vec<DnsAnswer>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DnsAnswer {
    #[serde(skip_serializing_if = "Option::is_none")]
    rrname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rrtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rdata: Option<String>,
}

impl LogParser for SuricataDnsParser {
    fn parse_log(&self, line: &str) -> Result<ParseOutcome, ParseError> {
        if line.len() > self.config.max_event_size {
            return Err(ParseError::LineTooLarge(line.len(), self.config.max_event_size));
        }

        // Quick reject: EVE records are JSON objects.
        if !line.starts_with('{') || !line.ends_with('}') {
            return Err(ParseError::InvalidFormat("not a JSON object".to_string()));
        }

        let event: DnsEvent = serde_json::from_str(line)
            .map_err(|e| ParseError::ParseFailed(format!("invalid EVE JSON: {e}")))?;

        if event.event_type != "dns" {
            return Err(ParseError::InvalidFormat(format!(
                "unexpected event_type {:?}",
                event.event_type
            )));
        }

        let timestamp = parse_eve_timestamp(&event.timestamp);
        let payload = serde_json::to_value(&event)
            .map_err(|e| ParseError::ParseFailed(format!("re-encoding failed: {e}")))?;

        let mut parsed = ParsedEvent::new(LOG_TYPE, payload)
            .with_raw(Bytes::copy_from_slice(line.as_bytes()));
        if let Some(ts) = timestamp {
            parsed = parsed.with_timestamp(ts);
        }
        Ok(ParseOutcome::Batch(vec![parsed]))
    }

    fn log_type(&self) -> &str {
        LOG_TYPE
    }
}

/// EVE timestamps use a numeric UTC offset without a colon
/// (`2021-02-14T13:44:00.123456+0000`), which strict RFC 3339 parsing
/// rejects. Extraction is best-effort; an unparseable timestamp does not
/// fail the record.
fn parse_eve_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
