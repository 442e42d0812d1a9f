/// Individual log format parsers
pub mod cloudtrail;
pub mod suricata_dns;

// Re-export parser implementations
pub use cloudtrail::CloudTrailParser;
pub use suricata_dns::SuricataDnsParser;
