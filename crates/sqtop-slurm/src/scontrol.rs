//! Query compute nodes via `scontrol show node`.

use crate::error::SlurmError;
use crate::query::QueryOptions;
use crate::types::ClusterNode;
use sqtop_parsers::{non_empty_string, parse_key_value_records, parse_memory_mb, run_command_nonempty};
use std::collections::BTreeMap;
use std::str::FromStr;
use tokio::process::Command;

/// Fetch the raw multi-line node dump.
pub async fn fetch_nodes(options: &QueryOptions) -> Result<String, SlurmError> {
    let mut cmd = Command::new("scontrol");
    cmd.args(["show", "node"]);
    Ok(run_command_nonempty(&mut cmd, "scontrol", options.timeout).await?)
}

/// Parse every node record. Records without a node name are dropped;
/// missing or non-numeric counts read as zero.
pub fn parse_nodes(text: &str) -> Vec<ClusterNode> {
    parse_key_value_records(text, "NodeName")
        .into_iter()
        .filter_map(|record| {
            let Some(name) = record.get("NodeName").and_then(|n| non_empty_string(n)) else {
                tracing::debug!("Dropping node record without NodeName");
                return None;
            };
            Some(ClusterNode {
                name,
                state: field(&record, "State"),
                partitions: field(&record, "Partitions")
                    .split(',')
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect(),
                cpus_total: number(&record, "CPUTot"),
                cpus_alloc: number(&record, "CPUAlloc"),
                mem_total_mb: memory(&record, "RealMemory"),
                mem_alloc_mb: memory(&record, "AllocMem"),
                cfg_tres: field(&record, "CfgTRES"),
                alloc_tres: field(&record, "AllocTRES"),
                gres: field(&record, "Gres"),
                gres_used: field(&record, "GresUsed"),
            })
        })
        .collect()
}

fn field(record: &BTreeMap<String, String>, key: &str) -> String {
    record
        .get(key)
        .and_then(|v| non_empty_string(v))
        .unwrap_or_default()
}

fn number<T: FromStr + Default>(record: &BTreeMap<String, String>, key: &str) -> T {
    record
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

fn memory(record: &BTreeMap<String, String>, key: &str) -> u64 {
    record.get(key).and_then(|v| parse_memory_mb(v)).unwrap_or(0)
}
