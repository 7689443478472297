//! Query fair-share priorities via sshare.

use crate::error::SlurmError;
use crate::query::QueryOptions;
use crate::types::PriorityRow;
use sqtop_parsers::{parse_delimited_rows, rank_labels, run_command_nonempty};
use tokio::process::Command;

pub const SSHARE_FORMAT: &str = "Account,User,RawShares,NormShares,RawUsage,FairShare";
const SSHARE_FIELDS: usize = 6;

/// Fetch the raw association tree.
pub async fn fetch_priorities(options: &QueryOptions) -> Result<String, SlurmError> {
    let mut cmd = Command::new("sshare");
    cmd.args(["-a", "-P", "-o", SSHARE_FORMAT]);
    Ok(run_command_nonempty(&mut cmd, "sshare", options.timeout).await?)
}

/// Parse user associations, ranked by descending fair-share.
///
/// Account-level rows (no user) are skipped, as are rows whose numeric
/// columns do not parse.
pub fn parse_priorities(text: &str) -> Vec<PriorityRow> {
    let mut rows: Vec<PriorityRow> = parse_delimited_rows(text, '|', SSHARE_FIELDS)
        .into_iter()
        .filter(|fields| !fields[1].is_empty())
        .filter_map(|fields| {
            let parsed = (
                fields[3].parse::<f64>(),
                fields[4].parse::<u64>(),
                fields[5].parse::<f64>(),
            );
            let (Ok(norm_shares), Ok(raw_usage), Ok(fairshare)) = parsed else {
                tracing::debug!("Dropping sshare row with bad numbers: {:?}", fields);
                return None;
            };
            Some(PriorityRow {
                account: fields[0].to_string(),
                user: fields[1].to_string(),
                raw_shares: fields[2].to_string(),
                norm_shares,
                raw_usage,
                fairshare,
                rank: String::new(),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.fairshare
            .total_cmp(&a.fairshare)
            .then_with(|| a.user.cmp(&b.user))
            .then_with(|| a.account.cmp(&b.account))
    });

    let scores: Vec<f64> = rows.iter().map(|row| row.fairshare).collect();
    for (row, rank) in rows.iter_mut().zip(rank_labels(&scores)) {
        row.rank = rank;
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const SSHARE: &str = "\
Account|User|RawShares|NormShares|RawUsage|FairShare
root||||12000|
 root|root|1|0.500000|0|1.000000
 lab||1|0.500000|12000|
  lab|alice|1|0.250000|8000|0.700000
  lab|bob|1|0.250000|4000|0.900000
  lab|carol|1|0.250000|4000|0.700000
  lab|dave|parent|0.250000|bad|0.100000
";

    #[test]
    fn test_parse_priorities_ranked() {
        let rows = parse_priorities(SSHARE);
        let users: Vec<&str> = rows.iter().map(|r| r.user.as_str()).collect();
        assert_eq!(users, vec!["root", "bob", "alice", "carol"]);

        let ranks: Vec<&str> = rows.iter().map(|r| r.rank.as_str()).collect();
        assert_eq!(ranks, vec!["1/4", "2/4", "3/4", "3/4"]);
    }

    #[test]
    fn test_parse_priorities_fields() {
        let rows = parse_priorities(SSHARE);
        let bob = rows.iter().find(|r| r.user == "bob").unwrap();
        assert_eq!(bob.account, "lab");
        assert_eq!(bob.raw_shares, "1");
        assert_eq!(bob.raw_usage, 4000);
        assert!((bob.norm_shares - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_priorities_empty() {
        assert!(parse_priorities("").is_empty());
        assert!(parse_priorities("Account|User|RawShares|NormShares|RawUsage|FairShare\n").is_empty());
    }
}
