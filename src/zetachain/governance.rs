//! ZetaChain governance
//!
//! Proposals are seeded in memory at startup; votes update the tallies in place.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{DomainError, Result, ValidationError};
use crate::zetachain::validation::validate_address;
use crate::zetachain::{now_secs, stable_hash};

const DAY: i64 = 86_400;
const MIN_VOTING_POWER: u64 = 1_000;
const MAX_VOTING_POWER: u64 = 100_000;

/// A vote option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOption {
    Yes,
    No,
    Abstain,
}

impl VoteOption {
    pub fn parse(vote: &str) -> Option<Self> {
        match vote {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "abstain" => Some(Self::Abstain),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Abstain => "abstain",
        }
    }
}

/// Vote tallies of a proposal
#[derive(Debug, Clone, Default, Serialize)]
pub struct Votes {
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
}

impl Votes {
    fn total(&self) -> u64 {
        self.yes + self.no + self.abstain
    }

    fn add(&mut self, option: VoteOption, power: u64) {
        let slot = match option {
            VoteOption::Yes => &mut self.yes,
            VoteOption::No => &mut self.no,
            VoteOption::Abstain => &mut self.abstain,
        };
        *slot = slot.saturating_add(power);
    }

    fn percentages(&self) -> Option<Value> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let pct = |v: u64| format!("{:.1}%", v as f64 / total as f64 * 100.0);
        Some(json!({
            "yes": pct(self.yes),
            "no": pct(self.no),
            "abstain": pct(self.abstain),
        }))
    }
}

/// A governance proposal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub start_time: i64,
    pub end_time: i64,
    pub proposer: String,
    pub votes: Votes,
    pub total_voting_power: u64,
}

fn seed_proposals(now: i64) -> BTreeMap<String, Proposal> {
    let proposals = [
        Proposal {
            id: "prop_001".to_string(),
            title: "Increase ZETA Staking Rewards".to_string(),
            description: "Proposal to increase staking rewards from 10% to 12% APY".to_string(),
            status: "voting".to_string(),
            start_time: now - DAY,
            end_time: now + 7 * DAY,
            proposer: "0x1234567890123456789012345678901234567890".to_string(),
            votes: Votes {
                yes: 1_500_000,
                no: 200_000,
                abstain: 100_000,
            },
            total_voting_power: 1_800_000,
        },
        Proposal {
            id: "prop_002".to_string(),
            title: "Add New Cross-Chain Bridge".to_string(),
            description: "Proposal to add support for Avalanche bridge".to_string(),
            status: "passed".to_string(),
            start_time: now - 14 * DAY,
            end_time: now - 3 * DAY,
            proposer: "0x2345678901234567890123456789012345678901".to_string(),
            votes: Votes {
                yes: 2_000_000,
                no: 500_000,
                abstain: 200_000,
            },
            total_voting_power: 2_700_000,
        },
    ];

    proposals.into_iter().map(|p| (p.id.clone(), p)).collect()
}

/// Manages governance proposals and votes
pub struct GovernanceManager {
    proposals: RwLock<BTreeMap<String, Proposal>>,
}

impl Default for GovernanceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceManager {
    pub fn new() -> Self {
        Self {
            proposals: RwLock::new(seed_proposals(now_secs())),
        }
    }

    /// Proposals, optionally filtered by status, newest first
    pub async fn get_proposals(&self, status: Option<&str>) -> Result<Value> {
        let proposals = self.proposals.read().await;
        let mut list: Vec<&Proposal> = proposals
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .collect();
        list.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        Ok(json!({ "proposals": list, "count": list.len() }))
    }

    /// One proposal with its vote percentages
    pub async fn get_proposal(&self, proposal_id: &str) -> Result<Value> {
        let proposals = self.proposals.read().await;
        let proposal = proposals
            .get(proposal_id)
            .ok_or(DomainError::ProposalNotFound)?;

        let mut value = serde_json::to_value(proposal)?;
        if let (Some(pct), Some(obj)) = (proposal.votes.percentages(), value.as_object_mut()) {
            obj.insert("votePercentages".to_string(), pct);
        }

        Ok(json!({ "proposal": value }))
    }

    /// Cast a vote within the proposal's voting window
    pub async fn vote_on_proposal(
        &self,
        proposal_id: &str,
        voter_address: &str,
        vote: &str,
        voting_power: u64,
    ) -> Result<Value> {
        let mut proposals = self.proposals.write().await;
        let proposal = proposals
            .get_mut(proposal_id)
            .ok_or(DomainError::ProposalNotFound)?;

        if !validate_address(voter_address) {
            return Err(ValidationError::InvalidRoleAddress { role: "voter" }.into());
        }
        let option = VoteOption::parse(vote).ok_or(ValidationError::InvalidVote)?;

        let now = now_secs();
        if now > proposal.end_time {
            return Err(DomainError::VotingEnded.into());
        }
        if now < proposal.start_time {
            return Err(DomainError::VotingNotStarted.into());
        }

        proposal.votes.add(option, voting_power);
        proposal.total_voting_power = proposal.total_voting_power.saturating_add(voting_power);

        info!(voter = voter_address, vote, proposal_id, "Vote cast");
        Ok(json!({
            "message": "Vote cast successfully",
            "proposalId": proposal_id,
            "vote": option.as_str(),
            "votingPower": voting_power,
        }))
    }

    /// Voting power of an address, derived from the address itself
    pub async fn get_voting_power(&self, address: &str) -> Result<Value> {
        if !validate_address(address) {
            return Err(ValidationError::InvalidAddress.into());
        }

        let span = MAX_VOTING_POWER - MIN_VOTING_POWER + 1;
        let power = MIN_VOTING_POWER + stable_hash(&address.to_lowercase()) % span;

        Ok(json!({
            "votingPower": {
                "address": address,
                "power": power,
                "source": "staked ZETA tokens",
            }
        }))
    }

    /// Aggregate proposal counts
    pub async fn get_governance_stats(&self) -> Result<Value> {
        let proposals = self.proposals.read().await;
        let count = |status: &str| proposals.values().filter(|p| p.status == status).count();

        let total = proposals.len();
        let total_voting_power: u64 = proposals.values().map(|p| p.total_voting_power).sum();
        let average = total_voting_power / total.max(1) as u64;

        Ok(json!({
            "stats": {
                "totalProposals": total,
                "activeProposals": count("voting"),
                "passedProposals": count("passed"),
                "failedProposals": count("failed"),
                "totalVotingPower": total_voting_power,
                "averageParticipation": average,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOTER: &str = "0x1234567890123456789012345678901234567890";

    #[tokio::test]
    async fn test_proposals_newest_first() {
        let gov = GovernanceManager::new();
        let all = gov.get_proposals(None).await.unwrap();
        assert_eq!(all["count"], 2);
        assert_eq!(all["proposals"][0]["id"], "prop_001");

        let passed = gov.get_proposals(Some("passed")).await.unwrap();
        assert_eq!(passed["count"], 1);
        assert_eq!(passed["proposals"][0]["id"], "prop_002");

        let none = gov.get_proposals(Some("failed")).await.unwrap();
        assert_eq!(none["count"], 0);
    }

    #[tokio::test]
    async fn test_proposal_percentages() {
        let gov = GovernanceManager::new();
        let result = gov.get_proposal("prop_001").await.unwrap();
        assert_eq!(result["proposal"]["votePercentages"]["yes"], "83.3%");
        assert_eq!(result["proposal"]["votePercentages"]["no"], "11.1%");
        assert_eq!(result["proposal"]["votePercentages"]["abstain"], "5.6%");

        let err = gov.get_proposal("prop_999").await.unwrap_err();
        assert_eq!(err.to_string(), "Proposal not found");
    }

    #[tokio::test]
    async fn test_vote() {
        let gov = GovernanceManager::new();
        let result = gov.vote_on_proposal("prop_001", VOTER, "yes", 500).await.unwrap();
        assert_eq!(result["votingPower"], 500);

        let proposal = gov.get_proposal("prop_001").await.unwrap();
        assert_eq!(proposal["proposal"]["votes"]["yes"], 1_500_500);
        assert_eq!(proposal["proposal"]["totalVotingPower"], 1_800_500);
    }

    #[tokio::test]
    async fn test_vote_rejections() {
        let gov = GovernanceManager::new();
        let cases = [
            ("prop_999", VOTER, "yes", "Proposal not found"),
            ("prop_001", "0x12", "yes", "Invalid voter address"),
            ("prop_001", VOTER, "maybe", "Invalid vote option"),
            ("prop_002", VOTER, "no", "Voting period has ended"),
        ];
        for (id, voter, vote, expected) in cases {
            let err = gov.vote_on_proposal(id, voter, vote, 1).await.unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_voting_power_is_stable() {
        let gov = GovernanceManager::new();
        let a = gov.get_voting_power(VOTER).await.unwrap();
        let b = gov.get_voting_power(VOTER).await.unwrap();
        assert_eq!(a, b);
        let power = a["votingPower"]["power"].as_u64().unwrap();
        assert!((MIN_VOTING_POWER..=MAX_VOTING_POWER).contains(&power));
        assert!(gov.get_voting_power("bad").await.is_err());
    }

    #[tokio::test]
    async fn test_stats() {
        let gov = GovernanceManager::new();
        let stats = gov.get_governance_stats().await.unwrap();
        assert_eq!(stats["stats"]["totalProposals"], 2);
        assert_eq!(stats["stats"]["activeProposals"], 1);
        assert_eq!(stats["stats"]["totalVotingPower"], 4_500_000);
        assert_eq!(stats["stats"]["averageParticipation"], 2_250_000);
    }
}
