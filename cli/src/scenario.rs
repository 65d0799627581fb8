//! Scripted pool runs against in-memory collaborators.
//!
//! A scenario seeds external balances, then replays a list of timed calls.
//! Every committed event is written as one JSON line; failed steps are
//! written as `{"step": n, "error": ...}` lines.

use commons_ledger::MemoryShareLedger;
use commons_nullables::NullBank;
use commons_treasury::{Call, NewRequest, Pool, PoolConfig, PoolError, RequestId};
use commons_types::{Address, AssetId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

pub type SimPool = Pool<MemoryShareLedger, NullBank>;

#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    pub admin: Address,
    #[serde(default)]
    pub funds: Vec<Funding>,
    pub steps: Vec<Step>,
}

/// Balance granted to an external holder before the first step.
#[derive(Clone, Debug, Deserialize)]
pub struct Funding {
    pub holder: Address,
    pub asset: AssetId,
    pub amount: u128,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Step {
    /// Clock reading, in seconds, when the call is made.
    pub at: u64,
    pub caller: Address,
    /// Native value attached to the call.
    #[serde(default)]
    pub value: u128,
    pub op: Op,
    /// The step is supposed to fail.
    #[serde(default)]
    pub expect_error: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Whitelist { address: Address },
    BatchWhitelist { addresses: Vec<Address> },
    AddGuardian { address: Address },
    RemoveGuardian { address: Address },
    ToggleOpen,
    Deposit {
        #[serde(default)]
        amount: u128,
    },
    Withdraw { shares: u128 },
    CreateRequest(NewRequest),
    Vote { id: RequestId, support: bool },
    Finalize { id: RequestId },
    GuardianApprove { id: RequestId },
    Execute { id: RequestId },
    Repay { id: RequestId, amount: u128 },
    CompleteRequest { id: RequestId },
    MarkDefaulted { id: RequestId },
    CancelRequest { id: RequestId },
    DistributeRewards { asset: AssetId, amount: u128 },
    ClaimRewards { asset: AssetId },
}

/// Outcome of a whole run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    pub steps: usize,
    pub events: usize,
    /// Steps whose outcome differed from `expect_error`.
    pub unexpected: Vec<usize>,
    pub total_deposited: u128,
    pub available_funds: u128,
    pub request_count: usize,
    pub active_members: usize,
}

impl Scenario {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Replay `scenario` on a fresh pool built from `config`.
pub fn run(config: PoolConfig, scenario: &Scenario, out: &mut impl Write) -> anyhow::Result<Report> {
    let mut bank = NullBank::new();
    for funding in &scenario.funds {
        bank.fund(&funding.asset, &funding.holder, funding.amount);
    }
    let mut pool = Pool::new(config, scenario.admin.clone(), MemoryShareLedger::new(), bank)?;

    let mut unexpected = Vec::new();
    for (index, step) in scenario.steps.iter().enumerate() {
        let call = Call::new(step.caller.clone(), Timestamp::new(step.at)).with_value(step.value);
        let seen = pool.history().len();
        match apply(&mut pool, &call, &step.op) {
            Ok(result) => {
                debug!(step = index, %result, "step applied");
                if step.expect_error {
                    warn!(step = index, "step succeeded but was expected to fail");
                    unexpected.push(index);
                }
                for event in &pool.history()[seen..] {
                    writeln!(out, "{}", serde_json::to_string(event)?)?;
                }
            }
            Err(err) => {
                if !step.expect_error {
                    warn!(step = index, error = %err, "step failed");
                    unexpected.push(index);
                }
                let line = json!({
                    "step": index,
                    "error": err.to_string(),
                    "kind": format!("{:?}", err.kind()),
                });
                writeln!(out, "{line}")?;
            }
        }
    }

    Ok(Report {
        steps: scenario.steps.len(),
        events: pool.history().len(),
        unexpected,
        total_deposited: pool.total_deposited(),
        available_funds: pool.available_funds(),
        request_count: pool.request_count(),
        active_members: pool.active_member_count(),
    })
}

fn apply(pool: &mut SimPool, call: &Call, op: &Op) -> Result<Value, PoolError> {
    let result = match op {
        Op::Whitelist { address } => json!(pool.whitelist(call, address)?),
        Op::BatchWhitelist { addresses } => json!(pool.batch_whitelist(call, addresses)?),
        Op::AddGuardian { address } => json!(pool.add_guardian(call, address)?),
        Op::RemoveGuardian { address } => json!(pool.remove_guardian(call, address)?),
        Op::ToggleOpen => json!(pool.toggle_open(call)?),
        Op::Deposit { amount } => json!(pool.deposit(call, *amount)?.to_string()),
        Op::Withdraw { shares } => json!(pool.withdraw(call, *shares)?.to_string()),
        Op::CreateRequest(params) => json!(pool.create_request(call, params.clone())?),
        Op::Vote { id, support } => json!(pool.vote(call, *id, *support)?),
        Op::Finalize { id } => json!(pool.finalize(call, *id)?),
        Op::GuardianApprove { id } => json!(pool.guardian_approve(call, *id)?),
        Op::Execute { id } => json!(pool.execute(call, *id)?),
        Op::Repay { id, amount } => json!(pool.repay(call, *id, *amount)?.to_string()),
        Op::CompleteRequest { id } => json!(pool.complete_request(call, *id)?),
        Op::MarkDefaulted { id } => json!(pool.mark_defaulted(call, *id)?),
        Op::CancelRequest { id } => json!(pool.cancel_request(call, *id)?),
        Op::DistributeRewards { asset, amount } => {
            json!(pool.distribute_rewards(call, asset, *amount)?.to_string())
        }
        Op::ClaimRewards { asset } => json!(pool.claim_rewards(call, asset)?.to_string()),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons_treasury::PoolEvent;

    const DEMO_CONFIG: &str = include_str!("../demos/garden.toml");
    const DEMO_SCENARIO: &str = include_str!("../demos/two_members.json");

    #[test]
    fn demo_scenario_runs_as_scripted() {
        let config = PoolConfig::from_toml_str(DEMO_CONFIG).unwrap();
        let scenario: Scenario = serde_json::from_str(DEMO_SCENARIO).unwrap();
        let mut out = Vec::new();

        let report = run(config, &scenario, &mut out).unwrap();

        assert!(report.unexpected.is_empty(), "unexpected: {:?}", report.unexpected);
        assert_eq!(report.steps, scenario.steps.len());
        assert_eq!(report.total_deposited, 900);
        assert_eq!(report.request_count, 2);
        assert_eq!(report.active_members, 2);

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), report.events + 1);
        assert!(lines.iter().any(|l| l["kind"] == "StateViolation"));
        assert_eq!(lines.last().unwrap()["event"], "rewards_claimed");
    }

    #[test]
    fn failing_step_is_reported_unless_expected() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "admin": "steward",
                "steps": [
                    { "at": 0, "caller": "mallory", "op": "toggle_open" },
                    { "at": 0, "caller": "steward", "op": "toggle_open" },
                    { "at": 1, "caller": "steward", "op": { "withdraw": { "shares": 1 } }, "expect_error": true }
                ]
            }"#,
        )
        .unwrap();
        let config = PoolConfig::new("test", AssetId::Native);
        let mut out = Vec::new();
        let report = run(config, &scenario, &mut out).unwrap();

        assert_eq!(report.unexpected, vec![0]);
        assert_eq!(report.events, 1);
        let text = String::from_utf8(out).unwrap();
        let toggled: PoolEvent = serde_json::from_str(text.lines().nth(1).unwrap()).unwrap();
        assert_eq!(toggled, PoolEvent::PoolToggled { open: false });
    }
}
