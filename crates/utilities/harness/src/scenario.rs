//! Built-in test scenarios.

use async_trait::async_trait;
use tokenrig_primitives::{ReadCall, TokenParams, U256, WriteReceipt};

use crate::{Harness, HarnessError, Observation, TokenHandle};

/// Observations and receipts collected by one scenario run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    /// The deployed token, once deployment succeeded.
    pub token: Option<TokenHandle>,
    /// Reads in issue order.
    pub observations: Vec<Observation>,
    /// Mined writes in issue order.
    pub receipts: Vec<WriteReceipt>,
}

impl ScenarioReport {
    /// Block numbers of every read and write, in issue order.
    pub fn blocks(&self) -> Vec<u64> {
        let deployed = self.token.iter().map(|token| token.block_number);
        deployed
            .chain(self.observations.iter().map(|o| o.block_number))
            .chain(self.receipts.iter().map(|r| r.block_number))
            .collect()
    }
}

/// A test group run against one freshly started harness.
///
/// The caller starts the backend and stops it afterwards; a scenario deploys
/// its own token and drives it.
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Whether the naming registry must be resolved before [`run`](Self::run).
    fn requires_naming(&self) -> bool {
        false
    }

    /// Runs the scenario.
    async fn run(&self, harness: &mut Harness) -> Result<ScenarioReport, HarnessError>;
}

/// Deploys a token and checks its metadata.
///
/// `name()` and `symbol()` must echo the constructor arguments, `decimals()`
/// must render the precision, and the initial supply must be zero.
#[derive(Debug, Clone)]
pub struct MetadataScenario {
    params: TokenParams,
}

impl MetadataScenario {
    /// Scenario over custom constructor parameters.
    pub const fn new(params: TokenParams) -> Self {
        Self { params }
    }
}

impl Default for MetadataScenario {
    fn default() -> Self {
        Self::new(TokenParams::new("ERC20 Compatible Reference Token", "XRT20", 18))
    }
}

#[async_trait]
impl Scenario for MetadataScenario {
    fn name(&self) -> &str {
        "token metadata"
    }

    fn requires_naming(&self) -> bool {
        true
    }

    async fn run(&self, harness: &mut Harness) -> Result<ScenarioReport, HarnessError> {
        let token = harness.deploy_token(self.params.clone()).await?;
        let mut report = ScenarioReport { token: Some(token.clone()), ..Default::default() };

        let decimals = self.params.decimals.to_string();
        let checks = [
            (ReadCall::Name, self.params.name.as_str()),
            (ReadCall::Symbol, self.params.symbol.as_str()),
            (ReadCall::Decimals, decimals.as_str()),
            (ReadCall::TotalSupply, "0"),
        ];
        for (call, expected) in checks {
            report.observations.push(harness.expect(&token, call, expected).await?);
        }
        Ok(report)
    }
}

/// Mints to a fresh account and checks balances before and after.
///
/// The mint is awaited before the post-mint reads are issued. A read pinned
/// to the deployment block must still see the pre-mint supply.
#[derive(Debug, Clone)]
pub struct MintScenario {
    params: TokenParams,
    recipient_index: usize,
    amount: U256,
}

impl MintScenario {
    /// Scenario minting `amount` to the account at `recipient_index`.
    pub const fn new(params: TokenParams, recipient_index: usize, amount: U256) -> Self {
        Self { params, recipient_index, amount }
    }
}

impl Default for MintScenario {
    fn default() -> Self {
        Self::new(TokenParams::new("Reference Token", "XRT", 18), 1, U256::from(10))
    }
}

#[async_trait]
impl Scenario for MintScenario {
    fn name(&self) -> &str {
        "owner mint"
    }

    async fn run(&self, harness: &mut Harness) -> Result<ScenarioReport, HarnessError> {
        let token = harness.deploy_token(self.params.clone()).await?;
        let recipient = harness.account(self.recipient_index)?;
        let mut report = ScenarioReport { token: Some(token.clone()), ..Default::default() };

        let balance = ReadCall::BalanceOf(recipient);
        report.observations.push(harness.expect(&token, balance, "0").await?);
        report.observations.push(harness.expect(&token, ReadCall::TotalSupply, "0").await?);

        let receipt = harness.owner_mint(&token, recipient, self.amount).await?;
        report.receipts.push(receipt);

        let minted = self.amount.to_string();
        report.observations.push(harness.expect(&token, balance, &minted).await?);
        report.observations.push(harness.expect(&token, ReadCall::TotalSupply, &minted).await?);

        let before = harness.read_at(&token, ReadCall::TotalSupply, token.block_number).await?;
        if before.value != "0" {
            return Err(HarnessError::Assertion {
                call: format!("{} at block {}", before.call, before.block_number),
                expected: "0".to_string(),
                actual: before.value,
            });
        }
        report.observations.push(before);
        Ok(report)
    }
}
