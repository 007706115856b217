//! Multi-agent planner: every agent proposes, the aggregator decides.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

use tplus_core::allocation::{aggregate, AgentDecision, RiskLimits};
use tplus_core::domain::{MarketSession, PortfolioSummary, TargetWeights};
use tplus_core::engine::AllocationPlanner;
use tplus_core::proposal::{MarketSnapshot, MomentumScorer, ProposalGenerator, ProposalRequest};

use crate::config::{ConfigError, RunConfig};
use crate::llm::{LlmProposer, ModelClient, PromptBuilder};

struct Member {
    generator: Box<dyn ProposalGenerator>,
    weight: f64,
}

/// Planner that consults a set of proposal generators.
///
/// The market snapshot is built once per date and shared by all agents,
/// which run in parallel. Decisions are gathered in agent order so the
/// aggregate is identical from run to run.
pub struct Ensemble {
    members: Vec<Member>,
    risk_limits: RiskLimits,
}

impl Ensemble {
    pub fn new(risk_limits: RiskLimits) -> Self {
        Self {
            members: Vec::new(),
            risk_limits,
        }
    }

    /// Add an agent whose proposals are scaled by `weight`.
    pub fn with_agent(mut self, generator: Box<dyn ProposalGenerator>, weight: f64) -> Self {
        self.members.push(Member { generator, weight });
        self
    }

    /// One rule-based momentum agent.
    pub fn demo(risk_limits: RiskLimits) -> Self {
        Self::new(risk_limits).with_agent(Box::new(MomentumScorer::default()), 1.0)
    }

    /// One LLM agent per configured `[[agents]]` entry, all sharing `client`.
    pub fn from_config(config: &RunConfig, client: Arc<dyn ModelClient>) -> Result<Self, ConfigError> {
        let mut ensemble = Self::new(config.risk);
        for spec in &config.agents {
            let prompt = match &spec.prompt_path {
                Some(path) => PromptBuilder::from_file(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?,
                None => PromptBuilder::default(),
            };
            let proposer = LlmProposer::new(
                spec.clone(),
                prompt,
                Arc::clone(&client),
                config.model.max_payload_chars,
            );
            ensemble = ensemble.with_agent(Box::new(proposer), spec.weight);
        }
        Ok(ensemble)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn risk_limits(&self) -> &RiskLimits {
        &self.risk_limits
    }

    /// Every agent's raw decision for one snapshot, in agent order.
    pub fn decisions(
        &self,
        snapshot: &MarketSnapshot,
        portfolio: &PortfolioSummary,
    ) -> Vec<AgentDecision> {
        let request = ProposalRequest {
            date: snapshot.date,
            snapshot,
            portfolio,
            risk_limits: &self.risk_limits,
        };
        self.members
            .par_iter()
            .map(|member| {
                let allocations = member.generator.propose(&request);
                debug!(
                    agent = member.generator.name(),
                    date = %snapshot.date,
                    symbols = allocations.len(),
                    "proposal received"
                );
                AgentDecision::new(member.generator.name(), member.weight, allocations)
            })
            .collect()
    }
}

impl AllocationPlanner for Ensemble {
    fn target_weights(&self, session: &MarketSession, portfolio: &PortfolioSummary) -> TargetWeights {
        let snapshot = MarketSnapshot::from_session(session);
        let decisions = self.decisions(&snapshot, portfolio);
        aggregate(&decisions, &self.risk_limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use crate::config::AgentSpec;
    use crate::llm::ModelError;
    use tplus_core::domain::{Allocation, PortfolioState};

    struct Fixed {
        name: &'static str,
        allocations: Allocation,
    }

    impl ProposalGenerator for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn propose(&self, _request: &ProposalRequest<'_>) -> Allocation {
            self.allocations.clone()
        }
    }

    fn fixed(name: &'static str, pairs: &[(&str, f64)]) -> Box<dyn ProposalGenerator> {
        Box::new(Fixed {
            name,
            allocations: pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect(),
        })
    }

    fn empty_session() -> MarketSession {
        MarketSession::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), BTreeMap::new())
    }

    #[test]
    fn unanimous_single_symbol_is_capped() {
        let ensemble = Ensemble::new(RiskLimits::default())
            .with_agent(fixed("a", &[("600519", 1.0)]), 1.0)
            .with_agent(fixed("b", &[("600519", 1.0)]), 1.0);
        let summary = PortfolioState::new(1.0).summary();
        let weights = ensemble.target_weights(&empty_session(), &summary);
        assert_eq!(weights.len(), 1);
        assert!((weights["600519"] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn decisions_keep_agent_order_and_weight() {
        let ensemble = Ensemble::new(RiskLimits::default())
            .with_agent(fixed("growth", &[("A", 0.5)]), 2.0)
            .with_agent(fixed("value", &[]), 1.0)
            .with_agent(fixed("risk", &[("B", 0.1)]), 0.5);
        let snapshot = MarketSnapshot::from_session(&empty_session());
        let summary = PortfolioState::new(1.0).summary();
        let decisions = ensemble.decisions(&snapshot, &summary);
        let names: Vec<&str> = decisions.iter().map(|d| d.agent.as_str()).collect();
        assert_eq!(names, vec!["growth", "value", "risk"]);
        assert_eq!(decisions[0].weight, 2.0);
        assert!(decisions[1].allocations.is_empty());
    }

    #[test]
    fn all_empty_proposals_mean_all_cash() {
        let ensemble = Ensemble::new(RiskLimits::default())
            .with_agent(fixed("a", &[]), 1.0)
            .with_agent(fixed("b", &[]), 1.0);
        let summary = PortfolioState::new(1.0).summary();
        assert!(ensemble.target_weights(&empty_session(), &summary).is_empty());
    }

    struct Echo;

    impl ModelClient for Echo {
        fn complete(&self, agent: &AgentSpec, _prompt: &str) -> Result<String, ModelError> {
            match agent.name.as_str() {
                "growth" => Ok(r#"{"allocations": {"A": 0.6, "B": 0.4}}"#.into()),
                "value" => Ok("```json\n{\"allocations\": {\"B\": 1.0}}\n```".into()),
                _ => Err(ModelError::Status(500)),
            }
        }
    }

    #[test]
    fn configured_agents_share_one_client() {
        let config = RunConfig::default();
        let ensemble = Ensemble::from_config(&config, Arc::new(Echo)).unwrap();
        assert_eq!(ensemble.len(), 3);

        let snapshot = MarketSnapshot::from_session(&empty_session());
        let summary = PortfolioState::new(1.0).summary();
        let decisions = ensemble.decisions(&snapshot, &summary);
        assert_eq!(decisions[0].allocations.len(), 2);
        assert_eq!(decisions[1].allocations["B"], 1.0);
        // The failing risk agent abstains.
        assert!(decisions[2].allocations.is_empty());

        let weights = ensemble.target_weights(&empty_session(), &summary);
        assert_eq!(weights.len(), 2);
        assert!(weights.values().all(|w| (w - 0.2).abs() < 1e-12));
    }

    #[test]
    fn missing_prompt_file_is_a_config_error() {
        let mut config = RunConfig::default();
        config.agents[0].prompt_path = Some("/nonexistent/prompt.md".into());
        assert!(matches!(
            Ensemble::from_config(&config, Arc::new(Echo)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn demo_has_one_momentum_agent() {
        let ensemble = Ensemble::demo(RiskLimits::default());
        assert_eq!(ensemble.len(), 1);
        let summary = PortfolioState::new(1.0).summary();
        assert!(ensemble.target_weights(&empty_session(), &summary).is_empty());
    }

    #[test]
    fn no_agents_mean_all_cash() {
        let ensemble = Ensemble::new(RiskLimits::default());
        assert!(ensemble.is_empty());
        let summary = PortfolioState::new(1.0).summary();
        assert!(ensemble.target_weights(&empty_session(), &summary).is_empty());
    }
}
