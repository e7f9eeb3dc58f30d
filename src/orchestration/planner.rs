//! # Dispatch Planning
//!
//! [`DispatchPlanner`] is the strategy seam between discovery and execution: given the
//! request and the peers resolved for this run, it returns the ordered steps the
//! orchestrator executes verbatim. [`KeywordPlanner`] is the rule-based implementation.
//!
//! ## Keyword matching
//!
//! A rule is *recognized* when the lower-cased request text contains one of its request
//! keywords, or a category hint names the rule or one of its category tags. A peer
//! *matches* a recognized rule when its capability text contains one of the rule's
//! capability keywords. Every peer is assigned to the first matching rule in priority
//! order and appears in at most one step. Steps are ordered by rule priority, then by
//! peer discovery order.

use tracing::debug;

use super::types::PlanningError;
use crate::config::{ExecutionConfig, PlanningConfig, PlanningRule};
use crate::constants::defaults;
use crate::models::{DispatchRequest, DispatchStep, PeerDescriptor};

/// Planning strategy. Implementations must be deterministic for equal inputs.
pub trait DispatchPlanner: Send + Sync {
    /// Build the ordered plan for `request` against the resolved `peers`.
    ///
    /// Fails with [`PlanningError::NoPeersAvailable`] when `peers` is empty. An empty plan
    /// means no peer matched a recognized need.
    fn plan(
        &self,
        task_id: &str,
        request: &DispatchRequest,
        peers: &[PeerDescriptor],
    ) -> Result<Vec<DispatchStep>, PlanningError>;
}

/// Reject a plan with a step whose target is not one of the resolved `peers`
pub fn ensure_resolved_targets(
    steps: &[DispatchStep],
    peers: &[PeerDescriptor],
) -> Result<(), PlanningError> {
    match steps
        .iter()
        .find(|step| !peers.iter().any(|peer| peer.address == step.target.address))
    {
        Some(step) => Err(PlanningError::UnresolvedTarget {
            step_id: step.step_id.clone(),
            address: step.target.address.clone(),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct KeywordPlanner {
    /// Sorted by priority; equal priorities keep configuration order
    rules: Vec<PlanningRule>,
    message_template: String,
}

impl KeywordPlanner {
    pub fn new(rules: Vec<PlanningRule>, message_template: impl Into<String>) -> Self {
        let mut rules = rules;
        rules.sort_by_key(|rule| rule.priority);
        Self {
            rules,
            message_template: message_template.into(),
        }
    }

    pub fn from_config(planning: &PlanningConfig, execution: &ExecutionConfig) -> Self {
        Self::new(planning.rules.clone(), execution.message_template.clone())
    }

    pub fn rules(&self) -> &[PlanningRule] {
        &self.rules
    }

    /// Rules the request asks for, in priority order
    pub fn recognized_rules(&self, request: &DispatchRequest) -> Vec<&PlanningRule> {
        let text = request.text.to_lowercase();
        let categories: Vec<String> = request
            .hints
            .categories
            .iter()
            .map(|category| category.trim().to_lowercase())
            .filter(|category| !category.is_empty())
            .collect();

        self.rules
            .iter()
            .filter(|rule| {
                let by_text = rule
                    .request_keywords
                    .iter()
                    .any(|keyword| contains_keyword(&text, keyword));
                let by_category = categories.iter().any(|category| {
                    category == &rule.name.to_lowercase()
                        || rule
                            .categories
                            .iter()
                            .any(|tag| category == &tag.trim().to_lowercase())
                });
                by_text || by_category
            })
            .collect()
    }

    /// Outbound payload for this request
    pub fn render_message(&self, request: &DispatchRequest) -> String {
        let mut message = self
            .message_template
            .replace(defaults::REQUEST_PLACEHOLDER, request.text.trim());
        if let Some(location) = request.location() {
            message.push_str("\nLocation: ");
            message.push_str(location);
        }
        message
    }
}

impl Default for KeywordPlanner {
    fn default() -> Self {
        Self::new(PlanningRule::builtin(), defaults::MESSAGE_TEMPLATE)
    }
}

impl DispatchPlanner for KeywordPlanner {
    fn plan(
        &self,
        task_id: &str,
        request: &DispatchRequest,
        peers: &[PeerDescriptor],
    ) -> Result<Vec<DispatchStep>, PlanningError> {
        if peers.is_empty() {
            return Err(PlanningError::NoPeersAvailable);
        }

        let recognized = self.recognized_rules(request);
        if recognized.is_empty() {
            debug!(task_id, "No planning rule recognized in request");
            return Ok(Vec::new());
        }

        // (rule position in priority order, discovery index, rule, peer)
        let mut assignments: Vec<(usize, usize, &PlanningRule, &PeerDescriptor)> = peers
            .iter()
            .enumerate()
            .filter_map(|(discovery_index, peer)| {
                let capabilities = peer.capability_text();
                recognized
                    .iter()
                    .enumerate()
                    .find(|(_, rule)| {
                        rule.capability_keywords
                            .iter()
                            .any(|keyword| contains_keyword(&capabilities, keyword))
                    })
                    .map(|(rank, rule)| (rank, discovery_index, *rule, peer))
            })
            .collect();
        assignments.sort_by_key(|(rank, discovery_index, _, _)| (*rank, *discovery_index));

        let message = self.render_message(request);
        let steps: Vec<DispatchStep> = assignments
            .into_iter()
            .enumerate()
            .map(|(ordinal, (_, _, rule, peer))| {
                DispatchStep::new(task_id, ordinal, &rule.name, peer.to_ref(), message.clone())
            })
            .collect();

        debug!(
            task_id,
            recognized = recognized.len(),
            steps = steps.len(),
            "Dispatch plan built"
        );
        Ok(steps)
    }
}

fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    let keyword = keyword.trim().to_lowercase();
    !keyword.is_empty() && haystack.contains(&keyword)
}
