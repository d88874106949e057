//! The render-attempt lifecycle: validate, reserve, invoke, settle.

use mmdc_mcp_config::{Config, MermaidSettings};
use serde_json::Value;
use std::sync::Arc;

use crate::command::{CommandExecutor, SystemExecutor};
use crate::fingerprint::Fingerprint;
use crate::invoker::RenderInvoker;
use crate::ledger::AttemptLedger;
use crate::outcome::RenderOutcome;
use crate::publisher::{LocatorBuilder, TokenUrlLocator};
use crate::request::RenderRequest;

/// Owns the attempt ledger and the invoker. Shared by every worker thread.
pub struct DiagramService {
    settings: MermaidSettings,
    ledger: Arc<AttemptLedger>,
    invoker: RenderInvoker,
}

impl DiagramService {
    pub fn new(
        settings: MermaidSettings,
        ledger: Arc<AttemptLedger>,
        executor: Arc<dyn CommandExecutor>,
        locator: Arc<dyn LocatorBuilder>,
    ) -> Self {
        let invoker = RenderInvoker::new(settings.clone(), executor, locator);
        Self {
            settings,
            ledger,
            invoker,
        }
    }

    /// Production wiring: a fresh ledger, the real `mmdc` subprocess and a
    /// token URL locator.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.mermaid.clone(),
            Arc::new(AttemptLedger::new()),
            Arc::new(SystemExecutor::new()),
            Arc::new(TokenUrlLocator::from_settings(&config.server)),
        )
    }

    pub fn settings(&self) -> &MermaidSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &AttemptLedger {
        &self.ledger
    }

    /// Run one `generate_mermaid_diagram` call.
    ///
    /// Validation failures return before the ledger is touched. A verified
    /// success clears the fingerprint's record; every other outcome leaves
    /// the reserved attempt counted.
    pub fn generate(&self, args: &Value) -> RenderOutcome {
        let request = match RenderRequest::from_arguments(args, &self.settings) {
            Ok(request) => request,
            Err(failure) => {
                log::info!("Rejected diagram request: {failure}");
                return RenderOutcome::ValidationFailure(failure);
            }
        };
        log::info!(
            "Generating Mermaid diagram | format={} | theme={}",
            request.format,
            request.theme
        );

        let fingerprint = Fingerprint::of(&request.source);
        let max_attempts = self.settings.max_retry_attempts;
        let attempt = match self.ledger.check_and_reserve(&fingerprint, max_attempts) {
            Ok(attempt) => attempt,
            Err(exhausted) => {
                log::warn!("{exhausted} for diagram {fingerprint}");
                return RenderOutcome::BudgetExhausted(exhausted);
            }
        };

        let outcome = self
            .invoker
            .invoke(&request, &fingerprint, attempt, max_attempts);
        if outcome.is_success() {
            self.ledger.reset(&fingerprint);
        }
        log::debug!(
            "Diagram {fingerprint} attempt {attempt}/{max_attempts}: {}",
            outcome.kind()
        );
        outcome
    }
}
