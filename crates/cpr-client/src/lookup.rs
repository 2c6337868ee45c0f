//! Family lookup: validate, log, call the registry, filter.

use crate::client::CprClient;
use crate::error::CprError;
use crate::family::{filter_minor_children, FamilyMember};
use crate::identifier::Cpr;
use crate::request::{InvocationContext, LookupRequest};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Where lookup attempts are recorded.
///
/// Only ever receives redacted CPR numbers.
#[cfg_attr(test, mockall::automock)]
pub trait LookupLog: Send + Sync {
    fn lookup_attempt(&self, redacted_cpr: &str);

    fn lookup_completed(&self, redacted_cpr: &str, matches: usize);
}

/// [`LookupLog`] backed by `tracing` events: one info event per attempt,
/// completion at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLookupLog;

impl LookupLog for TracingLookupLog {
    fn lookup_attempt(&self, redacted_cpr: &str) {
        info!(cpr = %redacted_cpr, "Attempting family lookup");
    }

    fn lookup_completed(&self, redacted_cpr: &str, matches: usize) {
        debug!(cpr = %redacted_cpr, matches, "Family lookup completed");
    }
}

/// Looks up the minor children of a person.
#[derive(Clone)]
pub struct FamilyLookup {
    client: CprClient,
    context: InvocationContext,
    log: Arc<dyn LookupLog>,
}

impl FamilyLookup {
    pub fn new(client: CprClient, context: InvocationContext) -> Self {
        Self::with_log(client, context, Arc::new(TracingLookupLog))
    }

    pub fn with_log(
        client: CprClient,
        context: InvocationContext,
        log: Arc<dyn LookupLog>,
    ) -> Self {
        Self {
            client,
            context,
            log,
        }
    }

    /// Children under 18 of the person with the given CPR number.
    ///
    /// Invalid input is rejected before anything is logged or sent.
    #[instrument(skip_all)]
    pub async fn minor_children(
        &self,
        identifier: &str,
        reference_date: NaiveDate,
    ) -> Result<Vec<FamilyMember>, CprError> {
        let cpr = Cpr::parse(identifier)?;
        let redacted = cpr.redacted();
        self.log.lookup_attempt(&redacted);

        let request = LookupRequest::build(&cpr, &self.context);
        let document = self.client.invoke(&request).await?;
        let children = filter_minor_children(document.rows(), reference_date);

        self.log.lookup_completed(&redacted, children.len());
        Ok(children)
    }
}

impl std::fmt::Debug for FamilyLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyLookup")
            .field("client", &self.client)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
