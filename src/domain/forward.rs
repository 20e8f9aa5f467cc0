//! Forwarding results, one entry per market in input order.

use super::outcome::RequestFailure;

/// What happened to a single forwarded market
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutcome {
    /// Market address (or "unknown") for reporting
    pub address: String,
    /// Accepted status code, or why the forward failed
    pub result: Result<u16, RequestFailure>,
}

impl ForwardOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate result of a forwarding pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardSummary {
    pub outcomes: Vec<ForwardOutcome>,
}

impl ForwardSummary {
    pub fn record(&mut self, outcome: ForwardOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ForwardOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::ResponseBody;

    #[test]
    fn test_summary_counts() {
        let mut summary = ForwardSummary::default();
        summary.record(ForwardOutcome {
            address: "A".into(),
            result: Err(RequestFailure::HttpStatus {
                status: 503,
                body: ResponseBody::Text("busy".into()),
            }),
        });
        summary.record(ForwardOutcome { address: "B".into(), result: Ok(200) });

        assert_eq!(summary.attempted(), 2);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.failures().next().map(|o| o.address.as_str()), Some("A"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = ForwardSummary::default();
        assert_eq!(summary.attempted(), 0);
        assert_eq!(summary.failed(), 0);
    }
}
