//! Sequential suite runner.
//!
//! Hook order, one request at a time:
//!
//! 1. before all — purge users, register the test user.
//! 2. for each selected scenario — reset posts, run, reset posts.
//! 3. after all — purge users. Always attempted.
//!
//! A failing hook is recorded and skips every remaining scenario, but the
//! after-all hook still runs so the store is left without test users.

use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::fixtures::FixtureSet;
use crate::lifecycle::{purge_all_users, register_test_user, reset_posts};
use crate::scenarios::{Scenario, ScenarioContext};

/// Scenario selection.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only run scenarios whose full title contains this substring.
    pub grep: Option<String>,
}

impl RunOptions {
    pub fn selected(&self) -> Vec<Scenario> {
        Scenario::ALL
            .into_iter()
            .filter(|s| match &self.grep {
                Some(pattern) => s.full_title().contains(pattern.as_str()),
                None => true,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookFailure {
    pub hook: Hook,
    /// Full title of the scenario the hook ran for, when per-scenario.
    pub scenario: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub group: &'static str,
    pub title: &'static str,
    pub outcome: Outcome,
    pub duration_ms: u128,
}

/// Result of one suite run. Serializes to the JSON report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub results: Vec<ScenarioResult>,
    pub hook_failures: Vec<HookFailure>,
    /// Selected scenarios that never ran because a hook failed.
    pub skipped: usize,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Passed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.hook_failures.is_empty() && self.skipped == 0
    }

    fn record_hook(&mut self, hook: Hook, scenario: Option<Scenario>, err: impl ToString) {
        let failure = HookFailure {
            hook,
            scenario: scenario.map(Scenario::full_title),
            message: err.to_string(),
        };
        warn!(
            hook = ?failure.hook,
            scenario = ?failure.scenario,
            message = %failure.message,
            "hook failed"
        );
        self.hook_failures.push(failure);
    }
}

/// Runs the selected scenarios against `client`'s base URL.
///
/// `client` should be unauthenticated; the session obtained in the
/// before-all hook is attached to a copy of it for everything after.
pub async fn run_suite(client: &ApiClient, fixtures: &FixtureSet, options: &RunOptions) -> SuiteReport {
    let selected = options.selected();
    let mut report = SuiteReport::default();

    let authed = match before_all(client, fixtures).await {
        Ok(authed) => authed,
        Err(e) => {
            report.record_hook(Hook::BeforeAll, None, e);
            report.skipped = selected.len();
            after_all(client, &mut report).await;
            return report;
        }
    };

    let ctx = ScenarioContext {
        client: &authed,
        expected: &fixtures.snapshot,
    };

    for (index, scenario) in selected.iter().copied().enumerate() {
        if let Err(e) = reset_posts(&authed, fixtures.baseline()).await {
            report.record_hook(Hook::BeforeEach, Some(scenario), e);
            report.skipped = selected.len() - index;
            break;
        }

        let started = Instant::now();
        let outcome = match scenario.run(&ctx).await {
            Ok(()) => Outcome::Passed,
            Err(e) => Outcome::Failed {
                message: e.to_string(),
            },
        };
        match &outcome {
            Outcome::Passed => info!(scenario = %scenario.full_title(), "passed"),
            Outcome::Failed { message } => {
                warn!(scenario = %scenario.full_title(), %message, "failed")
            }
        }
        report.results.push(ScenarioResult {
            group: scenario.group(),
            title: scenario.title(),
            outcome,
            duration_ms: started.elapsed().as_millis(),
        });

        if let Err(e) = reset_posts(&authed, fixtures.baseline()).await {
            report.record_hook(Hook::AfterEach, Some(scenario), e);
            report.skipped = selected.len() - index - 1;
            break;
        }
    }

    after_all(&authed, &mut report).await;
    report
}

async fn before_all(client: &ApiClient, fixtures: &FixtureSet) -> crate::error::Result<ApiClient> {
    purge_all_users(client).await?;
    let session = register_test_user(client, &fixtures.user).await?;
    Ok(client.clone().with_session(session))
}

async fn after_all(client: &ApiClient, report: &mut SuiteReport) {
    if let Err(e) = purge_all_users(client).await {
        report.record_hook(Hook::AfterAll, None, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grep_selects_by_full_title() {
        let opts = RunOptions {
            grep: Some("PATCH".to_string()),
        };
        let selected = opts.selected();
        assert_eq!(selected.len(), 3);
        assert!(selected.iter().all(|s| s.group() == "PATCH /posts/:id"));

        let opts = RunOptions {
            grep: Some("Should return JSON".to_string()),
        };
        assert_eq!(opts.selected().len(), 6);
    }

    #[test]
    fn no_grep_selects_everything_in_order() {
        let selected = RunOptions::default().selected();
        assert_eq!(selected, Scenario::ALL.to_vec());
    }

    #[test]
    fn report_counts_and_success() {
        let mut report = SuiteReport::default();
        report.results.push(ScenarioResult {
            group: "GET /posts",
            title: "Should return JSON",
            outcome: Outcome::Passed,
            duration_ms: 3,
        });
        assert!(report.is_success());

        report.results.push(ScenarioResult {
            group: "GET /posts",
            title: "Should list all posts",
            outcome: Outcome::Failed {
                message: "posts: expected [..], got []".to_string(),
            },
            duration_ms: 5,
        });
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn hook_failure_fails_the_run() {
        let mut report = SuiteReport::default();
        report.record_hook(Hook::AfterAll, None, "API error 500: boom");
        assert!(!report.is_success());
        assert_eq!(report.hook_failures[0].hook, Hook::AfterAll);
    }

    #[test]
    fn report_serializes_outcome_state() {
        let result = ScenarioResult {
            group: "DELETE /posts/:id",
            title: "Should delete a post",
            outcome: Outcome::Failed {
                message: "expected an empty body".to_string(),
            },
            duration_ms: 1,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["state"], "failed");
        assert_eq!(json["outcome"]["message"], "expected an empty body");
    }
}
