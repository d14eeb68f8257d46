//! Per-delivery orchestration.
//!
//! The agent decides whether an event is actionable, then runs the pipeline
//! authenticate → resolve base → gather context → generate → publish. The only
//! state kept between deliveries lives in the credential and standards
//! caches.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::auth::{AppAuthenticator, AppSigner, AuthError, Clock};
use crate::commands::parse_activation;
use crate::config::{Config, ConfigError};
use crate::context::{self, StandardsCache};
use crate::effects::GitHubConnector;
use crate::error::AgentError;
use crate::patch::{
    GenerationMetadata, ModelClient, PatchGenerator, PlanRules, PromptInput, build_prompt,
};
use crate::publish::{self, PullRequestResult};
use crate::webhooks::{CommentAction, GitHubEvent, IssueCommentEvent};

/// Settings derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub aliases: Vec<String>,
    /// First alias without its sigil, e.g. `bot` for `@bot`.
    pub branch_prefix: String,
    pub default_branch: Option<String>,
    pub max_file_bytes: usize,
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let first = config.aliases.first().ok_or_else(|| ConfigError::Invalid {
            name: "BOT_ALIASES",
            reason: "must name at least one alias".to_string(),
        })?;
        let branch_prefix = first.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
        let valid = !branch_prefix.is_empty()
            && branch_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(ConfigError::Invalid {
                name: "BOT_ALIASES",
                reason: format!("`{}` does not yield a usable branch prefix", first),
            });
        }

        Ok(AgentSettings {
            aliases: config.aliases.clone(),
            branch_prefix: branch_prefix.to_string(),
            default_branch: config.default_branch.clone(),
            max_file_bytes: config.max_file_bytes,
        })
    }
}

/// A handled delivery that produced no pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pong,
    Ignored { reason: String },
    NoOp,
    Completed(Completion),
}

/// What a successful delivery produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub pull_request: PullRequestResult,
    pub metadata: GenerationMetadata,
}

/// Runs deliveries.
pub struct Agent<C, M> {
    connector: C,
    authenticator: AppAuthenticator,
    standards: StandardsCache,
    generator: PatchGenerator<M>,
    settings: AgentSettings,
}

impl<C: GitHubConnector, M: ModelClient> Agent<C, M> {
    /// Builds an agent, loading the App key and checking derived settings.
    pub fn new(
        config: &Config,
        connector: C,
        model: M,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AgentError> {
        let settings = AgentSettings::from_config(config)?;
        let signer = AppSigner::new(config.app_id, &config.private_key)?;

        Ok(Agent {
            connector,
            authenticator: AppAuthenticator::new(signer, clock.clone()),
            standards: StandardsCache::new(config.standards_path.clone(), clock),
            generator: PatchGenerator::new(model, config.models.clone()),
            settings,
        })
    }

    /// Handles one parsed webhook event.
    pub async fn handle(&self, event: GitHubEvent) -> Result<Outcome, AgentError> {
        let event = match event {
            GitHubEvent::Ping => return Ok(Outcome::Pong),
            GitHubEvent::IssueComment(event) => event,
        };

        if let Some(reason) = ignore_reason(&event) {
            debug!(reason = %reason, "Ignoring comment");
            return Ok(Outcome::Ignored { reason });
        }

        let command = parse_activation(&event.body, &self.settings.aliases);
        if !command.activated {
            debug!("No activation phrase in comment");
            return Ok(Outcome::NoOp);
        }

        info!(
            author = %event.author_login,
            paths = ?command.target_paths,
            "Activation phrase found"
        );
        let completion = self.run(&event, &command.target_paths).await?;
        Ok(Outcome::Completed(completion))
    }

    async fn run(
        &self,
        event: &IssueCommentEvent,
        paths: &[String],
    ) -> Result<Completion, AgentError> {
        let repo = &event.repo;
        let credential = self
            .authenticator
            .credential(&self.connector, repo, event.installation_id)
            .await?;
        let client = self
            .connector
            .connect(&credential.token, repo)
            .map_err(|source| AuthError::Identity {
                step: "installation_client",
                source,
            })?;

        let candidates = publish::branch_candidates(
            self.settings.default_branch.as_deref(),
            event.default_branch.as_deref(),
        );
        let base = publish::resolve_base(&client, &candidates).await?;

        let context = context::gather(
            &client,
            &self.standards,
            repo,
            &base.branch,
            base.sha.as_str(),
            paths,
            self.settings.max_file_bytes,
        )
        .await?;

        let rules = PlanRules::new(self.settings.branch_prefix.clone(), event.issue.number);
        let prompt = build_prompt(&PromptInput {
            repo,
            issue: &event.issue,
            comment: &event.body,
            context: &context,
            rules: &rules,
        });
        let generated = self.generator.generate(&prompt, &rules).await?;

        let pull_request = publish::publish(&client, base, &generated.plan).await?;
        Ok(Completion {
            pull_request,
            metadata: generated.metadata,
        })
    }
}

/// Why a comment event is not acted on, if it isn't.
fn ignore_reason(event: &IssueCommentEvent) -> Option<String> {
    if event.action != CommentAction::Created {
        Some(format!(
            "issue_comment action `{}` is not handled",
            event.action.as_str()
        ))
    } else if event.author_is_bot {
        Some(format!("comment author `{}` is a bot", event.author_login))
    } else if event.issue.is_pull_request {
        Some("comments on pull requests are not handled".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::github::GitHubErrorKind;
    use crate::patch::ModelError;
    use crate::test_utils::{
        FakeGitHub, ManualClock, ScriptedModel, comment_event, plan_json, test_config,
    };

    fn agent(github: &FakeGitHub, model: &ScriptedModel) -> Agent<FakeGitHub, ScriptedModel> {
        Agent::new(
            &test_config(),
            github.clone(),
            model.clone(),
            Arc::new(ManualClock::default()),
        )
        .unwrap()
    }

    #[test]
    fn branch_prefix_drops_sigil() {
        let mut config = test_config();
        config.aliases = vec!["@fixer".to_string(), "/fixer".to_string()];
        assert_eq!(AgentSettings::from_config(&config).unwrap().branch_prefix, "fixer");

        config.aliases = vec!["@".to_string()];
        assert!(AgentSettings::from_config(&config).is_err());

        config.aliases = vec![];
        assert!(AgentSettings::from_config(&config).is_err());
    }

    #[test]
    fn pkcs1_key_fails_construction() {
        let mut config = test_config();
        config.private_key = crate::test_utils::TEST_PRIVATE_KEY_PKCS1.to_string();
        let result = Agent::new(
            &config,
            FakeGitHub::new(),
            ScriptedModel::new(vec![]),
            Arc::new(ManualClock::default()),
        );
        let Err(err) = result else {
            panic!("expected PKCS#1 key to be rejected");
        };
        assert_eq!(err.kind(), ErrorKind::AuthenticationError);
        assert!(err.to_string().contains("PKCS#8"));
    }

    #[tokio::test]
    async fn ping_is_answered() {
        let github = FakeGitHub::new();
        let model = ScriptedModel::new(vec![]);
        assert_eq!(agent(&github, &model).handle(GitHubEvent::Ping).await.unwrap(), Outcome::Pong);
    }

    #[tokio::test]
    async fn filtered_comments_touch_nothing() {
        let github = FakeGitHub::new();
        let model = ScriptedModel::new(vec![]);
        let agent = agent(&github, &model);

        let mut edited = comment_event(42, "@bot fix notes.md");
        edited.action = CommentAction::Edited;
        let mut from_bot = comment_event(42, "@bot fix notes.md");
        from_bot.author_is_bot = true;
        let mut on_pr = comment_event(42, "@bot fix notes.md");
        on_pr.issue.is_pull_request = true;

        for event in [edited, from_bot, on_pr] {
            let outcome = agent.handle(GitHubEvent::IssueComment(event)).await.unwrap();
            assert!(matches!(outcome, Outcome::Ignored { .. }), "{:?}", outcome);
        }
        assert!(github.calls().is_empty());
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn comment_without_alias_is_no_op() {
        let github = FakeGitHub::new();
        let model = ScriptedModel::new(vec![]);
        let outcome = agent(&github, &model)
            .handle(GitHubEvent::IssueComment(comment_event(42, "thanks!")))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NoOp);
        assert!(github.calls().is_empty());
    }

    #[tokio::test]
    async fn activation_publishes_fix_branch() {
        let github = FakeGitHub::new()
            .with_branch("main", "B1")
            .with_file("notes.md", "teh notes\n");
        let model = ScriptedModel::new(vec![Ok(crate::patch::ModelResponse {
            text: plan_json("bot/fix-issue-42"),
            input_tokens: None,
            output_tokens: None,
        })]);

        let outcome = agent(&github, &model)
            .handle(GitHubEvent::IssueComment(comment_event(42, "@bot fix notes.md")))
            .await
            .unwrap();

        let Outcome::Completed(completion) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(completion.pull_request.branch_name, "bot/fix-issue-42");
        assert_eq!(completion.metadata.attempts, 1);

        let prompt = &model.requests()[0].user;
        assert!(prompt.contains("teh notes"));
        assert!(prompt.contains("@bot fix notes.md"));

        // Pipeline calls after authentication use the installation token.
        let calls = github.calls();
        let after_auth: Vec<_> = calls.iter().skip(2).collect();
        assert!(after_auth.iter().all(|c| c.token.starts_with("ghs_")));
    }

    #[tokio::test]
    async fn configured_default_branch_wins() {
        let github = FakeGitHub::new()
            .with_branch("main", "B1")
            .with_branch("develop", "D1");
        let model = ScriptedModel::new(vec![Ok(crate::patch::ModelResponse {
            text: plan_json("bot/fix-issue-42"),
            ..Default::default()
        })]);
        let mut config = test_config();
        config.default_branch = Some("develop".to_string());
        let agent = Agent::new(
            &config,
            github.clone(),
            model.clone(),
            Arc::new(ManualClock::default()),
        )
        .unwrap();

        agent
            .handle(GitHubEvent::IssueComment(comment_event(42, "@bot fix")))
            .await
            .unwrap();

        let pr_base = github.effects().into_iter().find_map(|e| match e {
            crate::effects::GitHubEffect::CreatePullRequest { base, .. } => Some(base),
            _ => None,
        });
        assert_eq!(pr_base.as_deref(), Some("develop"));
    }

    #[tokio::test]
    async fn failures_carry_their_kind() {
        let github = FakeGitHub::new()
            .with_branch("main", "B1")
            .failing("create_tree", GitHubErrorKind::Other);
        let model = ScriptedModel::new(vec![Ok(crate::patch::ModelResponse {
            text: plan_json("bot/fix-issue-42"),
            ..Default::default()
        })]);

        let err = agent(&github, &model)
            .handle(GitHubEvent::IssueComment(comment_event(42, "@bot fix")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GitOperationError);
        assert_eq!(err.step(), Some("tree"));

        let model = ScriptedModel::new(vec![Err(ModelError::Timeout)]);
        let err = agent(&FakeGitHub::new().with_branch("main", "B1"), &model)
            .handle(GitHubEvent::IssueComment(comment_event(42, "@bot fix")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelError);
    }
}
