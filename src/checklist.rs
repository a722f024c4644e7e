use crate::{PullRequestAction, PullRequestEventPayload};

/// Invisible marker embedded in every checklist comment. Lets us recognize comments we posted
/// earlier when checking for duplicates after a redelivered webhook event
pub const COMMENT_MARKER: &str = "<!-- checklist-poster -->";

/// Configuration of the checklist comment itself.
#[derive(serde::Deserialize)]
pub struct Config
{
	/// Name of the protected branch. Only pull requests targeting this branch receive a checklist
	/// comment.
	pub protected_branch: String,
	/// Link to the project’s community chat, included at the end of every checklist comment.
	pub community_url: url::Url,
	/// Additional checklist items appended after the built-in ones (optional).
	#[serde(default)]
	pub extra_items: Vec<String>,
	/// Whether to skip posting if the pull request already carries a checklist comment, as happens
	/// when GitHub redelivers a webhook event (optional, default: true).
	#[serde(default = "default_suppress_duplicates")]
	pub suppress_duplicates: bool,
}

#[doc(hidden)]
fn default_suppress_duplicates() -> bool
{
	true
}

/// Whether a pull request event should receive a checklist comment at all.
///
/// Only freshly opened pull requests targeting the protected branch qualify. All other deliveries
/// (edits, pushes to existing pull requests, pull requests against feature branches) are ignored.
pub fn applies_to(config: &Config, payload: &PullRequestEventPayload) -> bool
{
	payload.action == PullRequestAction::Opened
		&& payload.pull_request.base.ref_ == config.protected_branch
}

/// Render the checklist comment for a pull request event.
///
/// The comment always lists the lint/format and changelog items plus any extra items from the
/// configuration, mentions the community chat, and greets first-time contributors with an
/// additional onboarding note.
pub fn render(config: &Config, payload: &PullRequestEventPayload) -> String
{
	let author_name = &payload.pull_request.user.login;
	let branch_name = &payload.pull_request.base.ref_;

	let mut comment = format!(
		"{COMMENT_MARKER}\n\
		@{author_name}: Thank you for your pull request against `{branch_name}`! Before a \
		maintainer can review it, please go through the following checklist:\n\
		\n\
		- [ ] The code passes the project’s linting and formatting checks\n\
		- [ ] CHANGELOG.md mentions this change\n");

	for item in &config.extra_items
	{
		comment.push_str(&format!("- [ ] {item}\n"));
	}

	comment.push_str(&format!(
		"\n\
		If anything is unclear, questions are always welcome in our [community chat]({}).\n",
		config.community_url));

	if payload.pull_request.author_association.is_first_contribution()
	{
		comment.push_str(
			"\n\
			🎉 This appears to be your first contribution to this project, welcome! A maintainer \
			will be with you shortly to help you get your change over the finish line.\n");
	}

	comment
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::{AuthorAssociation, BranchRef, PullRequest, Repository, User};

	fn test_config() -> Config
	{
		Config
		{
			protected_branch: "master".to_string(),
			community_url: url::Url::parse("https://example.chat/community").unwrap(),
			extra_items: vec![],
			suppress_duplicates: true,
		}
	}

	fn opened_pull_request(base_branch: &str, author_association: AuthorAssociation)
		-> PullRequestEventPayload
	{
		PullRequestEventPayload
		{
			action: PullRequestAction::Opened,
			pull_request: PullRequest
			{
				number: 7,
				base: BranchRef{ref_: base_branch.to_string()},
				head: BranchRef{ref_: "fix-typo".to_string()},
				user: User{login: "newuser".to_string()},
				author_association,
			},
			repository: Repository
			{
				name: "example-repository".to_string(),
				owner: User{login: "example-organization".to_string()},
			},
		}
	}

	#[test]
	fn applies_only_to_opened_pull_requests_against_the_protected_branch()
	{
		let config = test_config();

		let payload = opened_pull_request("master", AuthorAssociation::Contributor);
		assert!(applies_to(&config, &payload));

		let payload = opened_pull_request("develop", AuthorAssociation::Contributor);
		assert!(!applies_to(&config, &payload));

		let mut payload = opened_pull_request("master", AuthorAssociation::Contributor);
		payload.action = PullRequestAction::Other;
		assert!(!applies_to(&config, &payload));
	}

	#[test]
	fn comment_contains_required_checklist_items()
	{
		let config = test_config();
		let payload = opened_pull_request("master", AuthorAssociation::Contributor);

		let comment = render(&config, &payload);

		assert!(comment.contains(COMMENT_MARKER));
		assert!(comment.contains("@newuser"));
		assert!(comment.contains("CHANGELOG.md"));
		assert!(comment.contains("linting and formatting"));
		assert!(comment.contains("https://example.chat/community"));
	}

	#[test]
	fn extra_items_are_appended()
	{
		let mut config = test_config();
		config.extra_items = vec!["Documentation reflects the change".to_string()];
		let payload = opened_pull_request("master", AuthorAssociation::Contributor);

		let comment = render(&config, &payload);

		assert!(comment.contains("- [ ] Documentation reflects the change"));
	}

	#[test]
	fn first_time_contributors_receive_an_onboarding_note()
	{
		let config = test_config();

		let payload = opened_pull_request("master", AuthorAssociation::FirstTimeContributor);
		let comment = render(&config, &payload);
		assert!(comment.contains("first contribution"));

		let payload = opened_pull_request("master", AuthorAssociation::Contributor);
		let comment = render(&config, &payload);
		assert!(!comment.contains("first contribution"));
	}
}
