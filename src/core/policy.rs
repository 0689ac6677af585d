//! Access control model.
//!
//! Policies are lists of path rules. A path rule grants capabilities on every
//! path matching its pattern; `*` at the end matches any suffix and `+`
//! matches exactly one segment. When several rules match, their capabilities
//! are combined and `deny` overrides everything.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::constants;
use crate::core::project::ProjectPath;
use crate::core::types::PolicyName;

/// A permission on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Create,
    Read,
    Update,
    Patch,
    Delete,
    List,
    Sudo,
    Deny,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Create => "create",
            Capability::Read => "read",
            Capability::Update => "update",
            Capability::Patch => "patch",
            Capability::Delete => "delete",
            Capability::List => "list",
            Capability::Sudo => "sudo",
            Capability::Deny => "deny",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use Capability::*;

const MANAGE: &[Capability] = &[Create, Read, Update, Delete, List, Sudo];
const READ_WRITE: &[Capability] = &[Create, Read, Update, Delete, List];
const ENV_ACCESS: &[Capability] = &[Read, Update, List, Create, Patch];

/// Capabilities granted on paths matching `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    pub pattern: String,
    pub capabilities: Vec<Capability>,
}

impl PathRule {
    pub fn new(pattern: impl Into<String>, capabilities: &[Capability]) -> Self {
        Self {
            pattern: pattern.into(),
            capabilities: capabilities.to_vec(),
        }
    }

    /// Whether `path` matches this rule's pattern.
    pub fn matches(&self, path: &str) -> bool {
        glob_match(&self.pattern, path)
    }
}

fn segment_eq(pattern: &str, segment: &str) -> bool {
    pattern == "+" || pattern == segment
}

fn glob_match(pattern: &str, path: &str) -> bool {
    let path_segments: Vec<&str> = path.split('/').collect();

    match pattern.strip_suffix('*') {
        Some(prefix) => {
            let pattern_segments: Vec<&str> = prefix.split('/').collect();
            if path_segments.len() < pattern_segments.len() {
                return false;
            }
            let last = pattern_segments.len() - 1;
            pattern_segments[..last]
                .iter()
                .zip(&path_segments)
                .all(|(p, s)| segment_eq(p, s))
                && match pattern_segments[last] {
                    "+" => true,
                    partial => path_segments[last].starts_with(partial),
                }
        }
        None => {
            let pattern_segments: Vec<&str> = pattern.split('/').collect();
            pattern_segments.len() == path_segments.len()
                && pattern_segments
                    .iter()
                    .zip(&path_segments)
                    .all(|(p, s)| segment_eq(p, s))
        }
    }
}

/// A named ACL policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: PolicyName,
    pub rules: Vec<PathRule>,
}

impl Policy {
    pub fn new(name: impl Into<PolicyName>, rules: Vec<PathRule>) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }

    /// Whether this policy alone grants `capability` on `path`.
    pub fn permits(&self, path: &str, capability: Capability) -> bool {
        permits(std::iter::once(self), path, capability)
    }

    /// Render as HCL, the form operators read and edit.
    pub fn to_hcl(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            let caps: Vec<String> = rule
                .capabilities
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect();
            out.push_str(&format!(
                "path \"{}\" {{\n  capabilities = [{}]\n}}\n",
                rule.pattern,
                caps.join(", ")
            ));
        }
        out
    }
}

/// Whether a set of policies grants `capability` on `path`.
pub fn permits<'a>(
    policies: impl IntoIterator<Item = &'a Policy>,
    path: &str,
    capability: Capability,
) -> bool {
    let mut granted = false;
    for rule in policies
        .into_iter()
        .flat_map(|p| p.rules.iter())
        .filter(|r| r.matches(path))
    {
        if rule.capabilities.contains(&Deny) {
            return false;
        }
        granted |= rule.capabilities.contains(&capability);
    }
    granted
}

/// Project tier of a policy name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Developer,
    Maintainer,
    Deployment,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Developer => "developer",
            Tier::Maintainer => "maintainer",
            Tier::Deployment => "deployment",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "developer" => Some(Tier::Developer),
            "maintainer" => Some(Tier::Maintainer),
            "deployment" => Some(Tier::Deployment),
            _ => None,
        }
    }
}

/// A parsed `<group>/<name>:<tier>` policy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPolicy {
    pub project: ProjectPath,
    pub tier: Tier,
}

impl ProjectPolicy {
    pub fn parse(name: &str) -> Option<Self> {
        let (path, tier) = name.rsplit_once(':')?;
        let (group, project) = path.split_once('/')?;
        if group.is_empty() || project.is_empty() || project.contains('/') {
            return None;
        }
        Some(Self {
            project: ProjectPath::new(group, project),
            tier: Tier::parse(tier)?,
        })
    }

    pub fn name(&self) -> PolicyName {
        self.project.policy_name(self.tier.as_str())
    }
}

/// Effective role of a session within one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Developer,
    Maintainer,
}

impl Role {
    /// Resolve from the policies attached to a session.
    ///
    /// `root`, `admin` or the project's maintainer policy make a maintainer;
    /// any other token is a developer, whoever it belongs to.
    pub fn resolve<S: AsRef<str>>(policies: &[S], project: &ProjectPath) -> Self {
        let maintainer = project.policy_name(Tier::Maintainer.as_str());
        let elevated = policies.iter().map(AsRef::as_ref).any(|p| {
            p == constants::ROOT_POLICY || p == constants::ADMIN_POLICY || p == maintainer
        });
        if elevated {
            Role::Maintainer
        } else {
            Role::Developer
        }
    }

    /// Whether this role may read and write `env`.
    pub fn can_write(self, env: &str) -> bool {
        match self {
            Role::Maintainer => true,
            Role::Developer => env != constants::PRODUCTION_ENV,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Maintainer => "maintainer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-wide administration policy.
pub fn admin_policy(mount: &str) -> Policy {
    Policy::new(
        constants::ADMIN_POLICY,
        vec![
            PathRule::new("sys/auth", MANAGE),
            PathRule::new("sys/auth/*", MANAGE),
            PathRule::new("sys/mounts", MANAGE),
            PathRule::new("sys/mounts/*", MANAGE),
            PathRule::new("auth/*", MANAGE),
            PathRule::new(format!("{}/*", mount), READ_WRITE),
            PathRule::new(format!("{}/data/*", mount), READ_WRITE),
            PathRule::new(format!("{}/metadata/*", mount), &[List, Read]),
            PathRule::new("sys/policy", MANAGE),
            PathRule::new("sys/policy/*", MANAGE),
            PathRule::new("sys/policies/*", MANAGE),
            PathRule::new("identity/*", MANAGE),
        ],
    )
}

fn listing_rules(mount: &str, project: &ProjectPath) -> Vec<PathRule> {
    vec![
        PathRule::new(format!("{}/*", mount), &[List]),
        PathRule::new(format!("{}/{}/*", mount, project), &[List]),
    ]
}

/// Developer or maintainer policy for a project.
///
/// Developers get every environment except production.
pub fn project_policy<S: AsRef<str>>(
    mount: &str,
    project: &ProjectPath,
    role: Role,
    environments: &[S],
) -> Policy {
    let mut rules = listing_rules(mount, project);
    for env in environments.iter().map(AsRef::as_ref) {
        if !role.can_write(env) {
            continue;
        }
        rules.push(PathRule::new(
            format!("{}/data/{}/{}/*", mount, project, env),
            ENV_ACCESS,
        ));
    }
    Policy::new(project.policy_name(role.as_str()), rules)
}

/// Read-only policy for deployment tokens.
pub fn deployment_policy(mount: &str, project: &ProjectPath) -> Policy {
    let mut rules = listing_rules(mount, project);
    rules.push(PathRule::new(
        format!("{}/data/{}/*", mount, project),
        &[Read, List],
    ));
    Policy::new(project.policy_name(Tier::Deployment.as_str()), rules)
}

/// Policy granted to every token: inspecting and renewing itself.
pub fn default_policy() -> Policy {
    Policy::new(
        constants::DEFAULT_POLICY,
        vec![
            PathRule::new("auth/token/lookup-self", &[Read]),
            PathRule::new("auth/token/renew-self", &[Update]),
        ],
    )
}

/// Whether a policy may be attached to a user by an administrator.
pub fn is_assignable(name: &str) -> bool {
    if name == constants::DEFAULT_POLICY || name == constants::ROOT_POLICY {
        return false;
    }
    !matches!(
        ProjectPolicy::parse(name),
        Some(ProjectPolicy {
            tier: Tier::Deployment,
            ..
        })
    )
}
