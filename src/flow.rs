//! Identity-token propagation flows and their textual rendering.

use serde::{Deserialize, Serialize};

/// The three selectable flow modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Student acting through the LMS portal with their own token.
    #[default]
    Direct,
    /// AI assistant acting under its own identity.
    Agent,
    /// AI assistant acting on the student's behalf after explicit consent.
    Obo,
}

/// Participants in the architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// The end user.
    Student,
    /// Learning management system front end.
    LmsPortal,
    /// AI assistant embedded in the LMS.
    SmartAgent,
    /// Identity and access management server.
    Iam,
    /// MCP 1.
    ResearchServer,
    /// MCP 2.
    WorkspaceServer,
}

impl Actor {
    /// Display name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::LmsPortal => "LMS Portal",
            Self::SmartAgent => "Smart Agent (AI Assistant)",
            Self::Iam => "WSO2 IAM",
            Self::ResearchServer => "MCP 1 - Research Server",
            Self::WorkspaceServer => "MCP 2 - Student Workspace Server",
        }
    }
}

/// Tokens carried across hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Issued to the student.
    User,
    /// Issued to the agent for its own identity.
    Agent,
    /// Issued to the agent on behalf of the student.
    Obo,
}

impl TokenKind {
    /// Display name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User Token",
            Self::Agent => "Agent Token",
            Self::Obo => "OBO Token",
        }
    }
}

/// One arrow in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hop {
    /// Sender.
    pub from: Actor,
    /// Receiver.
    pub to: Actor,
    /// What happens on this arrow.
    pub action: &'static str,
    /// Token carried, if any.
    pub token: Option<TokenKind>,
}

const fn hop(from: Actor, to: Actor, action: &'static str, token: Option<TokenKind>) -> Hop {
    Hop {
        from,
        to,
        action,
        token,
    }
}

const DIRECT_HOPS: &[Hop] = &[
    hop(Actor::Student, Actor::LmsPortal, "logs in", None),
    hop(Actor::LmsPortal, Actor::Iam, "authenticates the student", None),
    hop(Actor::Iam, Actor::LmsPortal, "issues token", Some(TokenKind::User)),
    hop(Actor::LmsPortal, Actor::ResearchServer, "calls with", Some(TokenKind::User)),
    hop(Actor::LmsPortal, Actor::WorkspaceServer, "calls with", Some(TokenKind::User)),
];

const AGENT_HOPS: &[Hop] = &[
    hop(Actor::Student, Actor::SmartAgent, "asks for help", None),
    hop(Actor::SmartAgent, Actor::Iam, "authenticates as itself", None),
    hop(Actor::Iam, Actor::SmartAgent, "issues token", Some(TokenKind::Agent)),
    hop(Actor::SmartAgent, Actor::ResearchServer, "calls with", Some(TokenKind::Agent)),
];

const OBO_HOPS: &[Hop] = &[
    hop(Actor::SmartAgent, Actor::LmsPortal, "requests delegated access", None),
    hop(Actor::LmsPortal, Actor::Student, "asks for permission", None),
    hop(Actor::Student, Actor::Iam, "approves", None),
    hop(Actor::Iam, Actor::SmartAgent, "issues token", Some(TokenKind::Obo)),
    hop(Actor::SmartAgent, Actor::WorkspaceServer, "calls with", Some(TokenKind::Obo)),
];

impl FlowType {
    /// Every flow, in button-bar order.
    pub const ALL: [FlowType; 3] = [Self::Direct, Self::Agent, Self::Obo];

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "Direct User",
            Self::Agent => "Agent Flow",
            Self::Obo => "OBO Flow",
        }
    }

    /// Ordered hops drawn for this flow.
    pub fn hops(&self) -> &'static [Hop] {
        match self {
            Self::Direct => DIRECT_HOPS,
            Self::Agent => AGENT_HOPS,
            Self::Obo => OBO_HOPS,
        }
    }

    /// Explanatory paragraph.
    pub fn explanation(&self) -> &'static str {
        match self {
            Self::Direct => {
                "In Direct Mode the student logs into the LMS Portal. The portal obtains a \
                 User Token and passes it directly to MCP 1 (Research Server) and MCP 2 \
                 (Student Workspace Server). This is the standard secure interaction where \
                 students reach their own courses, assignments and materials."
            }
            Self::Agent => {
                "In Agent Mode the student works with the Smart Agent embedded in the LMS. \
                 The agent authenticates with WSO2 IAM to obtain an Agent Token and uses it \
                 to reach university resources through MCP 1 (Research Server), so the AI's \
                 actions are audited separately from the student's own."
            }
            Self::Obo => {
                "In OBO Flow Mode the Smart Agent needs to act on the student's behalf. It \
                 starts a reverse flow that asks the student for explicit permission through \
                 the LMS. Once the student approves in WSO2 IAM, an OBO Token is issued \
                 directly to the agent, giving it delegated access to MCP 2 (Student \
                 Workspace Server)."
            }
        }
    }

    /// Renders the flow as numbered text steps followed by the explanation.
    pub fn render(&self) -> String {
        let label = self.label();
        let mut out = format!("{label}\n{}\n", "=".repeat(label.len()));
        for (i, hop) in self.hops().iter().enumerate() {
            out.push_str(&format!(
                "{:>2}. {} -> {}: {}",
                i + 1,
                hop.from.label(),
                hop.to.label(),
                hop.action
            ));
            if let Some(token) = hop.token {
                out.push_str(&format!(" [{}]", token.label()));
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(self.explanation());
        out.push('\n');
        out
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Agent => write!(f, "agent"),
            Self::Obo => write!(f, "obo"),
        }
    }
}

impl std::str::FromStr for FlowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "agent" => Ok(Self::Agent),
            "obo" => Ok(Self::Obo),
            other => Err(format!("unknown flow '{}' (expected direct, agent or obo)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_direct() {
        assert_eq!(FlowType::default(), FlowType::Direct);
    }

    #[test]
    fn test_parse_round_trip() {
        for flow in FlowType::ALL {
            assert_eq!(flow.to_string().parse::<FlowType>().unwrap(), flow);
        }
        assert_eq!("OBO".parse::<FlowType>().unwrap(), FlowType::Obo);
        assert!("implicit".parse::<FlowType>().is_err());
    }

    #[test]
    fn test_tokens_per_flow() {
        let tokens = |flow: FlowType| -> Vec<TokenKind> {
            flow.hops().iter().filter_map(|h| h.token).collect()
        };
        assert!(tokens(FlowType::Direct).iter().all(|t| *t == TokenKind::User));
        assert!(tokens(FlowType::Agent).iter().all(|t| *t == TokenKind::Agent));
        assert!(tokens(FlowType::Obo).iter().all(|t| *t == TokenKind::Obo));
    }

    #[test]
    fn test_obo_ends_at_workspace_with_obo_token() {
        let last = FlowType::Obo.hops().last().unwrap();
        assert_eq!(last.from, Actor::SmartAgent);
        assert_eq!(last.to, Actor::WorkspaceServer);
        assert_eq!(last.token, Some(TokenKind::Obo));
    }

    #[test]
    fn test_agent_never_touches_workspace() {
        assert!(FlowType::Agent
            .hops()
            .iter()
            .all(|h| h.to != Actor::WorkspaceServer));
    }

    #[test]
    fn test_render() {
        let text = FlowType::Agent.render();
        assert!(text.starts_with("Agent Flow\n==========\n"));
        assert!(text.contains(
            " 4. Smart Agent (AI Assistant) -> MCP 1 - Research Server: calls with [Agent Token]"
        ));
        assert!(text.ends_with("actions are audited separately from the student's own.\n"));
    }
}
