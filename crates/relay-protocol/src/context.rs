//! The invocation context capability consumed by the translators.

/// Identity of the agent invocation a translation happens in.
///
/// Inbound events are attributed to the invoking agent; the branch tag is
/// copied verbatim and never interpreted.
pub trait InvocationContext: Send + Sync {
    fn invocation_id(&self) -> &str;
    fn agent_name(&self) -> &str;
    /// Execution branch tag. Empty when the invocation is not branched.
    fn branch(&self) -> &str;
}

/// Owned context for callers that do not carry a richer invocation object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticInvocationContext {
    invocation_id: String,
    agent_name: String,
    branch: String,
}

impl StaticInvocationContext {
    pub fn new(invocation_id: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            agent_name: agent_name.into(),
            branch: String::new(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

impl InvocationContext for StaticInvocationContext {
    fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    fn agent_name(&self) -> &str {
        &self.agent_name
    }

    fn branch(&self) -> &str {
        &self.branch
    }
}
