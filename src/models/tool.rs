use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Security tools the dashboard backend can run against a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolName {
    #[serde(rename = "PromptMap")]
    PromptMap,
    #[serde(rename = "RAG Tester")]
    RagTester,
    #[serde(rename = "Agent Fuzzer")]
    AgentFuzzer,
    #[serde(rename = "File Auditor")]
    FileAuditor,
    #[serde(rename = "Log Poisoner")]
    LogPoisoner,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::PromptMap,
        ToolName::RagTester,
        ToolName::AgentFuzzer,
        ToolName::FileAuditor,
        ToolName::LogPoisoner,
    ];

    /// Name used on the wire and in log line prefixes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PromptMap => "PromptMap",
            Self::RagTester => "RAG Tester",
            Self::AgentFuzzer => "Agent Fuzzer",
            Self::FileAuditor => "File Auditor",
            Self::LogPoisoner => "Log Poisoner",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::PromptMap => "promptmap",
            Self::RagTester => "rag-tester",
            Self::AgentFuzzer => "agent-fuzzer",
            Self::FileAuditor => "file-auditor",
            Self::LogPoisoner => "log-poisoner",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed) || t.slug().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                let known: Vec<&str> = ToolName::ALL.iter().map(|t| t.slug()).collect();
                format!("unknown tool '{}' (expected one of: {})", trimmed, known.join(", "))
            })
    }
}
