use crate::models::ToolName;

/// Inputs supplied once when a monitoring session is requested.
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub project_id: Option<String>,
    pub scan_id: Option<String>,
    pub tools: Vec<ToolName>,
}

/// A request that passed validation; the only way to construct a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    project_id: String,
    scan_id: String,
    tools: Vec<ToolName>,
}

impl ValidatedRequest {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    pub fn tools(&self) -> &[ToolName] {
        &self.tools
    }
}

/// What the caller should do with a session request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartDecision {
    Start(ValidatedRequest),
    /// Required identifiers are missing; send the user back to project selection.
    RedirectToProjectSelection { reason: String },
}

impl SessionRequest {
    pub fn validate(self) -> StartDecision {
        let project_id = self.project_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let scan_id = self.scan_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let Some(project_id) = project_id else {
            return redirect("no project selected");
        };
        let Some(scan_id) = scan_id else {
            return redirect("no scan id supplied");
        };

        let mut tools = Vec::with_capacity(self.tools.len());
        for tool in self.tools {
            if !tools.contains(&tool) {
                tools.push(tool);
            }
        }
        if tools.is_empty() {
            return redirect("no tools selected");
        }

        StartDecision::Start(ValidatedRequest { project_id, scan_id, tools })
    }
}

fn redirect(reason: &str) -> StartDecision {
    StartDecision::RedirectToProjectSelection { reason: reason.to_string() }
}
