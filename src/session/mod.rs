//! Per-session state: application details, generated artifacts, chat history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppType {
    #[serde(rename = "Web application")]
    Web,
    #[serde(rename = "Mobile application")]
    Mobile,
    #[serde(rename = "Desktop application")]
    Desktop,
    #[serde(rename = "Cloud application")]
    Cloud,
    #[serde(rename = "IoT application")]
    Iot,
    #[serde(rename = "Other")]
    Other,
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AppType::Web => "Web application",
            AppType::Mobile => "Mobile application",
            AppType::Desktop => "Desktop application",
            AppType::Cloud => "Cloud application",
            AppType::Iot => "IoT application",
            AppType::Other => "Other",
        };
        f.write_str(label)
    }
}

/// Highest sensitivity level of the data the application processes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    #[serde(rename = "Top Secret")]
    TopSecret,
    Secret,
    Confidential,
    Restricted,
    Unclassified,
    None,
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sensitivity::TopSecret => "Top Secret",
            Sensitivity::Secret => "Secret",
            Sensitivity::Confidential => "Confidential",
            Sensitivity::Restricted => "Restricted",
            Sensitivity::Unclassified => "Unclassified",
            Sensitivity::None => "None",
        };
        f.write_str(label)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authentication {
    #[serde(rename = "SSO")]
    Sso,
    #[serde(rename = "MFA")]
    Mfa,
    #[serde(rename = "OAUTH2")]
    Oauth2,
    Basic,
    None,
}

impl fmt::Display for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Authentication::Sso => "SSO",
            Authentication::Mfa => "MFA",
            Authentication::Oauth2 => "OAUTH2",
            Authentication::Basic => "Basic",
            Authentication::None => "None",
        };
        f.write_str(label)
    }
}

/// Everything the assistant knows about the application under analysis.
///
/// Artifact fields default to the empty string. The prompt assembler renders
/// an absent artifact as an empty section rather than failing, so early
/// queries before any generation step still produce a coherent prompt. Each
/// artifact is written only by the generation step that produces it; the
/// query flow treats the whole struct as read-only.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionContext {
    pub description: String,
    pub app_type: AppType,
    pub sensitivity: Sensitivity,
    pub internet_facing: bool,
    pub authentication: Authentication,
    #[serde(default)]
    pub threat_model: String,
    #[serde(default)]
    pub attack_tree: String,
    #[serde(default)]
    pub mitigations: String,
    #[serde(default)]
    pub dread_assessment: String,
    #[serde(default)]
    pub test_cases: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            description: String::new(),
            app_type: AppType::Web,
            sensitivity: Sensitivity::None,
            internet_facing: false,
            authentication: Authentication::None,
            threat_model: String::new(),
            attack_tree: String::new(),
            mitigations: String::new(),
            dread_assessment: String::new(),
            test_cases: String::new(),
        }
    }
}

impl SessionContext {
    pub fn new(
        description: impl Into<String>,
        app_type: AppType,
        sensitivity: Sensitivity,
        internet_facing: bool,
        authentication: Authentication,
    ) -> Self {
        Self {
            description: description.into(),
            app_type,
            sensitivity,
            internet_facing,
            authentication,
            ..Self::default()
        }
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    pub fn has_threat_model(&self) -> bool {
        !self.threat_model.trim().is_empty()
    }

    /// Named slot bindings consumed by the prompt assembler. Every field is
    /// always present; artifacts that have not been generated bind to "".
    pub fn slots(&self) -> HashMap<&'static str, String> {
        let mut slots = HashMap::new();
        slots.insert("description", self.description.clone());
        slots.insert("app_type", self.app_type.to_string());
        slots.insert("sensitivity", self.sensitivity.to_string());
        slots.insert(
            "internet_facing",
            if self.internet_facing { "Yes" } else { "No" }.to_string(),
        );
        slots.insert("authentication", self.authentication.to_string());
        slots.insert("threat_model", self.threat_model.clone());
        slots.insert("attack_tree", self.attack_tree.clone());
        slots.insert("mitigations", self.mitigations.clone());
        slots.insert("dread_assessment", self.dread_assessment.clone());
        slots.insert("test_cases", self.test_cases.clone());
        slots
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => f.write_str("User"),
            Speaker::Bot => f.write_str("Bot"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub message: String,
}

impl ConversationTurn {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            message: message.into(),
        }
    }

    pub fn bot(message: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Bot,
            message: message.into(),
        }
    }
}

/// One `Speaker: message` line per turn, oldest first.
pub fn render_history(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker, turn.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_ui_wording() {
        assert_eq!(AppType::Web.to_string(), "Web application");
        assert_eq!(Sensitivity::TopSecret.to_string(), "Top Secret");
        assert_eq!(Authentication::Oauth2.to_string(), "OAUTH2");
    }

    #[test]
    fn fresh_session_has_empty_artifacts() {
        let session = SessionContext::default();
        assert!(!session.has_threat_model());
        let slots = session.slots();
        assert_eq!(slots["threat_model"], "");
        assert_eq!(slots["internet_facing"], "No");
    }

    #[test]
    fn history_renders_in_order() {
        let history = vec![
            ConversationTurn::user("hello"),
            ConversationTurn::bot("hi there"),
        ];
        assert_eq!(render_history(&history), "User: hello\nBot: hi there");
    }
}
