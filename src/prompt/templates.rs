//! Re-usable prompt skeletons for the chat flow and every generation step.

use crate::session::SessionContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Template for the copilot chat flow. Slots are filled by
/// [`assemble`](super::assemble); the `context` slot receives retrieved
/// document fragments when the caller opted into context fetching and is
/// empty otherwise.
pub const COPILOT_TEMPLATE: &str = "\
You are a security copilot. You help the user reason about the security \
posture of their application using the artifacts generated so far.

Retrieved reference material:
{context}

Previous conversation history:
{chat_history}

Application details:
- Application Type: {app_type}
- Data Sensitivity: {sensitivity}
- Internet Facing: {internet_facing}
- Authentication Methods: {authentication}
- Application Description: {description}

Threat Model:
{threat_model}

Attack Tree:
{attack_tree}

Mitigations:
{mitigations}

DREAD Assessment:
{dread_assessment}

Test Cases:
{test_cases}

---

Answer the question based on the above context: {question}

If none of the context above is relevant to the question, tell the user that \
you do not have adequate context to answer it.";

/// Threat modelling methodology the user selects for the first step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Methodology {
    Stride,
    Pasta,
    Owasp,
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Methodology::Stride => f.write_str("STRIDE"),
            Methodology::Pasta => f.write_str("PASTA"),
            Methodology::Owasp => f.write_str("OWASP"),
        }
    }
}

fn application_details(session: &SessionContext) -> String {
    format!(
        "APPLICATION TYPE: {}\nAUTHENTICATION METHODS: {}\nINTERNET FACING: {}\nSENSITIVE DATA: {}\nAPPLICATION DESCRIPTION: {}",
        session.app_type,
        session.authentication,
        if session.internet_facing { "Yes" } else { "No" },
        session.sensitivity,
        session.description,
    )
}

pub fn threat_model_prompt(methodology: Methodology, session: &SessionContext) -> String {
    let lens = match methodology {
        Methodology::Stride => {
            "Apply the STRIDE methodology. For each of Spoofing, Tampering, Repudiation, \
             Information Disclosure, Denial of Service and Elevation of Privilege, identify \
             credible threats to this application."
        }
        Methodology::Pasta => {
            "Apply the PASTA methodology. Work through attacker objectives, the technical \
             scope, and attack scenarios relevant to this application, then enumerate the \
             resulting threats."
        }
        Methodology::Owasp => {
            "Use the OWASP Top 10 as the analysis lens. For each applicable category, \
             identify concrete threats to this application."
        }
    };

    format!(
        "Act as a cyber security expert with more than 20 years of experience in threat \
modelling. {lens}

{details}

Respond with ONLY a valid JSON object using this exact structure:
{{\"threat_model\": [{{\"Threat Type\": \"...\", \"Scenario\": \"...\", \"Potential Impact\": \"...\"}}], \
\"improvement_suggestions\": [\"...\"]}}

Under \"improvement_suggestions\", list what extra detail about the application would \
allow a more complete threat model.",
        lens = lens,
        details = application_details(session),
    )
}

pub fn attack_tree_prompt(session: &SessionContext) -> String {
    format!(
        "Act as a cyber security expert. Based on the application details below, produce an \
attack tree: the attacker's ultimate goal at the root and the paths to achieve it as \
branches.

{}

Respond with ONLY valid Mermaid flowchart code (graph TD). Do not add commentary before \
or after the code. Quote every node label, for example: A[\"Attacker goal\"].",
        application_details(session),
    )
}

pub fn mitigations_prompt(threats_markdown: &str) -> String {
    format!(
        "Act as a cyber security expert. Below is a threat model for an application. For \
each identified threat, suggest practical mitigations or security controls that reduce \
its likelihood or impact.

{threats_markdown}

Respond with a markdown table with the columns: Threat Type, Scenario, and Suggested \
Mitigation(s). Output only the markdown table.",
    )
}

pub fn dread_prompt(threats_markdown: &str) -> String {
    format!(
        "Act as a cyber security expert. Perform a DREAD risk assessment for each threat in \
the threat model below, scoring Damage Potential, Reproducibility, Exploitability, \
Affected Users and Discoverability from 1 to 10.

{threats_markdown}

Respond with ONLY a valid JSON object using this exact structure:
{{\"Risk Assessment\": [{{\"Threat Type\": \"...\", \"Scenario\": \"...\", \
\"Damage Potential\": 0, \"Reproducibility\": 0, \"Exploitability\": 0, \
\"Affected Users\": 0, \"Discoverability\": 0}}]}}",
    )
}

pub fn test_cases_prompt(threats_markdown: &str) -> String {
    format!(
        "Act as a cyber security test engineer. Write security test cases in Gherkin syntax \
(Given-When-Then) that validate the application against the threats identified below.

{threats_markdown}

Respond in markdown, with each test case in a ```gherkin code block and a short heading \
naming the threat it covers.",
    )
}

pub fn image_analysis_prompt() -> String {
    "You are a solutions architect. Explain the attached architecture diagram in detail: \
the components shown, the technologies in use, and how data flows between them. Do not \
speculate beyond what the diagram shows. Write the explanation so it can be used \
directly as an application description for threat modelling."
        .to_string()
}
