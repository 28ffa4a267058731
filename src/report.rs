//! Turns raw model output into the markdown artifacts the user downloads.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No valid JSON found in response")]
    NoJson,
    #[error("Failed to parse model JSON: {0}")]
    BadJson(String),
}

/// Pull the JSON object out of a model response, tolerating ```json fences
/// and surrounding prose.
pub fn extract_json(response: &str) -> Result<Value, ReportError> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            let inner = trimmed[start + 7..start + 7 + end].trim();
            return serde_json::from_str(inner).map_err(|e| ReportError::BadJson(e.to_string()));
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            return serde_json::from_str(&trimmed[start..=end])
                .map_err(|e| ReportError::BadJson(e.to_string()));
        }
    }

    Err(ReportError::NoJson)
}

fn cell(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .replace('|', "\\|")
}

fn score(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Threat table plus improvement suggestions, from the structured threat
/// model response.
pub fn threat_model_to_markdown(model_output: &Value) -> String {
    let mut markdown = String::from(
        "## Threat Model\n\n| Threat Type | Scenario | Potential Impact |\n|---|---|---|\n",
    );

    if let Some(threats) = model_output.get("threat_model").and_then(Value::as_array) {
        for threat in threats {
            markdown.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(threat, "Threat Type"),
                cell(threat, "Scenario"),
                cell(threat, "Potential Impact"),
            ));
        }
    }

    if let Some(suggestions) = model_output
        .get("improvement_suggestions")
        .and_then(Value::as_array)
    {
        if !suggestions.is_empty() {
            markdown.push_str("\n## Improvement Suggestions\n\n");
            for suggestion in suggestions {
                if let Some(text) = suggestion.as_str() {
                    markdown.push_str(&format!("- {}\n", text));
                }
            }
        }
    }

    markdown
}

/// DREAD score table. Risk Score is the mean of the five category scores.
pub fn dread_to_markdown(assessment: &Value) -> String {
    let mut markdown = String::from(
        "## DREAD Risk Assessment\n\n| Threat Type | Scenario | Damage Potential | Reproducibility | Exploitability | Affected Users | Discoverability | Risk Score |\n|---|---|---|---|---|---|---|---|\n",
    );

    if let Some(threats) = assessment.get("Risk Assessment").and_then(Value::as_array) {
        for threat in threats {
            let damage = score(threat, "Damage Potential");
            let reproducibility = score(threat, "Reproducibility");
            let exploitability = score(threat, "Exploitability");
            let affected = score(threat, "Affected Users");
            let discoverability = score(threat, "Discoverability");
            let risk =
                (damage + reproducibility + exploitability + affected + discoverability) / 5.0;
            markdown.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {:.2} |\n",
                cell(threat, "Threat Type"),
                cell(threat, "Scenario"),
                damage,
                reproducibility,
                exploitability,
                affected,
                discoverability,
                risk,
            ));
        }
    }

    markdown
}

/// Strip markdown code fences from attack-tree output, leaving bare Mermaid
/// source suitable for the diagram renderer and the plain-text download.
pub fn strip_mermaid_fences(response: &str) -> String {
    let fence = Regex::new(r"(?s)```(?:mermaid)?\s*(.*?)\s*```")
        .ok()
        .and_then(|re| {
            re.captures(response)
                .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        });
    match fence {
        Some(inner) => inner,
        None => response.trim().to_string(),
    }
}
