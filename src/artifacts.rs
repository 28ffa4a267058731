//! Generated security artifacts and their download descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    ThreatModel,
    AttackTree,
    Mitigations,
    DreadAssessment,
    TestCases,
}

impl ArtifactKind {
    /// File name and MIME type are fixed per kind. The attack tree downloads
    /// as plain text because it is Mermaid diagram source, not prose.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::ThreatModel => "threat_model.md",
            ArtifactKind::AttackTree => "attack_tree.md",
            ArtifactKind::Mitigations => "mitigations.md",
            ArtifactKind::DreadAssessment => "dread_assessment.md",
            ArtifactKind::TestCases => "test_cases.md",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtifactKind::AttackTree => "text/plain",
            _ => "text/markdown",
        }
    }

    pub fn download(&self, data: impl Into<String>) -> Download {
        Download {
            file_name: self.file_name(),
            mime_type: self.mime_type(),
            data: data.into(),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactKind::ThreatModel => "threat model",
            ArtifactKind::AttackTree => "attack tree",
            ArtifactKind::Mitigations => "mitigations",
            ArtifactKind::DreadAssessment => "DREAD risk assessment",
            ArtifactKind::TestCases => "test cases",
        };
        f.write_str(label)
    }
}

/// Plain-text file offered to the user after a generation step.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Download {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub data: String,
}

/// Result of one generation step: the markdown (or diagram source) plus the
/// ready-to-serve download.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    pub content: String,
}

impl GeneratedArtifact {
    pub fn download(&self) -> Download {
        self.kind.download(self.content.clone())
    }
}
