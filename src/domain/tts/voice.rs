use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Abstract narrator voice; each provider maps it to its own voice ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceHint {
    #[default]
    #[serde(rename = "narrator-a")]
    NarratorA,
    #[serde(rename = "narrator-b")]
    NarratorB,
}

impl VoiceHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceHint::NarratorA => "narrator-a",
            VoiceHint::NarratorB => "narrator-b",
        }
    }
}

impl std::fmt::Display for VoiceHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoiceHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "narrator-a" => Ok(VoiceHint::NarratorA),
            "narrator-b" => Ok(VoiceHint::NarratorB),
            other => Err(format!("unknown voice '{}'", other)),
        }
    }
}
