//! The closed set of node type tags a workflow graph may contain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tag identifying which handler executes a node.
///
/// Tags are persisted in their SCREAMING_SNAKE_CASE form (`HTTP_REQUEST`).
/// Adding a variant forces a matching arm in the engine's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    /// Entry point started by a user clicking "execute".
    ManualTrigger,
    /// Placeholder entry node shown in an empty editor.
    Initial,
    /// Issues an outbound HTTP request.
    HttpRequest,
}

impl NodeType {
    /// Every declared tag, in declaration order.
    pub const ALL: [NodeType; 3] = [Self::ManualTrigger, Self::Initial, Self::HttpRequest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManualTrigger => "MANUAL_TRIGGER",
            Self::Initial => "INITIAL",
            Self::HttpRequest => "HTTP_REQUEST",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUAL_TRIGGER" => Ok(Self::ManualTrigger),
            "INITIAL"        => Ok(Self::Initial),
            "HTTP_REQUEST"   => Ok(Self::HttpRequest),
            other            => Err(format!("unknown node type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_parses_back_to_itself() {
        for kind in NodeType::ALL {
            assert_eq!(kind.as_str().parse::<NodeType>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!("UNKNOWN".parse::<NodeType>().is_err());
        assert!("http_request".parse::<NodeType>().is_err());
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&NodeType::HttpRequest).unwrap();
        assert_eq!(json, "\"HTTP_REQUEST\"");
    }
}
