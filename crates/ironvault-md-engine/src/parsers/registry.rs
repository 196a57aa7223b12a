use std::collections::HashMap;

use super::base::{BlockParser, NodeParser};
use super::blocks::{
    ActorBlockParser, MoveBlockParser, OracleBlockParser, OracleGroupBlockParser,
    OraclePromptBlockParser,
};
use super::nodes::{
    AddNodeParser, BurnNodeParser, ClockNodeParser, ImpactNodeParser, InitiativeNodeParser,
    MeterNodeParser, MoveNodeParser, OocNodeParser, OracleNodeParser, PositionNodeParser,
    ProgressNodeParser, ProgressRollNodeParser, RerollNodeParser, RollNodeParser,
    RollsNodeParser, TrackNodeParser, XpNodeParser,
};

/// Node and block parsers by registry key.
///
/// Built once, then only read. Parsers are keyed by their
/// [`NameCollection::parser`](super::NameCollection::parser) name.
#[derive(Default)]
pub struct ParserRegistry {
    nodes: HashMap<String, Box<dyn NodeParser>>,
    blocks: HashMap<String, Box<dyn BlockParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in parser.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_block(ActorBlockParser::new());
        registry.register_block(MoveBlockParser::new());
        registry.register_block(OracleGroupBlockParser::new());
        registry.register_block(OracleBlockParser::new());
        registry.register_block(OraclePromptBlockParser::new());

        registry.register_node(AddNodeParser::new());
        registry.register_node(BurnNodeParser::new());
        registry.register_node(ClockNodeParser::new());
        registry.register_node(ImpactNodeParser::new());
        registry.register_node(InitiativeNodeParser::new());
        registry.register_node(MeterNodeParser::new());
        registry.register_node(MoveNodeParser::new());
        registry.register_node(OocNodeParser::new());
        registry.register_node(OracleNodeParser::new());
        registry.register_node(PositionNodeParser::new());
        registry.register_node(ProgressNodeParser::new());
        registry.register_node(ProgressRollNodeParser::new());
        registry.register_node(RerollNodeParser::new());
        registry.register_node(RollNodeParser::new());
        registry.register_node(RollsNodeParser::new());
        registry.register_node(TrackNodeParser::new());
        registry.register_node(XpNodeParser::new());

        registry
    }

    /// Registers a node parser, replacing any parser with the same key.
    pub fn register_node(&mut self, parser: impl NodeParser + 'static) {
        let key = parser.names().parser().to_string();
        if self.nodes.insert(key.clone(), Box::new(parser)).is_some() {
            log::debug!("Replaced node parser {key}");
        }
    }

    /// Registers a block parser, replacing any parser with the same key.
    pub fn register_block(&mut self, parser: impl BlockParser + 'static) {
        let key = parser.names().parser().to_string();
        if self.blocks.insert(key.clone(), Box::new(parser)).is_some() {
            log::debug!("Replaced block parser {key}");
        }
    }

    pub fn node(&self, key: &str) -> Option<&dyn NodeParser> {
        self.nodes.get(key).map(|p| p.as_ref())
    }

    pub fn block(&self, key: &str) -> Option<&dyn BlockParser> {
        self.blocks.get(key).map(|p| p.as_ref())
    }

    /// Registered node keys, sorted.
    pub fn node_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Registered block keys, sorted.
    pub fn block_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{GenericNodeParser, NameCollection, Pattern};
    use pretty_assertions::assert_eq;

    #[test]
    fn default_keys() {
        let registry = ParserRegistry::with_defaults();
        assert_eq!(
            registry.block_keys(),
            vec!["-", "actor", "move", "oracle", "oracle-group"]
        );
        assert_eq!(
            registry.node_keys(),
            vec![
                "-",
                "add",
                "burn",
                "clock",
                "impact",
                "initiative",
                "meter",
                "move",
                "oracle",
                "position",
                "progress",
                "progress-roll",
                "reroll",
                "roll",
                "rolls",
                "track",
                "xp",
            ]
        );
    }

    #[test]
    fn same_key_resolves_by_kind() {
        let registry = ParserRegistry::with_defaults();
        assert_eq!(registry.node("-").map(|p| p.names().template()), Some("ooc"));
        assert_eq!(
            registry.block("-").map(|p| p.names().name()),
            Some("Oracle Prompt")
        );
        assert!(registry.node("actor").is_none());
    }

    #[test]
    fn registering_replaces() {
        let mut registry = ParserRegistry::with_defaults();
        registry.register_node(GenericNodeParser::new(
            NameCollection::new("Custom XP", "xp", "custom_xp"),
            Pattern::Reject,
        ));
        assert_eq!(
            registry.node("xp").map(|p| p.names().template()),
            Some("custom_xp")
        );
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn registry_is_shareable() {
        assert_send_sync::<ParserRegistry>();
    }
}
