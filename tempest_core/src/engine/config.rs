use serde::{Deserialize, Serialize};

/// Search knobs. Every field has a default so a partial JSON document only
/// overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Adopt the position's side to move as the bot's color; when off, a
    /// mismatched position yields a null result instead.
    pub follow_turn: bool,
    /// How many top-scored drops survive into the searched move list.
    pub placement_sample: usize,
    pub iterative_deepening: bool,
    pub use_aspiration: bool,
    /// Half-width of the aspiration window, in centipawns.
    pub aspiration_window_base: i32,
    /// Transposition table size as a power of two.
    pub tt_size_pow: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            follow_turn: true,
            placement_sample: 5,
            iterative_deepening: false,
            use_aspiration: false,
            aspiration_window_base: 50,
            tt_size_pow: 18,
        }
    }
}

impl SearchConfig {
    pub fn load_from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}
