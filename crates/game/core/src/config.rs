use std::time::Duration;

/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Frames per second the hosting loop should target. The core never
    /// sleeps on its own; the value is exposed for the frame pacer.
    pub target_fps: u32,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of items the adventurer can carry at once.
    pub const MAX_INVENTORY_SLOTS: usize = 8;

    // ===== gameplay constants =====
    /// Default square dungeon size used by the generator.
    pub const DEFAULT_DUNGEON_SIZE: usize = 6;
    /// Default number of dragons placed by the generator.
    pub const DEFAULT_DRAGON_COUNT: u32 = 3;
    /// Distinct treasure images a placed treasure can pick from.
    pub const TREASURE_VARIANTS: u32 = 4;
    /// Remaining duration assigned to a freshly activated chaos seal.
    /// Zero means the seal is torn down by the end-of-round tick of the
    /// round it was activated in, i.e. it lasts exactly one round.
    pub const CHAOS_SEAL_DURATION: i32 = 0;

    // ===== pacing intervals (cooperative sleep targets) =====
    /// Pause between two adventurer steps along the path.
    pub const STEP_INTERVAL: Duration = Duration::from_millis(500);
    /// Pause between autoplayed rounds in single-turn mode.
    pub const ROUND_INTERVAL: Duration = Duration::from_secs(1);
    /// Pause after a batch of dragon moves.
    pub const DRAGON_INTERVAL: Duration = Duration::from_secs(1);

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TARGET_FPS: u32 = 60;

    pub fn new() -> Self {
        Self {
            target_fps: Self::DEFAULT_TARGET_FPS,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
