//! Game tuning tables
//!
//! Every constant the simulation uses lives here. The two game variants are
//! presets of the same [`GameConfig`]:
//! - [`GameConfig::arena`]: small screen, timed enemy waves (default)
//! - [`GameConfig::roster`]: larger screen, hand-placed roster, no waves,
//!   allies fall back to following the player, grip enabled

use std::f32::consts::PI;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH, SHOOT_RELOAD_MS, TIME_STEP_MS};
use crate::error::ConfigError;
use crate::physics::WorldSettings;
use crate::sim::entity::{EntityKind, Team};

/// One value per team
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamTable<T> {
    pub neutral: T,
    pub player: T,
    pub ally: T,
    pub enemy: T,
    pub scrap: T,
}

impl<T> TeamTable<T> {
    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::Neutral => &self.neutral,
            Team::Player => &self.player,
            Team::Ally => &self.ally,
            Team::Enemy => &self.enemy,
            Team::Scrap => &self.scrap,
        }
    }
}

/// Size and mass of a spawned body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub radius: f32,
    pub mass: f32,
}

/// Body sizes keyed by (kind, team)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyTable {
    pub player_tank: BodySpec,
    pub enemy_tank: BodySpec,
    pub ally_tank: BodySpec,
    pub bullet: BodySpec,
    /// Any other (kind, team) combination
    pub fallback: BodySpec,
}

impl Default for BodyTable {
    fn default() -> Self {
        Self {
            player_tank: BodySpec { radius: 10.0, mass: 100.0 },
            enemy_tank: BodySpec { radius: 7.0, mass: 50.0 },
            ally_tank: BodySpec { radius: 3.0, mass: 20.0 },
            bullet: BodySpec { radius: 2.0, mass: 30.0 },
            fallback: BodySpec { radius: 1.0, mass: 1.0 },
        }
    }
}

impl BodyTable {
    pub fn lookup(&self, kind: EntityKind, team: Team) -> BodySpec {
        match (kind, team) {
            (EntityKind::Tank, Team::Player) => self.player_tank,
            (EntityKind::Tank, Team::Enemy) => self.enemy_tank,
            (EntityKind::Tank, Team::Ally) => self.ally_tank,
            (EntityKind::Bullet, _) => self.bullet,
            _ => self.fallback,
        }
    }

    fn all(&self) -> [BodySpec; 5] {
        [self.player_tank, self.enemy_tank, self.ally_tank, self.bullet, self.fallback]
    }
}

/// Per-team actuation units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorSpec {
    /// Linear acceleration unit (force = factor * unit * mass)
    pub speed_unit: f32,
    /// Angular acceleration unit (torque = unit * moment)
    pub angle_unit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub forward_factor: f32,
    pub reverse_factor: f32,
    pub units: TeamTable<MotorSpec>,
}

impl Default for MotorConfig {
    fn default() -> Self {
        let base = MotorSpec { speed_unit: 100.0, angle_unit: 20.0 };
        Self {
            forward_factor: 5.0,
            reverse_factor: 4.0,
            units: TeamTable {
                neutral: base,
                player: base,
                ally: MotorSpec { speed_unit: 200.0, angle_unit: 60.0 },
                enemy: MotorSpec { speed_unit: 150.0, angle_unit: 20.0 },
                scrap: base,
            },
        }
    }
}

/// Passive top-down drag on tanks and scrap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub linear: f32,
    pub angular: f32,
    /// Drag multiplier while Grip is held
    pub grip_multiplier: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            linear: 5.0,
            angular: 5.0,
            grip_multiplier: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub reload_ms: i32,
    /// Distance ahead of the tank center where bullets appear
    pub muzzle_offset: f32,
    /// Base launch speed scaled by the tank/bullet mass ratio
    pub launch_speed: f32,
    /// Bullets below this kinetic energy (m·v²) are removed
    pub bullet_min_energy: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            reload_ms: SHOOT_RELOAD_MS,
            muzzle_offset: 15.0,
            launch_speed: 3000.0,
            bullet_min_energy: 600_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Radius of the enemy flocking query
    pub flock_radius: f32,
    /// Separation strength (k / distance²)
    pub separation: f32,
    /// Pull toward the player (k / distance²)
    pub attraction: f32,
    /// Radius in which allies look for an enemy to block
    pub ally_search_radius: f32,
    /// Allies with nothing to block follow the player
    pub ally_follow_player: bool,
    /// Allies only drive toward the player beyond this squared distance
    pub ally_follow_distance_sq: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            flock_radius: 100.0,
            separation: 300.0,
            attraction: 25.0,
            ally_search_radius: 200.0,
            ally_follow_player: false,
            ally_follow_distance_sq: 4900.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub interval_ms: u32,
    /// Distance from the player of the first enemy in a wave
    pub fan_distance: f32,
    /// Angle between consecutive enemies of a wave (radians)
    pub fan_step: f32,
    /// Waves needed for each extra enemy per wave
    pub waves_per_extra_enemy: u32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            fan_distance: 600.0,
            fan_step: PI / 18.0,
            waves_per_extra_enemy: 3,
        }
    }
}

/// Allies spawned from destroyed scrap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinforcementConfig {
    /// Every n-th bullet hit on scrap spawns a wave of allies
    pub hits_per_wave: u32,
    pub count: u32,
    /// Magnitude of the outward burst impulse
    pub impulse: f32,
}

impl Default for ReinforcementConfig {
    fn default() -> Self {
        Self {
            hits_per_wave: 4,
            count: 3,
            impulse: 50.0 * 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: f32,
    pub height: f32,
    /// Radius of off-screen edge markers
    pub marker_radius: f32,
    /// Blink half-period of the start prompt (ms)
    pub blink_ms: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            marker_radius: 5.0,
            blink_ms: 500,
        }
    }
}

/// A tank placed on every start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub position: Vec2,
    pub team: Team,
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed simulation step (ms)
    pub tick_ms: u32,
    pub view: ViewConfig,
    pub world: WorldSettings,
    pub bodies: BodyTable,
    pub motors: MotorConfig,
    pub drag: DragConfig,
    /// Lifespan before the team transition (ms, 0 = never)
    pub lifespan_ms: TeamTable<i32>,
    pub weapon: WeaponConfig,
    pub ai: AiConfig,
    /// Timed enemy waves; `None` disables them
    pub waves: Option<WaveConfig>,
    pub roster: Vec<RosterEntry>,
    pub reinforcements: ReinforcementConfig,
    /// Whether the Grip control has any effect
    pub grip_enabled: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::arena()
    }
}

impl GameConfig {
    /// Small arena with escalating enemy waves
    pub fn arena() -> Self {
        Self {
            tick_ms: TIME_STEP_MS,
            view: ViewConfig::default(),
            world: WorldSettings::default(),
            bodies: BodyTable::default(),
            motors: MotorConfig::default(),
            drag: DragConfig::default(),
            lifespan_ms: TeamTable {
                neutral: 0,
                player: 0,
                ally: 20_000,
                enemy: 15_000,
                scrap: 0,
            },
            weapon: WeaponConfig::default(),
            ai: AiConfig::default(),
            waves: Some(WaveConfig::default()),
            roster: Vec::new(),
            reinforcements: ReinforcementConfig::default(),
            grip_enabled: false,
        }
    }

    /// Larger field with a fixed starting roster and no waves
    pub fn roster() -> Self {
        let mut roster = Vec::new();
        // Ring of enemies around the start
        for i in 0..8 {
            let theta = i as f32 * PI / 4.0;
            roster.push(RosterEntry {
                position: Vec2::new(theta.cos(), theta.sin()) * 300.0,
                team: Team::Enemy,
            });
        }
        // Escort beside the player
        for x in [-30.0, 30.0] {
            roster.push(RosterEntry {
                position: Vec2::new(x, -20.0),
                team: Team::Ally,
            });
        }

        let mut config = Self::arena();
        config.view.width = 640.0;
        config.view.height = 480.0;
        config.motors.units.enemy.speed_unit = 120.0;
        config.lifespan_ms.enemy = 30_000;
        config.lifespan_ms.ally = 30_000;
        config.ai.ally_follow_player = true;
        config.waves = None;
        config.roster = roster;
        config.grip_enabled = true;
        config
    }

    /// Parse a JSON config; missing fields take arena defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.tick_ms == 0 {
            return invalid("tick_ms must be positive");
        }
        // Timers count down in i32 milliseconds
        if self.tick_ms > i32::MAX as u32 {
            return invalid("tick_ms must fit the i32 countdown timers");
        }
        if self.view.width <= 0.0 || self.view.height <= 0.0 {
            return invalid("view size must be positive");
        }
        if self
            .bodies
            .all()
            .iter()
            .any(|spec| spec.radius <= 0.0 || spec.mass <= 0.0)
        {
            return invalid("body radius and mass must be positive");
        }
        if self.ai.flock_radius <= 0.0 || self.ai.ally_search_radius <= 0.0 {
            return invalid("AI search radii must be positive");
        }
        if self.reinforcements.hits_per_wave == 0 {
            return invalid("reinforcements.hits_per_wave must be at least 1");
        }
        if let Some(waves) = &self.waves {
            if waves.interval_ms == 0 || waves.waves_per_extra_enemy == 0 {
                return invalid("wave interval and waves_per_extra_enemy must be positive");
            }
        }
        if !(0.0..=1.0).contains(&self.world.damping) {
            return invalid("world damping must be within 0..=1");
        }
        Ok(())
    }

    /// Tick length in seconds, the physics world's native unit
    pub fn tick_secs(&self) -> f32 {
        self.tick_ms as f32 / 1000.0
    }

    /// Initial scrap timer for a freshly spawned entity
    pub fn lifespan(&self, team: Team) -> i32 {
        *self.lifespan_ms.get(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(GameConfig::arena().validate().is_ok());
        assert!(GameConfig::roster().validate().is_ok());
    }

    #[test]
    fn test_body_lookup() {
        let bodies = BodyTable::default();
        assert_eq!(bodies.lookup(EntityKind::Tank, Team::Player).mass, 100.0);
        assert_eq!(bodies.lookup(EntityKind::Tank, Team::Enemy).radius, 7.0);
        assert_eq!(bodies.lookup(EntityKind::Bullet, Team::Neutral).mass, 30.0);
        assert_eq!(bodies.lookup(EntityKind::Scrap, Team::Scrap).mass, 1.0);
        // Player tank is heavier and larger than an enemy tank
        assert!(bodies.player_tank.mass > bodies.enemy_tank.mass);
        assert!(bodies.player_tank.radius > bodies.enemy_tank.radius);
    }

    #[test]
    fn test_lifespan_only_for_ally_and_enemy() {
        let config = GameConfig::arena();
        assert_eq!(config.lifespan(Team::Enemy), 15_000);
        assert_eq!(config.lifespan(Team::Ally), 20_000);
        assert_eq!(config.lifespan(Team::Player), 0);
        assert_eq!(config.lifespan(Team::Neutral), 0);
    }

    #[test]
    fn test_from_json_partial_override() {
        let config = GameConfig::from_json(r#"{ "tick_ms": 20, "waves": null }"#).unwrap();
        assert_eq!(config.tick_ms, 20);
        assert!(config.waves.is_none());
        // Untouched sections keep arena defaults
        assert_eq!(config.weapon, WeaponConfig::default());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = GameConfig::from_json(r#"{ "tick_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_tick_length_bounded_by_timer_range() {
        let mut config = GameConfig::arena();
        config.tick_ms = i32::MAX as u32;
        assert!(config.validate().is_ok());
        config.tick_ms = i32::MAX as u32 + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let err = GameConfig::from_json(r#"{ "tick_ms": 4294967295 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_json_roundtrip_of_roster_preset() {
        let roster = GameConfig::roster();
        let json = serde_json::to_string(&roster).unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), roster);
    }
}
