//! Game configuration — все tuning-константы в одном Resource.
//!
//! Значения по умолчанию = последний (самый полный) вариант баланса.
//! Загружается из RON (`GameConfig::load`), любые отсутствующие поля
//! берутся из Default (`#[serde(default)]`).
//!
//! Lookups по имени (`enemy_type`, `attack`) не падают: промах → default + warning.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::logger;

/// Имя типа врага по умолчанию
pub const DEFAULT_ENEMY_TYPE: &str = "guard";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse RON config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub combat: CombatConfig,
    pub physics: PhysicsConfig,
    pub boomerang: BoomerangConfig,
    pub hazards: HazardConfig,
    pub timings: TimingConfig,
}

impl GameConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Конфиг типа врага по имени.
    ///
    /// Промах → `enemy.default_type` → встроенный guard.
    pub fn enemy_type(&self, name: &str) -> EnemyTypeConfig {
        if let Some(config) = self.enemy.types.get(name) {
            return config.clone();
        }

        logger::log_warning(&format!(
            "⚠️ Unknown enemy type '{}', falling back to '{}'",
            name, self.enemy.default_type
        ));

        self.enemy
            .types
            .get(&self.enemy.default_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Конфиг атаки по ключу (`punch`, `kick`, `jump_kick`). Промах → punch.
    pub fn attack(&self, key: &str) -> AttackConfig {
        if let Some(config) = self.combat.attacks.get(key) {
            return config.clone();
        }

        logger::log_warning(&format!("⚠️ Unknown attack '{}', falling back to punch", key));
        self.combat
            .attacks
            .get("punch")
            .cloned()
            .unwrap_or_else(AttackConfig::punch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub jump_speed: f32,
    pub acceleration: f32,
    /// Ускорение во время атак (дрейф в комбо)
    pub attack_acceleration: f32,
    pub max_speed: f32,

    pub health: u32,
    pub lives: u32,
    /// Окно неуязвимости после попадания (Combatant::hit_invuln_frames)
    pub invuln_frames: u32,
    pub respawn_invuln_frames: u32,

    pub gravity: f32,
    pub friction: f32,
    pub attack_friction: f32,

    pub collision_width: f32,
    pub collision_height: f32,

    /// Sliding: минимальная |speedX| для входа, скорость и длительность
    pub slide_threshold: f32,
    pub slide_speed: f32,
    pub slide_frames: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            jump_speed: 15.0,
            acceleration: 0.75,
            attack_acceleration: 0.1,
            max_speed: 6.0,
            health: 100,
            lives: 3,
            invuln_frames: 30,
            respawn_invuln_frames: 90,
            gravity: 0.75,
            friction: 0.5,
            attack_friction: 0.2,
            collision_width: 16.0,
            collision_height: 40.0,
            slide_threshold: 4.0,
            slide_speed: 6.0,
            slide_frames: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTypeConfig {
    pub health: u32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub attack_range: f32,
    pub chase_range: f32,
    pub stopping_distance: f32,
    pub attack_cooldown: u32,
    pub invuln_frames: u32,
    pub attack_duration: u32,
    pub hitstun_duration: u32,

    pub damage: u32,
    pub knockback: f32,
    /// Ключ layout'а хитбоксов в `combat.attacks`
    pub attack: String,

    pub gravity: f32,
    pub friction: f32,
    pub max_speed: f32,

    pub collision_width: f32,
    pub collision_height: f32,

    /// RGBA tint для рендер-коллаборатора
    pub tint: [u8; 4],
}

impl Default for EnemyTypeConfig {
    fn default() -> Self {
        Self {
            health: 60,
            patrol_speed: 2.0,
            chase_speed: 2.5,
            attack_range: 36.0,
            chase_range: 80.0,
            stopping_distance: 28.0,
            attack_cooldown: 60,
            invuln_frames: 15,
            attack_duration: 30,
            hitstun_duration: 15,
            damage: 10,
            knockback: 5.0,
            attack: "punch".to_string(),
            gravity: 0.75,
            friction: 0.2,
            max_speed: 6.0,
            collision_width: 16.0,
            collision_height: 40.0,
            tint: [255, 255, 255, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub types: BTreeMap<String, EnemyTypeConfig>,
    pub default_type: String,
    /// Disengage дистанция = chase_range × hysteresis
    pub hysteresis: f32,
    /// Полуширина патруля вокруг спавна (без именованного пути)
    pub default_patrol_distance: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        types.insert(DEFAULT_ENEMY_TYPE.to_string(), EnemyTypeConfig::default());
        types.insert(
            "brute".to_string(),
            EnemyTypeConfig {
                health: 120,
                patrol_speed: 1.5,
                chase_speed: 1.8,
                attack_range: 40.0,
                attack_cooldown: 90,
                attack_duration: 40,
                hitstun_duration: 10,
                damage: 18,
                knockback: 7.0,
                attack: "kick".to_string(),
                collision_width: 20.0,
                collision_height: 44.0,
                tint: [255, 120, 120, 255],
                ..EnemyTypeConfig::default()
            },
        );

        Self {
            types,
            default_type: DEFAULT_ENEMY_TYPE.to_string(),
            hysteresis: 1.5,
            default_patrol_distance: 32.0,
        }
    }
}

/// Один прямоугольник хитбокса относительно атакующего
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct HitboxShape {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl HitboxShape {
    pub const fn new(width: f32, height: f32, offset_x: f32, offset_y: f32) -> Self {
        Self { width, height, offset_x, offset_y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackConfig {
    pub damage: u32,
    pub knockback: f32,
    pub hitboxes: Vec<HitboxShape>,
}

impl AttackConfig {
    pub fn punch() -> Self {
        Self {
            damage: 15,
            knockback: 3.0,
            hitboxes: vec![HitboxShape::new(20.0, 16.0, 0.0, 0.0)],
        }
    }

    pub fn kick() -> Self {
        Self {
            damage: 22,
            knockback: 5.0,
            hitboxes: vec![HitboxShape::new(28.0, 20.0, 0.0, 0.0)],
        }
    }

    /// Прыжковый удар: вперёд, по диагонали, вниз
    pub fn jump_kick() -> Self {
        Self {
            damage: 22,
            knockback: 5.0,
            hitboxes: vec![
                HitboxShape::new(28.0, 20.0, 0.0, 0.0),
                HitboxShape::new(16.0, 16.0, 10.0, 10.0),
                HitboxShape::new(12.0, 24.0, 0.0, 20.0),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub attacks: BTreeMap<String, AttackConfig>,
    pub hitbox_lifetime: u32,
    /// Бонус за кадр заряда: bonus = 1 + charge × rate
    pub charge_bonus_rate: f32,
    pub max_charge_time: u32,
    /// Вертикальный подброс при knockback (вверх)
    pub knockback_lift: f32,
    /// |knockback| ≥ threshold → игрок уходит в Knockback, иначе Hit
    pub knockback_state_threshold: f32,
    /// Без новой атаки столько кадров → комбо снова с punch
    pub combo_reset_frames: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        let mut attacks = BTreeMap::new();
        attacks.insert("punch".to_string(), AttackConfig::punch());
        attacks.insert("kick".to_string(), AttackConfig::kick());
        attacks.insert("jump_kick".to_string(), AttackConfig::jump_kick());

        Self {
            attacks,
            hitbox_lifetime: 10,
            charge_bonus_rate: 1.0 / 60.0,
            max_charge_time: 60,
            knockback_lift: 2.0,
            knockback_state_threshold: 6.0,
            combo_reset_frames: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Кламп |speedY| перед вертикальным запросом
    pub vertical_speed_clamp: f32,
    /// Максимальная скорость падения при wall slide
    pub wall_slide_speed: f32,
    /// Платформа блокирует только если bottom < platform.top + threshold
    pub platform_drop_threshold: f32,
    /// Мягкое отталкивание персонажей
    pub character_pushback: f32,
    /// Глубина probe для рамп
    pub ramp_probe_depth: f32,
    pub ramp_snap_fudge: f32,
    pub cell_size: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            vertical_speed_clamp: 16.0,
            wall_slide_speed: 1.0,
            platform_drop_threshold: 4.0,
            character_pushback: 1.0,
            ramp_probe_depth: 8.0,
            ramp_snap_fudge: 0.1,
            cell_size: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoomerangConfig {
    pub throw_speed: f32,
    pub return_speed: f32,
    pub base_range: f32,
    pub max_charge_range: f32,
    pub pierce_distance: f32,
    pub gravity: f32,
    pub max_charge_time: u32,
    pub damage: u32,
    pub size: f32,
    /// Смещение спавна от центра владельца по facing
    pub spawn_offset: f32,
    /// Начальная вертикальная скорость (вверх)
    pub launch_lift: f32,
    pub enemy_knockback: f32,
}

impl Default for BoomerangConfig {
    fn default() -> Self {
        Self {
            throw_speed: 6.0,
            return_speed: 8.0,
            base_range: 150.0,
            max_charge_range: 300.0,
            pierce_distance: 40.0,
            gravity: 0.05,
            max_charge_time: 60,
            damage: 20,
            size: 12.0,
            spawn_offset: 10.0,
            launch_lift: 2.0,
            enemy_knockback: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub fire_damage: u32,
    pub fire_knockback: f32,
    pub pulse_on_frames: u32,
    pub pulse_off_frames: u32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            fire_damage: 10,
            fire_knockback: 4.0,
            pulse_on_frames: 60,
            pulse_off_frames: 90,
        }
    }
}

/// Длительности состояний (кадры). Атаки/бросок — fallback, если нет
/// сигнала `AnimationFinished` от анимационного коллаборатора.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub punch_frames: u32,
    pub kick_frames: u32,
    pub jump_kick_frames: u32,
    pub throw_frames: u32,
    pub hitstun_frames: u32,
    pub knockback_frames: u32,
    pub death_frames: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            punch_frames: 20,
            kick_frames: 24,
            jump_kick_frames: 24,
            throw_frames: 16,
            hitstun_frames: 30,
            knockback_frames: 20,
            death_frames: 60,
        }
    }
}
