//! # Engagement モジュール
//!
//! ミサイルの命中結果を目標の破壊状態とミッション全体の状況に集約します。
//!
//! - 飛翔中 → 命中 に遷移したミサイルの目標を破壊済みにし、`hit` イベントを記録
//! - 発射ごとに `launch` イベントを記録
//! - 近接撃破: ミッション機が自身の未破壊の割り当て目標に一定距離以内まで接近した場合も破壊済みにする
//!
//! 破壊状態は単調で、一度破壊された目標が再び未破壊に戻ることはありません。
//! 同じ目標を二重に計上することもありません。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{AttackTarget, Missile};

/// 近接撃破の判定距離（海里）
pub const PROXIMITY_KILL_RADIUS_NM: f64 = 2.0;

/// 交戦パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementParameters {
    pub proximity_kill_radius_nm: f64,
}

impl Default for EngagementParameters {
    fn default() -> Self {
        Self {
            proximity_kill_radius_nm: PROXIMITY_KILL_RADIUS_NM,
        }
    }
}

/// ミッションイベントの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionEventKind {
    Launch,
    Hit,
    ProximityKill,
}

/// ミッションイベントログの1件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionEvent {
    pub time_min: f64,
    #[serde(rename = "type")]
    pub kind: MissionEventKind,
    pub target_id: String,
    pub target_name: String,
    pub launching_callsign: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missile_id: Option<String>,
}

/// ミッション全体の状況
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissionStatus {
    pub total_targets: usize,
    pub destroyed_targets: usize,
    pub targets_remaining: usize,
    /// 機体ID → 撃破数
    pub destroyed_by_aircraft: BTreeMap<String, u32>,
    pub missiles_launched: u32,
    pub missiles_hit: u32,
    pub missiles_missed: u32,
}

/// 破壊状態の追跡
#[derive(Debug, Clone, Default)]
pub struct DestructionTracker {
    total_targets: usize,
    /// 目標ID → 撃破した機体ID
    destroyed: BTreeMap<String, String>,
    kills_by_aircraft: BTreeMap<String, u32>,
    events: Vec<MissionEvent>,
    missiles_launched: u32,
    missiles_hit: u32,
    missiles_missed: u32,
}

impl DestructionTracker {
    pub fn new(total_targets: usize) -> Self {
        Self {
            total_targets,
            ..Default::default()
        }
    }

    pub fn is_destroyed(&self, target_id: &str) -> bool {
        self.destroyed.contains_key(target_id)
    }

    pub fn destroyed_target_ids(&self) -> impl Iterator<Item = &String> {
        self.destroyed.keys()
    }

    pub fn events(&self) -> &[MissionEvent] {
        &self.events
    }

    /// 発射イベントの記録
    pub fn record_launch(&mut self, time_min: f64, missile: &Missile, target: &AttackTarget, callsign: &str) {
        self.missiles_launched += 1;
        self.events.push(MissionEvent {
            time_min,
            kind: MissionEventKind::Launch,
            target_id: target.id.clone(),
            target_name: target.name.clone(),
            launching_callsign: callsign.to_string(),
            missile_id: Some(missile.id.clone()),
        });
    }

    /// 命中の記録
    ///
    /// # 戻り値
    ///
    /// この命中で目標が新たに破壊済みになった場合は true
    pub fn record_hit(&mut self, time_min: f64, missile: &Missile, target: &AttackTarget, callsign: &str) -> bool {
        self.missiles_hit += 1;
        self.events.push(MissionEvent {
            time_min,
            kind: MissionEventKind::Hit,
            target_id: target.id.clone(),
            target_name: target.name.clone(),
            launching_callsign: callsign.to_string(),
            missile_id: Some(missile.id.clone()),
        });
        self.mark_destroyed(time_min, target, &missile.launcher_id, "missile")
    }

    pub fn record_miss(&mut self) {
        self.missiles_missed += 1;
    }

    /// 近接撃破の記録（破壊済みの目標は無視）
    pub fn record_proximity_kill(
        &mut self,
        time_min: f64,
        target: &AttackTarget,
        aircraft_id: &str,
        callsign: &str,
    ) -> bool {
        if self.is_destroyed(&target.id) {
            return false;
        }
        self.events.push(MissionEvent {
            time_min,
            kind: MissionEventKind::ProximityKill,
            target_id: target.id.clone(),
            target_name: target.name.clone(),
            launching_callsign: callsign.to_string(),
            missile_id: None,
        });
        self.mark_destroyed(time_min, target, aircraft_id, "proximity")
    }

    fn mark_destroyed(&mut self, time_min: f64, target: &AttackTarget, aircraft_id: &str, cause: &str) -> bool {
        if self.is_destroyed(&target.id) {
            return false;
        }

        self.destroyed.insert(target.id.clone(), aircraft_id.to_string());
        *self.kills_by_aircraft.entry(aircraft_id.to_string()).or_insert(0) += 1;

        info!(
            target_id = %target.id,
            target_name = %target.name,
            aircraft_id,
            cause,
            time_min,
            targets_remaining = self.targets_remaining(),
            "TARGET_DESTROYED: 目標を破壊しました"
        );

        true
    }

    pub fn targets_remaining(&self) -> usize {
        self.total_targets.saturating_sub(self.destroyed.len())
    }

    pub fn status(&self) -> MissionStatus {
        MissionStatus {
            total_targets: self.total_targets,
            destroyed_targets: self.destroyed.len(),
            targets_remaining: self.targets_remaining(),
            destroyed_by_aircraft: self.kills_by_aircraft.clone(),
            missiles_launched: self.missiles_launched,
            missiles_hit: self.missiles_hit,
            missiles_missed: self.missiles_missed,
        }
    }
}
