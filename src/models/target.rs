use serde::{Deserialize, Serialize};

use crate::models::common::GeoPoint;

/// ターゲット優先度
///
/// 宣言順（High → Medium → Low）がそのまま割り当て順になります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPriority {
    High,
    Medium,
    Low,
}

impl TargetPriority {
    /// 破壊に必要な弾薬数（High→2、それ以外→1）
    pub fn ammo_required(self) -> u32 {
        match self {
            TargetPriority::High => 2,
            TargetPriority::Medium | TargetPriority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetPriority::High => "high",
            TargetPriority::Medium => "medium",
            TargetPriority::Low => "low",
        }
    }
}

/// 攻撃目標
///
/// 作成後は不変です。破壊状態はターゲット自身ではなく
/// `DestructionTracker` が保持します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackTarget {
    pub id: String,
    pub name: String,
    pub position: GeoPoint,
    pub priority: TargetPriority,
}

impl AttackTarget {
    pub fn new(id: String, name: String, position: GeoPoint, priority: TargetPriority) -> Self {
        Self {
            id,
            name,
            position,
            priority,
        }
    }

    pub fn ammo_required(&self) -> u32 {
        self.priority.ammo_required()
    }
}

/// ID でターゲットを検索
pub fn find_target<'a>(targets: &'a [AttackTarget], target_id: &str) -> Option<&'a AttackTarget> {
    targets.iter().find(|target| target.id == target_id)
}
