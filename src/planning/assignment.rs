//! # 目標割り当てプランナー
//!
//! 優先度と残弾容量に基づく貪欲法のビンパッキングで、攻撃目標をミッション機へ割り当てます。
//!
//! 1. 目標を優先度の降順（High → Medium → Low）に安定ソート
//! 2. 各機体の残弾 = 搭載容量
//! 3. 目標ごとに、残弾が必要弾薬数以上の機体のうち割り当て数が最少の機体（同数なら入力順）を選ぶ
//! 4. 該当機体が無い目標は未割り当てとして計画から外す（エラーではない）
//!
//! 実行前に総必要弾薬数が総容量を超えていれば `InsufficientCapacity` を返し、何も変更しません。
//! 全体最適ではなく、機数や移動距離の最小化よりも負荷分散を優先するヒューリスティックです。

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::MissionError;
use crate::models::{AttackTarget, MissionAircraft};

/// 機体ごとの割り当て結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftAllocation {
    pub aircraft_id: String,
    pub callsign: String,
    pub ammo_capacity: u32,
    pub remaining_ammo: u32,
    pub target_ids: Vec<String>,
}

/// 割り当て計画
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentPlan {
    pub allocations: Vec<AircraftAllocation>,
    /// 容量の断片化により割り当てられなかった目標
    pub unassigned_target_ids: Vec<String>,
}

impl AssignmentPlan {
    /// 全目標が割り当てられたか
    pub fn is_complete(&self) -> bool {
        self.unassigned_target_ids.is_empty()
    }

    pub fn assigned_count(&self) -> usize {
        self.allocations.iter().map(|a| a.target_ids.len()).sum()
    }

    pub fn allocation_for(&self, aircraft_id: &str) -> Option<&AircraftAllocation> {
        self.allocations.iter().find(|a| a.aircraft_id == aircraft_id)
    }
}

/// 割り当てを実行し、各機体の `assigned_target_ids` を上書きします
///
/// # 引数
///
/// * `targets` - 攻撃目標の一覧（入力順が同優先度内のタイブレーカー）
/// * `aircraft` - ミッション機の一覧（入力順が機体選定のタイブレーカー）
///
/// # 戻り値
///
/// 割り当て計画。総容量不足の場合は `InsufficientCapacity`（機体は変更されない）
pub fn plan_assignments(
    targets: &[AttackTarget],
    aircraft: &mut [MissionAircraft],
) -> Result<AssignmentPlan, MissionError> {
    let required: u32 = targets.iter().map(AttackTarget::ammo_required).sum();
    let available: u32 = aircraft.iter().map(|a| a.ammo_capacity).sum();

    if required > available {
        warn!(
            required_ammo = required,
            available_ammo = available,
            target_count = targets.len(),
            aircraft_count = aircraft.len(),
            "ASSIGNMENT_REJECTED: 総必要弾薬数が総搭載容量を超えています"
        );
        return Err(MissionError::InsufficientCapacity { required, available });
    }

    // 優先度の降順（安定ソートなので同優先度は入力順を維持）
    let mut ordered: Vec<&AttackTarget> = targets.iter().collect();
    ordered.sort_by_key(|target| target.priority);

    let mut remaining_ammo: Vec<u32> = aircraft.iter().map(|a| a.ammo_capacity).collect();
    let mut assigned: Vec<Vec<String>> = vec![Vec::new(); aircraft.len()];
    let mut unassigned = Vec::new();

    for target in ordered {
        let needed = target.ammo_required();

        // 割り当て数最少 → 入力順
        let selected = (0..aircraft.len())
            .filter(|&index| remaining_ammo[index] >= needed)
            .min_by_key(|&index| (assigned[index].len(), index));

        match selected {
            Some(index) => {
                remaining_ammo[index] -= needed;
                assigned[index].push(target.id.clone());

                debug!(
                    target_id = %target.id,
                    priority = target.priority.as_str(),
                    ammo_required = needed,
                    aircraft_id = %aircraft[index].id,
                    remaining_ammo = remaining_ammo[index],
                    "TARGET_ASSIGNED: 目標を機体に割り当てました"
                );
            }
            None => {
                warn!(
                    target_id = %target.id,
                    priority = target.priority.as_str(),
                    ammo_required = needed,
                    "TARGET_UNASSIGNED: 残弾条件を満たす機体が無いため目標を計画から外しました"
                );
                unassigned.push(target.id.clone());
            }
        }
    }

    let mut allocations = Vec::with_capacity(aircraft.len());
    for ((craft, target_ids), remaining) in aircraft.iter_mut().zip(assigned).zip(remaining_ammo) {
        craft.assigned_target_ids = target_ids.clone();
        allocations.push(AircraftAllocation {
            aircraft_id: craft.id.clone(),
            callsign: craft.callsign.clone(),
            ammo_capacity: craft.ammo_capacity,
            remaining_ammo: remaining,
            target_ids,
        });
    }

    let plan = AssignmentPlan {
        allocations,
        unassigned_target_ids: unassigned,
    };

    info!(
        target_count = targets.len(),
        assigned_count = plan.assigned_count(),
        unassigned_count = plan.unassigned_target_ids.len(),
        required_ammo = required,
        available_ammo = available,
        "ASSIGNMENT_COMPLETE: 目標割り当てが完了しました"
    );

    Ok(plan)
}
