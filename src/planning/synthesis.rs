//! # 飛行経路合成器
//!
//! 目標を割り当てられた機体ごとに時刻付き経路を生成します。
//!
//! - 詳細経路（時刻・高度付き）が外部から与えられていればそのまま採用
//! - 中心線のみが与えられていれば、一定の合成速度を仮定して累積大圏距離から時刻を付与
//! - 外部経路が無ければ、基地 → 上昇完了 → 各目標 → 帰投 → 着陸 の直行経路を合成
//!
//! 目標一覧に存在しない割り当てIDはデータ不整合としてログ出力し、その地点を飛ばします。

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::MissionError;
use crate::models::{
    AttackTarget, ExternalRoute, FlightPath, GeoPoint, MissionAircraft, SimulatedFlight, TimedWaypoint,
    find_target,
};

/// 経路合成パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParameters {
    /// 中心線に時刻を付与する際の合成速度（kt）
    pub speed_kt: f64,
    /// 巡航高度（ft）
    pub cruise_altitude_ft: f64,
    /// 離陸から上昇完了までの時間（分）
    pub climb_time_min: f64,
    /// 最初の目標に到達する時刻（分）
    pub first_target_time_min: f64,
    /// 目標間の滞空時間（分）
    pub target_dwell_min: f64,
    /// 帰投から着陸までの時間（分）
    pub landing_time_min: f64,
}

impl Default for SynthesisParameters {
    fn default() -> Self {
        Self {
            speed_kt: 500.0,
            cruise_altitude_ft: 30_000.0,
            climb_time_min: 5.0,
            first_target_time_min: 10.0,
            target_dwell_min: 15.0,
            landing_time_min: 5.0,
        }
    }
}

/// 1機分の経路を合成
///
/// 割り当て目標が無い機体は `None`（シミュレーション対象外）を返します。
pub fn synthesize_path(
    aircraft: &MissionAircraft,
    targets: &[AttackTarget],
    base: &GeoPoint,
    params: &SynthesisParameters,
) -> Result<Option<FlightPath>, MissionError> {
    if aircraft.assigned_target_ids.is_empty() {
        return Ok(None);
    }

    let path = match &aircraft.route {
        Some(ExternalRoute::Detailed { waypoints }) => waypoints.clone(),
        Some(ExternalRoute::Centerline { points }) => centerline_path(points, params)?,
        None => direct_path(aircraft, targets, base, params)?,
    };

    debug!(
        aircraft_id = %aircraft.id,
        waypoint_count = path.waypoints().len(),
        eta_min = path.end_time(),
        "PATH_SYNTHESIZED: 飛行経路を生成しました"
    );

    Ok(Some(path))
}

/// 中心線に一定速度の時刻を付与
///
/// `time_offset = 累積距離 / 速度 × 60`（分）。高度は各点の指定値、無ければ巡航高度です。
pub fn centerline_path(points: &[GeoPoint], params: &SynthesisParameters) -> Result<FlightPath, MissionError> {
    let mut waypoints = Vec::with_capacity(points.len());
    let mut cumulative_nm = 0.0;

    for (index, point) in points.iter().enumerate() {
        if index > 0 {
            cumulative_nm += points[index - 1].distance_to(point);
        }
        let altitude = point.alt_ft.unwrap_or(params.cruise_altitude_ft);
        let time_offset = cumulative_nm / params.speed_kt * 60.0;
        waypoints.push(TimedWaypoint::new(*point, altitude, time_offset));
    }

    FlightPath::new(waypoints)
}

fn direct_path(
    aircraft: &MissionAircraft,
    targets: &[AttackTarget],
    base: &GeoPoint,
    params: &SynthesisParameters,
) -> Result<FlightPath, MissionError> {
    let cruise = params.cruise_altitude_ft;
    let mut waypoints = vec![
        TimedWaypoint::new(*base, base.alt_ft.unwrap_or(0.0), 0.0),
        TimedWaypoint::new(*base, cruise, params.climb_time_min),
    ];

    let mut time = params.first_target_time_min;
    for target_id in &aircraft.assigned_target_ids {
        match find_target(targets, target_id) {
            Some(target) => {
                waypoints.push(TimedWaypoint::new(target.position, cruise, time));
                time += params.target_dwell_min;
            }
            None => {
                let error = MissionError::MissingTargetReference {
                    aircraft_id: aircraft.id.clone(),
                    target_id: target_id.clone(),
                };
                warn!(
                    aircraft_id = %aircraft.id,
                    target_id = %target_id,
                    error = %error,
                    "PATH_TARGET_SKIPPED: 目標一覧に無い割り当てを経路から除外しました"
                );
            }
        }
    }

    // 帰投 → 着陸
    waypoints.push(TimedWaypoint::new(*base, cruise, time));
    waypoints.push(TimedWaypoint::new(*base, 0.0, time + params.landing_time_min));

    FlightPath::new(waypoints)
}

/// 全機の経路を合成し、シミュレーション用の飛行体を返します
///
/// 各機体の `path` を更新します。割り当てのない機体は結果に含まれません。
pub fn synthesize_flights(
    aircraft: &mut [MissionAircraft],
    targets: &[AttackTarget],
    base: &GeoPoint,
    params: &SynthesisParameters,
) -> Result<Vec<SimulatedFlight>, MissionError> {
    let mut flights = Vec::new();

    for craft in aircraft.iter_mut() {
        craft.path = synthesize_path(craft, targets, base, params)?;
        if let Some(flight) = SimulatedFlight::from_mission_aircraft(craft) {
            flights.push(flight);
        }
    }

    info!(
        aircraft_count = aircraft.len(),
        mission_flight_count = flights.len(),
        "PATH_SYNTHESIS_COMPLETE: ミッション機の経路合成が完了しました"
    );

    Ok(flights)
}
