use serde::{Deserialize, Serialize};

use crate::models::{
    common::{FlightState, GeoPoint},
    path::FlightPath,
    traits::ITrackable,
};

fn default_color() -> String {
    "#3388ff".to_string()
}

fn default_ambient_color() -> String {
    "#888888".to_string()
}

/// 外部の経路計画から供給される経路
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalRoute {
    /// 時刻・高度付きの詳細経路（そのまま採用）
    Detailed { waypoints: FlightPath },
    /// 時刻を持たない中心線（一定速度を仮定して時刻を付与）
    Centerline { points: Vec<GeoPoint> },
}

/// ミッション機
///
/// 計画前にオペレータが作成し、割り当てプランナーが `assigned_target_ids` を、
/// 経路合成器が `path` を設定します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionAircraft {
    pub id: String,
    pub callsign: String,
    pub ammo_capacity: u32,
    #[serde(default)]
    pub assigned_target_ids: Vec<String>,
    #[serde(default)]
    pub route: Option<ExternalRoute>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(skip)]
    pub path: Option<FlightPath>,
}

impl MissionAircraft {
    pub fn new(id: String, callsign: String, ammo_capacity: u32) -> Self {
        Self {
            id,
            callsign,
            ammo_capacity,
            assigned_target_ids: Vec::new(),
            route: None,
            color: default_color(),
            path: None,
        }
    }

    pub fn with_route(mut self, route: ExternalRoute) -> Self {
        self.route = Some(route);
        self
    }
}

/// ミッション外の周辺航空機
///
/// 問い合わせ時点の静的な状態としてのみ扱い、補間器では前進させません。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientTraffic {
    pub flight_id: String,
    pub callsign: String,
    pub position: GeoPoint,
    pub altitude_ft: f64,
    pub heading_deg: f64,
    pub speed_kt: f64,
    #[serde(default = "default_ambient_color")]
    pub color: String,
}

/// 飛行状態（表示用の情報で、シミュレーションの挙動には影響しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    #[default]
    EnRoute,
    Attacking,
    Rtb,
    Landed,
}

impl FlightStatus {
    /// 現在の状況から飛行状態を導出
    ///
    /// 着陸（ETA 経過）→ 帰投（割り当て目標が全て破壊済み）→
    /// 攻撃中（未破壊目標が射程内）→ 進出中 の順に判定します。
    pub fn derive(
        time_min: f64,
        eta_min: Option<f64>,
        all_targets_destroyed: bool,
        live_target_in_range: bool,
    ) -> Self {
        match eta_min {
            Some(eta) if time_min >= eta => FlightStatus::Landed,
            _ if all_targets_destroyed => FlightStatus::Rtb,
            _ if live_target_in_range => FlightStatus::Attacking,
            _ => FlightStatus::EnRoute,
        }
    }
}

/// 周辺機の運動状態
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticKinematics {
    pub state: FlightState,
    pub speed_kt: f64,
}

/// シミュレーション上の運動モデル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlightKinematics {
    /// ミッション機: 時刻付き経路を補間
    Planned { path: FlightPath },
    /// 周辺機: 単一の現在状態
    Static(StaticKinematics),
}

/// シミュレーション用の飛行体投影
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedFlight {
    pub flight_id: String,
    pub callsign: String,
    pub kinematics: FlightKinematics,
    pub eta_min: Option<f64>,
    pub color: String,
    pub is_mission_aircraft: bool,
    pub assigned_target_ids: Vec<String>,
    pub status: FlightStatus,
}

impl SimulatedFlight {
    /// ミッション機から生成（経路未設定または割り当てなしの場合は None）
    pub fn from_mission_aircraft(aircraft: &MissionAircraft) -> Option<Self> {
        if aircraft.assigned_target_ids.is_empty() {
            return None;
        }
        let path = aircraft.path.clone()?;
        let eta = path.end_time();

        Some(Self {
            flight_id: aircraft.id.clone(),
            callsign: aircraft.callsign.clone(),
            kinematics: FlightKinematics::Planned { path },
            eta_min: Some(eta),
            color: aircraft.color.clone(),
            is_mission_aircraft: true,
            assigned_target_ids: aircraft.assigned_target_ids.clone(),
            status: FlightStatus::EnRoute,
        })
    }

    pub fn from_ambient(traffic: &AmbientTraffic) -> Self {
        let state = FlightState::new(traffic.position, traffic.altitude_ft, traffic.heading_deg);
        Self {
            flight_id: traffic.flight_id.clone(),
            callsign: traffic.callsign.clone(),
            kinematics: FlightKinematics::Static(StaticKinematics {
                state,
                speed_kt: traffic.speed_kt,
            }),
            eta_min: None,
            color: traffic.color.clone(),
            is_mission_aircraft: false,
            assigned_target_ids: Vec::new(),
            status: FlightStatus::EnRoute,
        }
    }

    pub fn path(&self) -> Option<&FlightPath> {
        match &self.kinematics {
            FlightKinematics::Planned { path } => Some(path),
            FlightKinematics::Static(_) => None,
        }
    }
}

impl ITrackable for SimulatedFlight {
    fn state_at(&self, time_min: f64) -> FlightState {
        match &self.kinematics {
            FlightKinematics::Planned { path } => path.state_at(time_min),
            FlightKinematics::Static(kinematics) => kinematics.state,
        }
    }
}
