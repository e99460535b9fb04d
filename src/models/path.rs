use serde::{Deserialize, Serialize};

use crate::error::MissionError;
use crate::models::common::{FlightState, GeoPoint};

/// 時刻付きウェイポイント
///
/// `time_offset_min` はミッション開始からの経過時間（分）です。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedWaypoint {
    pub position: GeoPoint,
    pub altitude_ft: f64,
    pub time_offset_min: f64,
}

impl TimedWaypoint {
    pub fn new(position: GeoPoint, altitude_ft: f64, time_offset_min: f64) -> Self {
        Self {
            position,
            altitude_ft,
            time_offset_min,
        }
    }
}

/// 時刻パラメータ付き飛行経路
///
/// 構築時に「空でない」「時刻が単調非減少」の2条件を検証するため、
/// 一度作られた `FlightPath` に対する補間は失敗しません。
/// シナリオから読み込む場合も `try_from` を通して同じ検証が適用されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimedWaypoint>", into = "Vec<TimedWaypoint>")]
pub struct FlightPath {
    waypoints: Vec<TimedWaypoint>,
}

impl FlightPath {
    pub fn new(waypoints: Vec<TimedWaypoint>) -> Result<Self, MissionError> {
        validate_waypoints(&waypoints)?;
        Ok(Self { waypoints })
    }

    pub fn waypoints(&self) -> &[TimedWaypoint] {
        &self.waypoints
    }

    /// 経路の開始時刻（分）
    pub fn start_time(&self) -> f64 {
        self.waypoints[0].time_offset_min
    }

    /// 経路の終了時刻 = ETA（分）
    pub fn end_time(&self) -> f64 {
        self.waypoints[self.waypoints.len() - 1].time_offset_min
    }

    /// 指定時刻の位置・高度・方位
    pub fn state_at(&self, time_min: f64) -> FlightState {
        interpolate_unchecked(&self.waypoints, time_min)
    }
}

impl TryFrom<Vec<TimedWaypoint>> for FlightPath {
    type Error = MissionError;

    fn try_from(waypoints: Vec<TimedWaypoint>) -> Result<Self, Self::Error> {
        Self::new(waypoints)
    }
}

impl From<FlightPath> for Vec<TimedWaypoint> {
    fn from(path: FlightPath) -> Self {
        path.waypoints
    }
}

fn validate_waypoints(waypoints: &[TimedWaypoint]) -> Result<(), MissionError> {
    if waypoints.is_empty() {
        return Err(MissionError::InvalidPath(
            "ウェイポイントが空です".to_string(),
        ));
    }

    if let Some(index) = waypoints.iter().position(|wp| !wp.time_offset_min.is_finite()) {
        return Err(MissionError::InvalidPath(format!(
            "ウェイポイント{}の時刻が有限値ではありません: {}",
            index, waypoints[index].time_offset_min,
        )));
    }

    if let Some(index) = waypoints
        .windows(2)
        .position(|pair| pair[1].time_offset_min < pair[0].time_offset_min)
    {
        return Err(MissionError::InvalidPath(format!(
            "ウェイポイント{}の時刻 {:.3}分 が直前の {:.3}分 より前です",
            index + 1,
            waypoints[index + 1].time_offset_min,
            waypoints[index].time_offset_min,
        )));
    }

    Ok(())
}

/// 位置補間
///
/// 時刻付きウェイポイント列と問い合わせ時刻から瞬間状態を返します。
///
/// - 開始時刻以前: 先頭ウェイポイントに固定、方位は第1区間の方位
/// - 終了時刻以後: 末尾ウェイポイントに固定、方位は最終区間の方位
/// - それ以外: 該当区間で緯度・経度・高度を線形補間、方位は区間の方位（補間しない）
///
/// 空の経路は `InvalidPath` で即座に失敗します。外挿は行いません。
pub fn interpolate(waypoints: &[TimedWaypoint], time_min: f64) -> Result<FlightState, MissionError> {
    if waypoints.is_empty() {
        return Err(MissionError::InvalidPath(
            "空の経路は補間できません".to_string(),
        ));
    }
    Ok(interpolate_unchecked(waypoints, time_min))
}

/// 高度は `FlightState::altitude_ft` に持たせ、位置は水平成分のみとする
fn horizontal(point: &GeoPoint) -> GeoPoint {
    GeoPoint::new(point.lat, point.lon)
}

fn interpolate_unchecked(waypoints: &[TimedWaypoint], time_min: f64) -> FlightState {
    let first = &waypoints[0];
    let last = &waypoints[waypoints.len() - 1];

    if time_min <= first.time_offset_min {
        let heading = waypoints
            .get(1)
            .map(|next| first.position.bearing_to(&next.position))
            .unwrap_or(0.0);
        return FlightState::new(horizontal(&first.position), first.altitude_ft, heading);
    }

    if time_min >= last.time_offset_min {
        let heading = if waypoints.len() >= 2 {
            waypoints[waypoints.len() - 2].position.bearing_to(&last.position)
        } else {
            0.0
        };
        return FlightState::new(horizontal(&last.position), last.altitude_ft, heading);
    }

    // first < t < last なので 1 <= upper <= len-1
    let upper = waypoints.partition_point(|wp| wp.time_offset_min <= time_min);
    let from = &waypoints[upper - 1];
    let to = &waypoints[upper];

    let span = to.time_offset_min - from.time_offset_min;
    let fraction = if span > 0.0 {
        (time_min - from.time_offset_min) / span
    } else {
        0.0
    };

    let position = GeoPoint {
        lat: from.position.lat + (to.position.lat - from.position.lat) * fraction,
        lon: from.position.lon + (to.position.lon - from.position.lon) * fraction,
        alt_ft: None,
    };
    let altitude_ft = from.altitude_ft + (to.altitude_ft - from.altitude_ft) * fraction;
    let heading = from.position.bearing_to(&to.position);

    FlightState::new(position, altitude_ft, heading)
}
