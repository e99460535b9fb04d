//! # Proximity モジュール
//!
//! ある時刻における全飛行体の位置から、ミッション機と他機の接近を検出します。
//!
//! ミッション機ごとに他の全飛行体（他のミッション機と周辺機を含む）との
//! 水平距離と高度差を求め、重大度を分類します。ペアはミッション機側からの向き付きで、
//! ミッション機同士の接近は双方から報告されます（重複排除はしない）。

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{FlightState, geodesy};

/// 警告の重大度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

/// 接近判定の閾値
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityThresholds {
    pub critical_distance_nm: f64,
    pub critical_altitude_ft: f64,
    pub warning_distance_nm: f64,
    pub warning_altitude_ft: f64,
}

impl Default for ProximityThresholds {
    fn default() -> Self {
        Self {
            critical_distance_nm: 5.0,
            critical_altitude_ft: 1_000.0,
            warning_distance_nm: 10.0,
            warning_altitude_ft: 2_000.0,
        }
    }
}

/// 接近警告（ティックごとに導出し、保持しない）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityWarning {
    pub flight_id: String,
    pub other_flight_id: String,
    pub callsign: String,
    pub other_callsign: String,
    pub distance_nm: f64,
    pub altitude_diff_ft: f64,
    pub severity: Severity,
}

/// 判定対象の飛行体（現在時刻の状態）
#[derive(Debug, Clone, Copy)]
pub struct TrafficSample<'a> {
    pub flight_id: &'a str,
    pub callsign: &'a str,
    pub is_mission_aircraft: bool,
    pub state: FlightState,
}

/// 距離と高度差から重大度を分類
///
/// Critical を先に判定し、該当しない場合のみ Warning を判定します。
pub fn classify(distance_nm: f64, altitude_diff_ft: f64, thresholds: &ProximityThresholds) -> Option<Severity> {
    if distance_nm < thresholds.critical_distance_nm && altitude_diff_ft < thresholds.critical_altitude_ft {
        Some(Severity::Critical)
    } else if distance_nm < thresholds.warning_distance_nm && altitude_diff_ft < thresholds.warning_altitude_ft {
        Some(Severity::Warning)
    } else {
        None
    }
}

/// 接近の検出
///
/// # 引数
///
/// * `samples` - 全飛行体の現在状態
/// * `thresholds` - 判定閾値
/// * `time_min` - ログ用のシミュレーション時刻（分）
pub fn detect_conflicts(
    samples: &[TrafficSample<'_>],
    thresholds: &ProximityThresholds,
    time_min: f64,
) -> Vec<ProximityWarning> {
    let mut warnings = Vec::new();

    for own in samples.iter().filter(|s| s.is_mission_aircraft) {
        for other in samples.iter().filter(|s| s.flight_id != own.flight_id) {
            let distance = geodesy::distance_nm(&own.state.position, &other.state.position);
            let altitude_diff = (own.state.altitude_ft - other.state.altitude_ft).abs();

            let Some(severity) = classify(distance, altitude_diff, thresholds) else {
                continue;
            };

            match severity {
                Severity::Critical => warn!(
                    flight_id = own.flight_id,
                    other_flight_id = other.flight_id,
                    distance_nm = distance,
                    altitude_diff_ft = altitude_diff,
                    time_min,
                    "PROXIMITY_CRITICAL: 危険な接近を検出しました"
                ),
                Severity::Warning => debug!(
                    flight_id = own.flight_id,
                    other_flight_id = other.flight_id,
                    distance_nm = distance,
                    altitude_diff_ft = altitude_diff,
                    time_min,
                    "PROXIMITY_WARNING: 接近を検出しました"
                ),
            }

            warnings.push(ProximityWarning {
                flight_id: own.flight_id.to_string(),
                other_flight_id: other.flight_id.to_string(),
                callsign: own.callsign.to_string(),
                other_callsign: other.callsign.to_string(),
                distance_nm: distance,
                altitude_diff_ft: altitude_diff,
                severity,
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn sample<'a>(id: &'a str, mission: bool, lat: f64, altitude_ft: f64) -> TrafficSample<'a> {
        TrafficSample {
            flight_id: id,
            callsign: id,
            is_mission_aircraft: mission,
            state: FlightState::new(GeoPoint::new(lat, 0.0), altitude_ft, 0.0),
        }
    }

    #[test]
    fn test_classification_boundaries() {
        let t = ProximityThresholds::default();
        assert_eq!(classify(4.9, 900.0, &t), Some(Severity::Critical));
        assert_eq!(classify(9.9, 1_900.0, &t), Some(Severity::Warning));
        assert_eq!(classify(10.1, 2_100.0, &t), None);
        // 距離は近いが高度差が大きい
        assert_eq!(classify(4.9, 1_500.0, &t), Some(Severity::Warning));
        assert_eq!(classify(4.9, 2_500.0, &t), None);
        assert_eq!(classify(5.0, 900.0, &t), Some(Severity::Warning));
    }

    #[test]
    fn test_mission_pair_reported_from_both_sides() {
        // 緯度差 3/60 度 = 3 海里
        let samples = vec![
            sample("AC1", true, 0.0, 20_000.0),
            sample("AC2", true, 3.0 / 60.0, 20_500.0),
        ];
        let warnings = detect_conflicts(&samples, &ProximityThresholds::default(), 0.0);

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].flight_id, "AC1");
        assert_eq!(warnings[0].other_flight_id, "AC2");
        assert_eq!(warnings[1].flight_id, "AC2");
        assert!(warnings.iter().all(|w| w.severity == Severity::Critical));
        assert!((warnings[0].distance_nm - 3.0).abs() < 0.01);
        assert_eq!(warnings[0].altitude_diff_ft, 500.0);
    }

    #[test]
    fn test_ambient_only_checked_from_mission_side() {
        let samples = vec![
            sample("AC1", true, 0.0, 20_000.0),
            sample("JAL1", false, 8.0 / 60.0, 21_000.0),
            sample("ANA2", false, 8.0 / 60.0, 21_000.0),
        ];
        let warnings = detect_conflicts(&samples, &ProximityThresholds::default(), 0.0);

        // 周辺機同士のペアは判定しない
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.flight_id == "AC1"));
        assert!(warnings.iter().all(|w| w.severity == Severity::Warning));
    }

    #[test]
    fn test_no_self_pair() {
        let samples = vec![sample("AC1", true, 0.0, 20_000.0)];
        assert!(detect_conflicts(&samples, &ProximityThresholds::default(), 0.0).is_empty());
    }
}
