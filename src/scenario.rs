//! # Scenario モジュール
//!
//! YAML形式のミッションシナリオを読み込み、検証します。
//!
//! シナリオは基地位置、攻撃目標、ミッション機、周辺機と、
//! 誘導・経路合成・接近判定・交戦の各パラメータ（省略時は既定値）で構成されます。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engagement::EngagementParameters;
use crate::models::{AmbientTraffic, AttackTarget, ExternalRoute, GeoPoint, GuidanceParameters, MissionAircraft};
use crate::planning::SynthesisParameters;
use crate::proximity::ProximityThresholds;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 実時間のティック周期（秒）
    pub tick_period_s: f64,
    /// 再生速度倍率
    pub speed_multiplier: f64,
    /// シミュレーション終了時刻（分）、省略時は最遅ETA + 5分
    pub duration_min: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period_s: 0.1,
            speed_multiplier: 10.0,
            duration_min: None,
        }
    }
}

impl SimulationConfig {
    /// 1ティックで進むシミュレーション時間（分）
    pub fn step_minutes(&self) -> f64 {
        self.tick_period_s * self.speed_multiplier / 60.0
    }
}

/// 各サブシステムのパラメータ
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioParameters {
    pub guidance: GuidanceParameters,
    pub synthesis: SynthesisParameters,
    pub proximity: ProximityThresholds,
    pub engagement: EngagementParameters,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    #[serde(default)]
    pub sim: SimulationConfig,
    pub base: GeoPoint,
    #[serde(default)]
    pub parameters: ScenarioParameters,
    pub targets: Vec<AttackTarget>,
    #[serde(default)]
    pub aircraft: Vec<MissionAircraft>,
    #[serde(default)]
    pub ambient_traffic: Vec<AmbientTraffic>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents).map_err(|source| ScenarioError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents).map_err(|source| ScenarioError::ParseError {
            path: PathBuf::from("<inline>"),
            source,
        })?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.sim.tick_period_s.is_finite() && self.sim.tick_period_s > 0.0) {
            return Err(ScenarioError::ValidationError("tick_period_s must be positive".to_string()));
        }
        if !(self.sim.speed_multiplier.is_finite() && self.sim.speed_multiplier > 0.0) {
            return Err(ScenarioError::ValidationError("speed_multiplier must be positive".to_string()));
        }
        if let Some(duration) = self.sim.duration_min {
            if !(duration.is_finite() && duration > 0.0) {
                return Err(ScenarioError::ValidationError("duration_min must be positive".to_string()));
            }
        }
        let speeds = [self.parameters.synthesis.speed_kt, self.parameters.guidance.missile_speed_kt];
        if speeds.iter().any(|speed| !(speed.is_finite() && *speed > 0.0)) {
            return Err(ScenarioError::ValidationError("speeds must be positive".to_string()));
        }

        if self.targets.is_empty() {
            return Err(ScenarioError::ValidationError("at least one target is required".to_string()));
        }

        check_position("base", &self.base)?;

        let mut target_ids = HashSet::new();
        for target in &self.targets {
            if !target_ids.insert(target.id.as_str()) {
                return Err(ScenarioError::ValidationError(format!("duplicate target id {}", target.id)));
            }
            check_position(&target.id, &target.position)?;
        }

        let mut flight_ids = HashSet::new();
        for aircraft in &self.aircraft {
            if !flight_ids.insert(aircraft.id.as_str()) {
                return Err(ScenarioError::ValidationError(format!("duplicate flight id {}", aircraft.id)));
            }
            match &aircraft.route {
                Some(ExternalRoute::Detailed { waypoints }) => {
                    for waypoint in waypoints.waypoints() {
                        check_position(&aircraft.id, &waypoint.position)?;
                    }
                }
                Some(ExternalRoute::Centerline { points }) => {
                    for point in points {
                        check_position(&aircraft.id, point)?;
                    }
                }
                None => {}
            }
        }

        for traffic in &self.ambient_traffic {
            if !flight_ids.insert(traffic.flight_id.as_str()) {
                return Err(ScenarioError::ValidationError(format!(
                    "duplicate flight id {}",
                    traffic.flight_id
                )));
            }
            check_position(&traffic.flight_id, &traffic.position)?;
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("ティック周期: {:.3}秒", self.sim.tick_period_s);
        println!("再生速度: {:.1}倍 (1ティック {:.3}分)", self.sim.speed_multiplier, self.sim.step_minutes());
        match self.sim.duration_min {
            Some(duration) => println!("終了時刻: {:.1}分", duration),
            None => println!("終了時刻: 最遅ETA + 5分"),
        }
        println!("基地: ({:.4}, {:.4})", self.base.lat, self.base.lon);
        println!();

        println!("=== 攻撃目標 ===");
        let total_ammo: u32 = self.targets.iter().map(AttackTarget::ammo_required).sum();
        println!("目標数: {} (必要弾薬 {}発)", self.targets.len(), total_ammo);
        for target in &self.targets {
            println!(
                "  {}: {} [{}] ({:.4}, {:.4})",
                target.id,
                target.name,
                target.priority.as_str(),
                target.position.lat,
                target.position.lon
            );
        }
        println!();

        println!("=== ミッション機 ===");
        let capacity: u32 = self.aircraft.iter().map(|a| a.ammo_capacity).sum();
        println!("機数: {} (総搭載 {}発)", self.aircraft.len(), capacity);
        for aircraft in &self.aircraft {
            let route = match &aircraft.route {
                Some(ExternalRoute::Detailed { .. }) => "詳細経路",
                Some(ExternalRoute::Centerline { .. }) => "中心線",
                None => "直行経路",
            };
            println!("  {} ({}): 搭載 {}発, {}", aircraft.id, aircraft.callsign, aircraft.ammo_capacity, route);
        }
        println!();

        println!("周辺機: {}機", self.ambient_traffic.len());
    }
}

fn check_position(owner: &str, point: &GeoPoint) -> Result<(), ScenarioError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(ScenarioError::ValidationError(format!(
            "{} has invalid coordinates ({}, {})",
            owner, point.lat, point.lon
        )))
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML解析エラー {}: {source}", .path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("設定検証エラー: {0}")]
    ValidationError(String),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::TargetPriority;

    pub(crate) const STRIKE_YAML: &str = r#"
meta:
  version: "1.0"
  name: test strike
base: { lat: 35.0, lon: 139.0 }
targets:
  - { id: T1, name: Radar, position: { lat: 35.3, lon: 139.0 }, priority: high }
  - { id: T2, name: Depot, position: { lat: 35.3, lon: 139.3 }, priority: medium }
aircraft:
  - { id: A, callsign: VIPER11, ammo_capacity: 4 }
  - { id: B, callsign: COLT21, ammo_capacity: 2 }
ambient_traffic:
  - flight_id: JAL123
    callsign: JAL123
    position: { lat: 35.1, lon: 139.1 }
    altitude_ft: 33000
    heading_deg: 270
    speed_kt: 450
"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();

        assert_eq!(config.meta.name, "test strike");
        assert_eq!(config.sim.tick_period_s, 0.1);
        assert_eq!(config.sim.speed_multiplier, 10.0);
        assert!(config.sim.duration_min.is_none());
        assert_eq!(config.parameters, ScenarioParameters::default());
        assert_eq!(config.targets[0].priority, TargetPriority::High);
        assert_eq!(config.aircraft.len(), 2);
        assert_eq!(config.ambient_traffic[0].color, "#888888");
        assert!((config.sim.step_minutes() - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_parameter_overrides() {
        let yaml = format!(
            "{STRIKE_YAML}\nparameters:\n  guidance: {{ max_launch_range_nm: 20.0 }}\n  proximity: {{ critical_distance_nm: 3.0 }}\n"
        );
        let config = ScenarioConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.parameters.guidance.max_launch_range_nm, 20.0);
        assert_eq!(config.parameters.guidance.hit_radius_nm, 0.5);
        assert_eq!(config.parameters.proximity.critical_distance_nm, 3.0);
        assert_eq!(config.parameters.proximity.warning_distance_nm, 10.0);
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let mut config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        config.targets[1].id = "T1".to_string();
        assert!(matches!(config.validate(), Err(ScenarioError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let mut config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        config.ambient_traffic[0].position = GeoPoint::new(95.0, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_tick_rejected() {
        let mut config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        config.sim.speed_multiplier = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_monotonic_detailed_route_is_parse_error() {
        let yaml = r#"
meta: { version: "1.0", name: bad }
base: { lat: 35.0, lon: 139.0 }
targets:
  - { id: T1, name: Radar, position: { lat: 35.3, lon: 139.0 }, priority: low }
aircraft:
  - id: A
    callsign: VIPER11
    ammo_capacity: 1
    route:
      kind: detailed
      waypoints:
        - { position: { lat: 35.0, lon: 139.0 }, altitude_ft: 0, time_offset_min: 10 }
        - { position: { lat: 35.3, lon: 139.0 }, altitude_ft: 20000, time_offset_min: 5 }
"#;
        let result = ScenarioConfig::from_yaml_str(yaml);
        assert!(matches!(result, Err(ScenarioError::ParseError { .. })));
    }

    #[test]
    fn test_non_finite_speed_rejected() {
        let yaml = format!("{STRIKE_YAML}\nparameters:\n  synthesis: {{ speed_kt: .nan }}\n");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&yaml),
            Err(ScenarioError::ValidationError(_))
        ));

        let mut config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        config.parameters.guidance.missile_speed_kt = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_time_offset_in_detailed_route_is_parse_error() {
        let yaml = r#"
meta: { version: "1.0", name: bad }
base: { lat: 35.0, lon: 139.0 }
targets:
  - { id: T1, name: Radar, position: { lat: 35.3, lon: 139.0 }, priority: low }
aircraft:
  - id: A
    callsign: VIPER11
    ammo_capacity: 1
    route:
      kind: detailed
      waypoints:
        - { position: { lat: 35.0, lon: 139.0 }, altitude_ft: 0, time_offset_min: 0 }
        - { position: { lat: 35.1, lon: 139.0 }, altitude_ft: 9000, time_offset_min: .nan }
        - { position: { lat: 35.3, lon: 139.0 }, altitude_ft: 20000, time_offset_min: 5 }
"#;
        assert!(matches!(
            ScenarioConfig::from_yaml_str(yaml),
            Err(ScenarioError::ParseError { .. })
        ));
    }

    #[test]
    fn test_bundled_scenarios_load() {
        let strike = ScenarioConfig::from_file("scenarios/strike_package.yaml").unwrap();
        assert_eq!(strike.targets.len(), 3);
        assert_eq!(strike.base.alt_ft, Some(0.0));

        let external = ScenarioConfig::from_file("scenarios/external_routes.yaml").unwrap();
        assert_eq!(external.sim.duration_min, Some(60.0));
        assert_eq!(external.parameters.guidance.max_launch_range_nm, 25.0);
        assert!(matches!(external.aircraft[0].route, Some(ExternalRoute::Detailed { .. })));
        assert!(matches!(external.aircraft[1].route, Some(ExternalRoute::Centerline { .. })));
        assert_eq!(external.ambient_traffic.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = ScenarioConfig::from_file("scenarios/does_not_exist.yaml");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }
}
