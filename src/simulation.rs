//! # Simulation モジュール
//!
//! ミッション再生の中核となるシミュレーションエンジンと再生制御を提供します。
//!
//! エンジンは唯一のシミュレーション時刻と、それに付随する状態（飛行体位置、
//! ミサイル、破壊状態、接近警告）を保持し、ティック単位の遷移で更新します。
//! 1ティックの処理は不可分で、途中で他のティックが始まることはありません。
//!
//! ## ティック処理順序
//!
//! 1. **時刻前進**: `current_time += Δt`
//! 2. **位置更新**: 全飛行体の位置を経路補間で再計算
//! 3. **ミサイル処理**: 飛翔中ミサイルの誘導・命中/失探判定、命中目標の破壊
//! 4. **発射判定**: ミッション機 × 未破壊の割り当て目標ごとに発射ポリシーを評価
//!    （同じティックで先に発射されたミサイルも「飛翔中」として扱う）
//! 5. **近接撃破**: 割り当て目標に接近したミッション機による破壊
//! 6. **飛行状態**: 表示用の飛行状態を導出
//! 7. **接近検出**: ミッション機と他機の接近警告を再計算
//!
//! ## 時刻の直接設定（シーク）
//!
//! シークは位置・飛行状態・接近警告のみを再計算します。
//! 状態は前進方向にのみ蓄積されるため、過去へシークしても破壊済みの目標や
//! 発射済みのミサイルは元に戻りません。

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::engagement::{DestructionTracker, MissionEvent, MissionStatus};
use crate::error::MissionError;
use crate::models::{
    AttackTarget, FlightState, FlightStatus, GeoPoint, ITrackable, Missile, MissileStatus, SimulatedFlight,
    find_target, geodesy,
};
use crate::planning::{AssignmentPlan, plan_assignments, synthesize_flights};
use crate::proximity::{ProximityWarning, TrafficSample, detect_conflicts};
use crate::scenario::{ScenarioConfig, ScenarioParameters, SimulationConfig};

/// 最遅ETAから終了時刻までの余裕（分）
pub const END_TIME_MARGIN_MIN: f64 = 5.0;

/// 発射記録
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchRecord {
    pub time_min: f64,
    pub missile_id: String,
    pub aircraft_id: String,
    pub target_id: String,
    pub launch_position: GeoPoint,
}

/// 飛行体の表示用スナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSnapshot {
    pub flight_id: String,
    pub callsign: String,
    pub state: FlightState,
    pub status: FlightStatus,
    pub eta_min: Option<f64>,
    pub color: String,
    pub is_mission_aircraft: bool,
}

/// シミュレーション状態のスナップショット
///
/// 表示側はこれを読むだけで、エンジンの状態を変更しません。
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSnapshot {
    pub time_min: f64,
    pub step_count: u64,
    pub flights: Vec<FlightSnapshot>,
    pub missiles: Vec<Missile>,
    pub destroyed_target_ids: Vec<String>,
    pub events: Vec<MissionEvent>,
    pub warnings: Vec<ProximityWarning>,
    pub status: MissionStatus,
}

pub struct SimulationEngine {
    pub current_time_min: f64,
    pub end_time_min: f64,
    pub step_count: u64,

    pub(crate) flights: Vec<SimulatedFlight>,
    pub(crate) targets: Vec<AttackTarget>,
    pub(crate) missiles: Vec<Missile>,
    pub(crate) tracker: DestructionTracker,
    pub warnings: Vec<ProximityWarning>,
    pub launch_history: Vec<LaunchRecord>,
    pub assignment_plan: Option<AssignmentPlan>,

    /// `flights` と同じ並びの現在状態
    flight_states: Vec<FlightState>,
    /// 機体ID → 発射数（ミサイルID生成用）
    missile_counters: BTreeMap<String, u32>,
    /// 報告済みの（機体ID, 目標ID）不整合
    reported_missing: BTreeSet<(String, String)>,
    params: ScenarioParameters,
}

impl SimulationEngine {
    /// 合成済みの飛行体からエンジンを作成
    ///
    /// 終了時刻は最遅ETA + 5分です。
    pub fn new(targets: Vec<AttackTarget>, flights: Vec<SimulatedFlight>, params: ScenarioParameters) -> Self {
        let latest_eta = flights.iter().filter_map(|f| f.eta_min).fold(0.0, f64::max);
        let tracker = DestructionTracker::new(targets.len());

        let mut engine = Self {
            current_time_min: 0.0,
            end_time_min: latest_eta + END_TIME_MARGIN_MIN,
            step_count: 0,
            flights,
            targets,
            missiles: Vec::new(),
            tracker,
            warnings: Vec::new(),
            launch_history: Vec::new(),
            assignment_plan: None,
            flight_states: Vec::new(),
            missile_counters: BTreeMap::new(),
            reported_missing: BTreeSet::new(),
            params,
        };
        engine.refresh_derived_state();
        engine
    }

    /// シナリオから割り当て・経路合成を行ってエンジンを作成
    ///
    /// 容量不足（`InsufficientCapacity`）と不正な経路（`InvalidPath`）はここで返します。
    pub fn from_scenario(config: &ScenarioConfig) -> Result<Self, MissionError> {
        let params = config.parameters;
        let mut aircraft = config.aircraft.clone();

        let plan = plan_assignments(&config.targets, &mut aircraft)?;
        let mut flights = synthesize_flights(&mut aircraft, &config.targets, &config.base, &params.synthesis)?;
        flights.extend(config.ambient_traffic.iter().map(SimulatedFlight::from_ambient));

        let mut engine = Self::new(config.targets.clone(), flights, params);
        if let Some(duration) = config.sim.duration_min {
            engine.end_time_min = duration;
        }
        engine.assignment_plan = Some(plan);

        info!(
            target_count = engine.targets.len(),
            flight_count = engine.flights.len(),
            end_time_min = engine.end_time_min,
            "SIMULATION_INITIALIZED: シミュレーションエンジンを初期化しました"
        );

        Ok(engine)
    }

    pub fn parameters(&self) -> &ScenarioParameters {
        &self.params
    }

    pub fn flights(&self) -> &[SimulatedFlight] {
        &self.flights
    }

    pub fn targets(&self) -> &[AttackTarget] {
        &self.targets
    }

    /// 発射済みの全ミサイル（終端状態のものを含む）
    pub fn missiles(&self) -> &[Missile] {
        &self.missiles
    }

    pub fn tracker(&self) -> &DestructionTracker {
        &self.tracker
    }

    /// `flights` と同じ並びの現在状態
    pub fn flight_states(&self) -> &[FlightState] {
        &self.flight_states
    }

    pub fn state_of(&self, flight_id: &str) -> Option<&FlightState> {
        self.flights
            .iter()
            .position(|f| f.flight_id == flight_id)
            .map(|index| &self.flight_states[index])
    }

    pub fn is_target_destroyed(&self, target_id: &str) -> bool {
        self.tracker.is_destroyed(target_id)
    }

    pub fn mission_status(&self) -> MissionStatus {
        self.tracker.status()
    }

    pub fn is_finished(&self) -> bool {
        self.current_time_min >= self.end_time_min
    }

    /// 1ティック進める
    ///
    /// # 引数
    ///
    /// * `dt_min` - このティックで進めるシミュレーション時間（分）。0以下なら何もしない
    pub fn step(&mut self, dt_min: f64) {
        self.step_to(self.current_time_min + dt_min);
    }

    /// 指定時刻まで1ティックで進める（現在時刻以前なら何もしない）
    pub fn step_to(&mut self, time_min: f64) {
        let dt_min = time_min - self.current_time_min;
        if dt_min <= 0.0 {
            return;
        }

        self.current_time_min = time_min;
        self.step_count += 1;

        self.update_flight_states();
        self.process_missiles(dt_min);
        self.process_launches();
        self.process_proximity_kills();
        self.update_flight_statuses();
        self.update_proximity_warnings();

        trace!(
            time_min = self.current_time_min,
            step = self.step_count,
            flying_missiles = self.missiles.iter().filter(|m| m.is_flying()).count(),
            "時刻: {:.3}分 (ステップ: {})",
            self.current_time_min,
            self.step_count
        );
    }

    /// 時刻を直接設定
    ///
    /// 位置・飛行状態・接近警告のみ再計算し、ミサイルと破壊状態には触れません。
    pub fn seek(&mut self, time_min: f64) {
        let previous = self.current_time_min;
        self.current_time_min = time_min;
        self.refresh_derived_state();

        info!(
            from_min = previous,
            to_min = time_min,
            "SIMULATION_SEEK: シミュレーション時刻を変更しました"
        );
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        let flights = self
            .flights
            .iter()
            .zip(&self.flight_states)
            .map(|(flight, state)| FlightSnapshot {
                flight_id: flight.flight_id.clone(),
                callsign: flight.callsign.clone(),
                state: *state,
                status: flight.status,
                eta_min: flight.eta_min,
                color: flight.color.clone(),
                is_mission_aircraft: flight.is_mission_aircraft,
            })
            .collect();

        SimulationSnapshot {
            time_min: self.current_time_min,
            step_count: self.step_count,
            flights,
            missiles: self.missiles.clone(),
            destroyed_target_ids: self.tracker.destroyed_target_ids().cloned().collect(),
            events: self.tracker.events().to_vec(),
            warnings: self.warnings.clone(),
            status: self.tracker.status(),
        }
    }

    fn refresh_derived_state(&mut self) {
        self.update_flight_states();
        self.update_flight_statuses();
        self.update_proximity_warnings();
    }

    fn update_flight_states(&mut self) {
        let time = self.current_time_min;
        self.flight_states = self.flights.iter().map(|f| f.state_at(time)).collect();
    }

    fn process_missiles(&mut self, dt_min: f64) {
        let time = self.current_time_min;

        for missile in self.missiles.iter_mut().filter(|m| m.is_flying()) {
            let Some(target) = find_target(&self.targets, &missile.target_id) else {
                report_missing(&mut self.reported_missing, &missile.launcher_id, &missile.target_id);
                continue;
            };

            match missile.update_kinematics(&target.position, dt_min) {
                MissileStatus::Hit => {
                    let callsign = callsign_of(&self.flights, &missile.launcher_id);
                    self.tracker.record_hit(time, missile, target, callsign);
                }
                MissileStatus::Miss => self.tracker.record_miss(),
                MissileStatus::Flying => {}
            }
        }
    }

    fn process_launches(&mut self) {
        let time = self.current_time_min;
        let guidance = self.params.guidance;

        for (flight, state) in self.flights.iter().zip(&self.flight_states) {
            if !flight.is_mission_aircraft {
                continue;
            }

            for target_id in &flight.assigned_target_ids {
                let Some(target) = find_target(&self.targets, target_id) else {
                    report_missing(&mut self.reported_missing, &flight.flight_id, target_id);
                    continue;
                };

                let destroyed = self.tracker.is_destroyed(target_id);
                let engaged = self.missiles.iter().any(|m| m.is_flying() && &m.target_id == target_id);
                let range = geodesy::distance_nm(&state.position, &target.position);

                if !guidance.should_launch(range, destroyed, engaged) {
                    continue;
                }

                let counter = self.missile_counters.entry(flight.flight_id.clone()).or_insert(0);
                *counter += 1;
                let missile_id = format!("{}_M{:03}", flight.flight_id, counter);

                let missile = Missile::launch(
                    missile_id.clone(),
                    flight.flight_id.clone(),
                    target_id.clone(),
                    state,
                    &target.position,
                    time,
                    guidance,
                );

                self.tracker.record_launch(time, &missile, target, &flight.callsign);
                self.launch_history.push(LaunchRecord {
                    time_min: time,
                    missile_id,
                    aircraft_id: flight.flight_id.clone(),
                    target_id: target_id.clone(),
                    launch_position: state.position,
                });
                self.missiles.push(missile);
            }
        }
    }

    fn process_proximity_kills(&mut self) {
        let time = self.current_time_min;
        let radius = self.params.engagement.proximity_kill_radius_nm;

        for (flight, state) in self.flights.iter().zip(&self.flight_states) {
            if !flight.is_mission_aircraft {
                continue;
            }

            for target_id in &flight.assigned_target_ids {
                if self.tracker.is_destroyed(target_id) {
                    continue;
                }
                let Some(target) = find_target(&self.targets, target_id) else {
                    continue;
                };

                if geodesy::distance_nm(&state.position, &target.position) <= radius {
                    self.tracker
                        .record_proximity_kill(time, target, &flight.flight_id, &flight.callsign);
                }
            }
        }
    }

    fn update_flight_statuses(&mut self) {
        let time = self.current_time_min;
        let max_range = self.params.guidance.max_launch_range_nm;

        for (flight, state) in self.flights.iter_mut().zip(&self.flight_states) {
            if !flight.is_mission_aircraft {
                continue;
            }

            let all_destroyed = !flight.assigned_target_ids.is_empty()
                && flight.assigned_target_ids.iter().all(|id| self.tracker.is_destroyed(id));
            let live_in_range = flight.assigned_target_ids.iter().any(|id| {
                !self.tracker.is_destroyed(id)
                    && find_target(&self.targets, id)
                        .is_some_and(|t| geodesy::distance_nm(&state.position, &t.position) <= max_range)
            });

            let status = FlightStatus::derive(time, flight.eta_min, all_destroyed, live_in_range);
            if status != flight.status {
                debug!(
                    flight_id = %flight.flight_id,
                    previous = ?flight.status,
                    current = ?status,
                    time_min = time,
                    "FLIGHT_STATUS_CHANGED: 飛行状態が変化しました"
                );
                flight.status = status;
            }
        }
    }

    fn update_proximity_warnings(&mut self) {
        let samples: Vec<TrafficSample<'_>> = self
            .flights
            .iter()
            .zip(&self.flight_states)
            .filter(|(flight, _)| flight.status != FlightStatus::Landed)
            .map(|(flight, state)| TrafficSample {
                flight_id: &flight.flight_id,
                callsign: &flight.callsign,
                is_mission_aircraft: flight.is_mission_aircraft,
                state: *state,
            })
            .collect();

        self.warnings = detect_conflicts(&samples, &self.params.proximity, self.current_time_min);
    }
}

fn callsign_of<'a>(flights: &'a [SimulatedFlight], flight_id: &'a str) -> &'a str {
    flights
        .iter()
        .find(|f| f.flight_id == flight_id)
        .map(|f| f.callsign.as_str())
        .unwrap_or(flight_id)
}

fn report_missing(reported: &mut BTreeSet<(String, String)>, aircraft_id: &str, target_id: &str) {
    if reported.insert((aircraft_id.to_string(), target_id.to_string())) {
        let error = MissionError::MissingTargetReference {
            aircraft_id: aircraft_id.to_string(),
            target_id: target_id.to_string(),
        };
        warn!(
            aircraft_id,
            target_id,
            error = %error,
            "TARGET_REFERENCE_SKIPPED: 目標一覧に無い割り当てをスキップしました"
        );
    }
}

/// 再生制御
///
/// 実時間のティックごとに `tick_period × 再生速度` だけシミュレーション時刻を進めます。
/// 誘導に渡すΔtはこのシミュレーション時間で、実時間の周期ではありません。
pub struct PlaybackController {
    pub engine: SimulationEngine,
    tick_period_s: f64,
    speed_multiplier: f64,
    playing: bool,
}

impl PlaybackController {
    pub fn new(engine: SimulationEngine, config: &SimulationConfig) -> Self {
        Self {
            engine,
            tick_period_s: config.tick_period_s,
            speed_multiplier: config.speed_multiplier,
            playing: false,
        }
    }

    pub fn play(&mut self) {
        if !self.playing {
            info!(time_min = self.engine.current_time_min, "PLAYBACK_STARTED: 再生を開始しました");
        }
        self.playing = true;
    }

    pub fn pause(&mut self) {
        if self.playing {
            info!(time_min = self.engine.current_time_min, "PLAYBACK_PAUSED: 再生を一時停止しました");
        }
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn set_speed(&mut self, multiplier: f64) {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            warn!(multiplier, "無効な再生速度です。変更しません");
            return;
        }
        debug!(previous = self.speed_multiplier, current = multiplier, "再生速度を変更しました");
        self.speed_multiplier = multiplier;
    }

    /// 1ティックで進むシミュレーション時間（分）
    pub fn tick_dt_min(&self) -> f64 {
        self.tick_period_s * self.speed_multiplier / 60.0
    }

    /// 時刻を直接設定（0〜終了時刻に制限）
    pub fn seek(&mut self, time_min: f64) {
        let clamped = time_min.clamp(0.0, self.engine.end_time_min);
        self.engine.seek(clamped);
    }

    /// 実時間ティック1回分の処理
    ///
    /// # 戻り値
    ///
    /// 時刻を進めた場合は true。停止中または終了時刻到達済みなら false
    pub fn on_tick(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        if self.engine.is_finished() {
            self.pause();
            return false;
        }

        let next = (self.engine.current_time_min + self.tick_dt_min()).min(self.engine.end_time_min);
        self.engine.step_to(next);

        if self.engine.is_finished() {
            info!(
                time_min = self.engine.current_time_min,
                "PLAYBACK_END_REACHED: 終了時刻に到達したため再生を停止します"
            );
            self.pause();
        }

        true
    }

    /// 終了時刻まで待ち時間なしで実行
    pub fn run_to_end(&mut self) -> MissionStatus {
        info!("=== シミュレーション実行開始 ===");
        self.play();

        while self.on_tick() {
            if self.engine.step_count % 100 == 0 {
                let progress = (self.engine.current_time_min / self.engine.end_time_min) * 100.0;
                info!(
                    "進行状況: {:.1}% ({:.1}/{:.1}分)",
                    progress, self.engine.current_time_min, self.engine.end_time_min
                );
            }
        }

        self.log_completion()
    }

    /// 実時間の周期でティックを発生させて実行
    pub async fn run_realtime(&mut self) -> MissionStatus {
        info!(
            tick_period_s = self.tick_period_s,
            speed_multiplier = self.speed_multiplier,
            "=== リアルタイム再生開始 ==="
        );

        let mut interval = tokio::time::interval(Duration::from_secs_f64(self.tick_period_s));
        self.play();

        loop {
            interval.tick().await;
            if !self.on_tick() {
                break;
            }
        }

        self.log_completion()
    }

    fn log_completion(&self) -> MissionStatus {
        let status = self.engine.mission_status();

        info!("=== シミュレーション完了 ===");
        info!("終了時刻: {:.1}分", self.engine.current_time_min);
        info!("総ステップ数: {}", self.engine.step_count);
        info!(
            destroyed = status.destroyed_targets,
            remaining = status.targets_remaining,
            missiles_launched = status.missiles_launched,
            missiles_hit = status.missiles_hit,
            missiles_missed = status.missiles_missed,
            "MISSION_SUMMARY: ミッション結果"
        );

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::MissionEventKind;
    use crate::scenario::tests::STRIKE_YAML;

    /// 100ms ティック・10倍速
    const DT: f64 = 1.0 / 60.0;

    fn engine() -> SimulationEngine {
        let config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        SimulationEngine::from_scenario(&config).unwrap()
    }

    fn flying_per_target(engine: &SimulationEngine) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for missile in engine.missiles().iter().filter(|m| m.is_flying()) {
            *counts.entry(missile.target_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_initialization_from_scenario() {
        let engine = engine();
        let plan = engine.assignment_plan.as_ref().unwrap();

        assert_eq!(plan.allocation_for("A").unwrap().target_ids, vec!["T1"]);
        assert_eq!(plan.allocation_for("B").unwrap().target_ids, vec!["T2"]);
        // ミッション機2 + 周辺機1
        assert_eq!(engine.flights().len(), 3);
        assert_eq!(engine.flight_states().len(), 3);
        // 直行経路のETAは 10 + 15 + 5 = 30分
        assert_eq!(engine.end_time_min, 35.0);
        assert_eq!(engine.current_time_min, 0.0);
        assert!(engine.missiles().is_empty());
    }

    #[test]
    fn test_first_tick_launches_one_missile_per_target() {
        let mut engine = engine();
        engine.step(DT);

        assert_eq!(engine.missiles().len(), 2);
        let ids: Vec<&str> = engine.launch_history.iter().map(|r| r.missile_id.as_str()).collect();
        assert_eq!(ids, vec!["A_M001", "B_M001"]);
        assert_eq!(engine.launch_history[0].target_id, "T1");
        assert_eq!(engine.launch_history[0].launch_position, GeoPoint::new(35.0, 139.0));

        let launches = engine
            .tracker()
            .events()
            .iter()
            .filter(|e| e.kind == MissionEventKind::Launch)
            .count();
        assert_eq!(launches, 2);

        let a = engine.flights().iter().find(|f| f.flight_id == "A").unwrap();
        assert_eq!(a.status, FlightStatus::Attacking);
    }

    #[test]
    fn test_missile_hits_target_straight_ahead() {
        let mut engine = engine();
        // T1 は基地の真北18海里。2000kt なら約0.54分で到達
        for _ in 0..60 {
            engine.step(DT);
        }

        assert!(engine.is_target_destroyed("T1"));
        let hit = engine
            .tracker()
            .events()
            .iter()
            .find(|e| e.kind == MissionEventKind::Hit && e.target_id == "T1")
            .unwrap();
        assert_eq!(hit.launching_callsign, "VIPER11");
        assert_eq!(engine.mission_status().destroyed_by_aircraft.get("A"), Some(&1));

        let a = engine.flights().iter().find(|f| f.flight_id == "A").unwrap();
        assert_eq!(a.status, FlightStatus::Rtb);
    }

    #[test]
    fn test_single_active_missile_per_target() {
        let mut engine = engine();
        while !engine.is_finished() {
            engine.step(DT);
            assert!(flying_per_target(&engine).values().all(|&count| count <= 1));
        }
    }

    #[test]
    fn test_destroyed_targets_are_monotonic() {
        let mut engine = engine();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        while !engine.is_finished() {
            engine.step(DT);
            let now: BTreeSet<String> = engine.tracker().destroyed_target_ids().cloned().collect();
            assert!(now.is_superset(&seen));
            seen = now;
        }

        // 直行経路は各目標の真上を通過するので、最終的に全目標が破壊される
        assert_eq!(seen.len(), 2);
        assert_eq!(engine.mission_status().targets_remaining, 0);
    }

    #[test]
    fn test_no_launch_after_destruction() {
        let mut engine = engine();
        while !engine.is_finished() {
            engine.step(DT);
        }
        for record in &engine.launch_history {
            let destroyed_at = engine
                .tracker()
                .events()
                .iter()
                .filter(|e| e.target_id == record.target_id && e.kind != MissionEventKind::Launch)
                .map(|e| e.time_min)
                .fold(f64::INFINITY, f64::min);
            assert!(record.time_min <= destroyed_at);
        }
    }

    #[test]
    fn test_proximity_kill_without_missiles() {
        let mut config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        // 発射可能距離が最小距離以下なので発射しない
        config.parameters.guidance.max_launch_range_nm = 1.0;
        let mut engine = SimulationEngine::from_scenario(&config).unwrap();

        while !engine.is_finished() {
            engine.step(DT);
        }

        assert!(engine.missiles().is_empty());
        assert!(engine.is_target_destroyed("T1"));
        assert!(engine.is_target_destroyed("T2"));
        assert!(
            engine
                .tracker()
                .events()
                .iter()
                .all(|e| e.kind == MissionEventKind::ProximityKill)
        );
        // T1 は経路上10分の地点
        let t1_kill = &engine.tracker().events()[0];
        assert_eq!(t1_kill.target_id, "T1");
        assert!(t1_kill.time_min > 9.0 && t1_kill.time_min <= 10.0 + DT);
    }

    #[test]
    fn test_backward_seek_does_not_undo_destruction() {
        let mut engine = engine();
        for _ in 0..60 {
            engine.step(DT);
        }
        assert!(engine.is_target_destroyed("T1"));
        let missile_count = engine.missiles().len();
        let events = engine.tracker().events().len();

        engine.seek(0.0);

        assert_eq!(engine.current_time_min, 0.0);
        // 位置は時刻に従うが、破壊状態とミサイルは前進方向にのみ蓄積される
        assert_eq!(engine.state_of("A").unwrap().position, GeoPoint::new(35.0, 139.0));
        assert!(engine.is_target_destroyed("T1"));
        assert_eq!(engine.missiles().len(), missile_count);
        assert_eq!(engine.tracker().events().len(), events);
    }

    #[test]
    fn test_ambient_traffic_is_static_and_warned() {
        let mut engine = engine();
        let before = *engine.state_of("JAL123").unwrap();
        engine.step(DT);
        engine.step(DT);
        assert_eq!(*engine.state_of("JAL123").unwrap(), before);

        // 基地上空付近の周辺機は高度差が大きいので警告なし、ミッション機同士は基地で重なる
        assert!(engine.warnings.iter().all(|w| w.other_flight_id != "JAL123"));
        assert!(
            engine
                .warnings
                .iter()
                .any(|w| w.flight_id == "A" && w.other_flight_id == "B")
        );
    }

    #[test]
    fn test_missing_target_reference_is_skipped() {
        let mut engine = engine();
        engine.flights[0].assigned_target_ids.push("GHOST".to_string());
        engine.step(DT);
        engine.step(DT);

        assert!(engine.missiles().iter().all(|m| m.target_id != "GHOST"));
        assert_eq!(engine.step_count, 2);
    }

    #[test]
    fn test_accessors_match_snapshot() {
        let mut engine = engine();
        engine.step(DT);
        let snapshot = engine.snapshot();

        assert_eq!(engine.targets().len(), 2);
        assert_eq!(engine.flights().len(), snapshot.flights.len());
        let ids = |missiles: &[Missile]| missiles.iter().map(|m| m.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(engine.missiles()), ids(&snapshot.missiles));
        assert_eq!(engine.tracker().events(), snapshot.events.as_slice());
        assert_eq!(engine.tracker().status(), snapshot.status);
    }

    #[test]
    fn test_insufficient_capacity_is_surfaced() {
        let mut config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        config.aircraft[0].ammo_capacity = 0;
        config.aircraft[1].ammo_capacity = 1;

        let result = SimulationEngine::from_scenario(&config);
        assert!(matches!(
            result,
            Err(MissionError::InsufficientCapacity {
                required: 3,
                available: 1
            })
        ));
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let run = || {
            let config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
            let engine = SimulationEngine::from_scenario(&config).unwrap();
            let mut playback = PlaybackController::new(engine, &config.sim);
            playback.run_to_end();
            serde_json::to_string(&playback.engine.snapshot()).unwrap()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_playback_speed_scales_tick() {
        let config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        let engine = SimulationEngine::from_scenario(&config).unwrap();
        let mut playback = PlaybackController::new(engine, &config.sim);

        // 停止中は進まない
        assert!(!playback.on_tick());
        assert_eq!(playback.engine.current_time_min, 0.0);

        playback.play();
        assert!(playback.on_tick());
        assert!((playback.engine.current_time_min - 1.0 / 60.0).abs() < 1e-12);

        playback.set_speed(60.0);
        assert!(playback.on_tick());
        assert!((playback.engine.current_time_min - (1.0 / 60.0 + 0.1)).abs() < 1e-12);

        playback.set_speed(-1.0);
        assert_eq!(playback.speed_multiplier(), 60.0);
    }

    #[test]
    fn test_playback_auto_pauses_at_end() {
        let mut config = ScenarioConfig::from_yaml_str(STRIKE_YAML).unwrap();
        config.sim.duration_min = Some(0.05);
        let engine = SimulationEngine::from_scenario(&config).unwrap();
        let mut playback = PlaybackController::new(engine, &config.sim);

        let status = playback.run_to_end();
        assert!(!playback.is_playing());
        assert_eq!(playback.engine.current_time_min, 0.05);
        assert_eq!(status.total_targets, 2);

        playback.seek(100.0);
        assert_eq!(playback.engine.current_time_min, 0.05);
    }
}
