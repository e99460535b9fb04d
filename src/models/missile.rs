use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::common::{FlightState, GeoPoint, geodesy, math_utils};

/// ミサイル速度（kt、飛翔中一定）
pub const MISSILE_SPEED_KT: f64 = 2000.0;
/// 最大発射距離（海里）
pub const MAX_LAUNCH_RANGE_NM: f64 = 30.0;
/// 最小発射距離（海里、これ以下の近距離射撃は行わない）
pub const MIN_LAUNCH_RANGE_NM: f64 = 2.0;
/// 命中判定距離（海里）
pub const HIT_RADIUS_NM: f64 = 0.5;
/// 比例航法定数
pub const NAVIGATION_CONSTANT: f64 = 4.0;
/// 航跡の最大保持点数
pub const TRAIL_LENGTH: usize = 20;
/// 終末誘導に切り替わる距離（海里）
pub const TERMINAL_RANGE_NM: f64 = 5.0;
/// 失探判定を行う距離（海里）
pub const MISS_CHECK_RANGE_NM: f64 = 2.0;

/// ミサイル誘導パラメータ
///
/// シナリオの `parameters.guidance` で個別に上書きできます。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceParameters {
    pub missile_speed_kt: f64,
    pub max_launch_range_nm: f64,
    pub min_launch_range_nm: f64,
    pub hit_radius_nm: f64,
    pub navigation_constant: f64,
    pub trail_length: usize,
    pub terminal_range_nm: f64,
    pub miss_check_range_nm: f64,
}

impl Default for GuidanceParameters {
    fn default() -> Self {
        Self {
            missile_speed_kt: MISSILE_SPEED_KT,
            max_launch_range_nm: MAX_LAUNCH_RANGE_NM,
            min_launch_range_nm: MIN_LAUNCH_RANGE_NM,
            hit_radius_nm: HIT_RADIUS_NM,
            navigation_constant: NAVIGATION_CONSTANT,
            trail_length: TRAIL_LENGTH,
            terminal_range_nm: TERMINAL_RANGE_NM,
            miss_check_range_nm: MISS_CHECK_RANGE_NM,
        }
    }
}

impl GuidanceParameters {
    /// 発射可能距離内か（min < range <= max）
    pub fn in_launch_envelope(&self, range_nm: f64) -> bool {
        range_nm > self.min_launch_range_nm && range_nm <= self.max_launch_range_nm
    }

    /// 発射ポリシー
    ///
    /// 射程内で、ターゲットが未破壊、かつ同じターゲットに飛翔中のミサイルが無い場合のみ発射します。
    pub fn should_launch(&self, range_nm: f64, target_destroyed: bool, target_engaged: bool) -> bool {
        self.in_launch_envelope(range_nm) && !target_destroyed && !target_engaged
    }
}

/// 誘導モード（ターゲットまでの距離から導出）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceMode {
    /// 中間誘導
    Midcourse,
    /// 終末誘導
    Terminal,
}

/// ミサイル状態（Hit / Miss は終端状態）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissileStatus {
    Flying,
    Hit,
    Miss,
}

/// 空対地ミサイル
///
/// 発射機の現在位置から発射され、比例航法で静止ターゲットへ誘導されます。
/// 速度は一定で、誘導は方位のみを変化させます。
#[derive(Debug, Clone, Serialize)]
pub struct Missile {
    pub id: String,
    pub launcher_id: String,
    pub target_id: String,
    pub position: GeoPoint,
    pub altitude_ft: f64,
    pub heading_deg: f64,
    pub speed_kt: f64,
    pub launch_time_min: f64,
    pub status: MissileStatus,
    /// 直近の位置履歴（古いものから破棄）
    pub trail: VecDeque<GeoPoint>,
    pub guidance_mode: GuidanceMode,
    /// 前回のLOS角（度）、角速度計算用
    pub previous_los_angle: Option<f64>,
    /// 直近に計算したターゲットまでの距離（海里）
    pub range_to_target_nm: f64,

    /// 飛翔時間（分）
    pub flight_time_min: f64,
    /// 累積飛行距離（海里）
    pub total_distance_nm: f64,

    #[serde(skip)]
    params: GuidanceParameters,
}

impl Missile {
    /// 発射機の現在状態からミサイルを発射します
    ///
    /// # 引数
    ///
    /// * `id` - ミサイルの一意識別子
    /// * `launcher_id` - 発射機（ミッション機）のID
    /// * `target_id` - ターゲットのID
    /// * `launcher_state` - 発射時点の発射機の位置・高度・方位
    /// * `target_position` - ターゲット位置（初期距離の記録用）
    /// * `launch_time_min` - 発射時刻（分）
    /// * `params` - 誘導パラメータ
    pub fn launch(
        id: String,
        launcher_id: String,
        target_id: String,
        launcher_state: &FlightState,
        target_position: &GeoPoint,
        launch_time_min: f64,
        params: GuidanceParameters,
    ) -> Self {
        let range = geodesy::distance_nm(&launcher_state.position, target_position);

        let missile = Self {
            id,
            launcher_id,
            target_id,
            position: launcher_state.position,
            altitude_ft: launcher_state.altitude_ft,
            heading_deg: launcher_state.heading_deg,
            speed_kt: params.missile_speed_kt,
            launch_time_min,
            status: MissileStatus::Flying,
            trail: VecDeque::with_capacity(params.trail_length),
            guidance_mode: GuidanceMode::Midcourse,
            previous_los_angle: None,
            range_to_target_nm: range,
            flight_time_min: 0.0,
            total_distance_nm: 0.0,
            params,
        };

        info!(
            missile_id = %missile.id,
            launcher_id = %missile.launcher_id,
            target_id = %missile.target_id,
            launch_lat = missile.position.lat,
            launch_lon = missile.position.lon,
            launch_altitude_ft = missile.altitude_ft,
            launch_heading_deg = missile.heading_deg,
            range_nm = range,
            launch_time_min,
            "MISSILE_LAUNCHED: ミサイルが発射されました"
        );

        missile
    }

    pub fn is_flying(&self) -> bool {
        self.status == MissileStatus::Flying
    }

    /// 比例航法による運動状態の更新
    ///
    /// 1. LOS角の計算 → 2. LOS角速度 → 3. 指令旋回率 = N × LOS角速度 →
    /// 4. 方位更新 → 5. 等距円筒近似での前進 → 6. 航跡追加 →
    /// 7. 誘導モード更新 → 8. 命中/失探判定
    ///
    /// # 引数
    ///
    /// * `target_position` - ターゲットの現在位置
    /// * `dt_min` - 前回更新からの経過シミュレーション時間（分）
    ///
    /// # 戻り値
    ///
    /// 更新後のミサイル状態
    pub fn update_kinematics(&mut self, target_position: &GeoPoint, dt_min: f64) -> MissileStatus {
        if self.status != MissileStatus::Flying || dt_min <= 0.0 {
            return self.status;
        }

        let previous_position = self.position;
        let previous_range = geodesy::distance_nm(&previous_position, target_position);

        // 1-2. LOS角と角速度
        let los_angle = geodesy::bearing_deg(&previous_position, target_position);
        let los_rate = match self.previous_los_angle {
            Some(previous) => math_utils::angle_difference(previous, los_angle) / dt_min,
            None => 0.0,
        };
        self.previous_los_angle = Some(los_angle);

        // 3-4. 指令旋回率と方位
        let commanded_turn_rate = self.params.navigation_constant * los_rate;
        self.heading_deg = math_utils::normalize_heading(self.heading_deg + commanded_turn_rate * dt_min);

        // 5. 前進
        let distance = self.speed_kt * (dt_min / 60.0);
        self.position = geodesy::displace(&previous_position, self.heading_deg, distance);

        // 6. 航跡
        self.trail.push_back(previous_position);
        while self.trail.len() > self.params.trail_length {
            self.trail.pop_front();
        }

        self.flight_time_min += dt_min;
        self.total_distance_nm += distance;

        // 7. 誘導モード
        let range = geodesy::distance_nm(&self.position, target_position);
        self.range_to_target_nm = range;
        self.update_guidance_mode(range);

        // 8. 命中/失探
        if range < self.params.hit_radius_nm {
            self.status = MissileStatus::Hit;

            info!(
                missile_id = %self.id,
                launcher_id = %self.launcher_id,
                target_id = %self.target_id,
                hit_lat = self.position.lat,
                hit_lon = self.position.lon,
                intercept_distance_nm = range,
                flight_time_min = self.flight_time_min,
                total_distance_nm = self.total_distance_nm,
                "MISSILE_HIT: ミサイルがターゲットに命中しました"
            );
        } else if range > previous_range && previous_range < self.params.miss_check_range_nm {
            self.status = MissileStatus::Miss;

            warn!(
                missile_id = %self.id,
                launcher_id = %self.launcher_id,
                target_id = %self.target_id,
                miss_lat = self.position.lat,
                miss_lon = self.position.lon,
                previous_range_nm = previous_range,
                range_nm = range,
                flight_time_min = self.flight_time_min,
                "MISSILE_MISS: ミサイルがターゲットを通過しました"
            );
        }

        self.status
    }

    fn update_guidance_mode(&mut self, range_nm: f64) {
        let next_mode = if range_nm < self.params.terminal_range_nm {
            GuidanceMode::Terminal
        } else {
            GuidanceMode::Midcourse
        };

        if next_mode != self.guidance_mode {
            debug!(
                missile_id = %self.id,
                target_id = %self.target_id,
                previous_mode = ?self.guidance_mode,
                current_mode = ?next_mode,
                range_nm,
                flight_time_min = self.flight_time_min,
                "MISSILE_PHASE_TRANSITION: ミサイル誘導モードが切り替わりました"
            );
            self.guidance_mode = next_mode;
        }
    }
}
