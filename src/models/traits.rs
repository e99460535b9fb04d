use crate::models::common::FlightState;

/// 時刻を与えると瞬間状態を返せるエージェント
pub trait ITrackable {
    /// 指定時刻（分）の位置・高度・方位
    fn state_at(&self, time_min: f64) -> FlightState;
}
