use serde::{Deserialize, Serialize};

/// 地理座標点
///
/// 緯度・経度（度）と任意の高度（フィート）を持つ不変の値型です。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64, // deg
    pub lon: f64, // deg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_ft: Option<f64>, // ft
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            alt_ft: None,
        }
    }

    pub fn with_altitude(lat: f64, lon: f64, alt_ft: f64) -> Self {
        Self {
            lat,
            lon,
            alt_ft: Some(alt_ft),
        }
    }

    /// 他の地点までの大圏距離（海里）
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        geodesy::distance_nm(self, other)
    }

    /// 他の地点への初期方位（度、0〜360）
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        geodesy::bearing_deg(self, other)
    }

    /// 緯度・経度が有限値かつ有効範囲内かどうか
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
            && self.alt_ft.is_none_or(f64::is_finite)
    }
}

/// ある時刻における機体の瞬間状態
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    pub position: GeoPoint,
    pub altitude_ft: f64,
    pub heading_deg: f64,
}

impl FlightState {
    pub fn new(position: GeoPoint, altitude_ft: f64, heading_deg: f64) -> Self {
        Self {
            position,
            altitude_ft,
            heading_deg,
        }
    }
}

/// 測地計算ユーティリティ
///
/// 球体地球モデル（半径 3440.065 海里）上での距離・方位計算を提供します。
/// 入力は検証済みの数値座標であることが前提です（NaN は未定義動作）。
pub mod geodesy {
    use super::GeoPoint;

    /// 地球半径（海里）
    pub const EARTH_RADIUS_NM: f64 = 3440.065;

    /// 緯度1度あたりの海里数（等距円筒近似）
    pub const NM_PER_DEG_LAT: f64 = 60.0;

    /// Haversine 公式による大圏距離（海里）
    pub fn distance_nm(a: &GeoPoint, b: &GeoPoint) -> f64 {
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();
        let delta_lat = (b.lat - a.lat).to_radians();
        let delta_lon = (b.lon - a.lon).to_radians();

        let h = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().min(1.0).asin();

        EARTH_RADIUS_NM * c
    }

    /// `a` から `b` への初期方位（度、[0, 360)）
    pub fn bearing_deg(a: &GeoPoint, b: &GeoPoint) -> f64 {
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();
        let delta_lon = (b.lon - a.lon).to_radians();

        let x = delta_lon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

        super::math_utils::normalize_heading(x.atan2(y).to_degrees())
    }

    /// 等距円筒近似で指定方位へ距離だけ移動した地点を返す
    ///
    /// 1海里 ≈ 緯度1/60度、経度方向は `1/cos(緯度)` でスケーリングします。
    /// 高度は元の地点のものを引き継ぎます。
    pub fn displace(point: &GeoPoint, heading_deg: f64, distance_nm: f64) -> GeoPoint {
        let heading = heading_deg.to_radians();
        let d_lat = distance_nm * heading.cos() / NM_PER_DEG_LAT;
        let d_lon = distance_nm * heading.sin() / (NM_PER_DEG_LAT * point.lat.to_radians().cos());

        GeoPoint {
            lat: point.lat + d_lat,
            lon: point.lon + d_lon,
            alt_ft: point.alt_ft,
        }
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 角度を-180度〜180度の範囲に正規化
    pub fn normalize_angle(angle_deg: f64) -> f64 {
        let mut normalized = angle_deg % 360.0;
        if normalized > 180.0 {
            normalized -= 360.0;
        } else if normalized < -180.0 {
            normalized += 360.0;
        }
        normalized
    }

    /// 方位を0度〜360度未満の範囲に正規化
    pub fn normalize_heading(heading_deg: f64) -> f64 {
        let normalized = heading_deg.rem_euclid(360.0);
        // rem_euclid は -0.0 近傍で 360.0 を返しうる
        if normalized >= 360.0 { 0.0 } else { normalized }
    }

    /// 2つの角度の差を計算（-180度〜180度の範囲）
    pub fn angle_difference(angle1_deg: f64, angle2_deg: f64) -> f64 {
        normalize_angle(angle2_deg - angle1_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let expected = geodesy::EARTH_RADIUS_NM * 1.0_f64.to_radians();
        assert_abs_diff_eq!(a.distance_to(&b), expected, epsilon = 1e-9);
        assert_abs_diff_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert_abs_diff_eq!(origin.bearing_to(&GeoPoint::new(1.0, 0.0)), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(origin.bearing_to(&GeoPoint::new(0.0, 1.0)), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(origin.bearing_to(&GeoPoint::new(-1.0, 0.0)), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(origin.bearing_to(&GeoPoint::new(0.0, -1.0)), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bearing_is_in_range() {
        let a = GeoPoint::new(35.0, 139.0);
        let b = GeoPoint::new(34.0, 138.0);
        let bearing = a.bearing_to(&b);
        assert!((0.0..360.0).contains(&bearing));
        assert!(bearing > 180.0 && bearing < 270.0);
    }

    #[test]
    fn test_displace_north_and_east() {
        let origin = GeoPoint::new(0.0, 0.0);
        let north = geodesy::displace(&origin, 0.0, 60.0);
        assert_abs_diff_eq!(north.lat, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(north.lon, 0.0, epsilon = 1e-12);

        // 緯度60度では経度方向のスケールが2倍になる
        let high = GeoPoint::new(60.0, 10.0);
        let east = geodesy::displace(&high, 90.0, 30.0);
        assert_abs_diff_eq!(east.lat, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(east.lon, 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angle_normalization() {
        assert_abs_diff_eq!(math_utils::normalize_angle(190.0), -170.0);
        assert_abs_diff_eq!(math_utils::normalize_angle(-190.0), 170.0);
        assert_abs_diff_eq!(math_utils::angle_difference(350.0, 10.0), 20.0);
        assert_abs_diff_eq!(math_utils::angle_difference(10.0, 350.0), -20.0);
        assert_abs_diff_eq!(math_utils::normalize_heading(-90.0), 270.0);
        assert_abs_diff_eq!(math_utils::normalize_heading(725.0), 5.0);
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(35.0, 139.0).is_valid());
        assert!(!GeoPoint::new(95.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::with_altitude(0.0, 0.0, f64::INFINITY).is_valid());
    }
}
