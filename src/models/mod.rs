// 基本的なデータ型と測地・数学ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 各ドメインモデルの実装
pub mod path;
pub mod target;
pub mod aircraft;
pub mod missile;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use path::{FlightPath, TimedWaypoint, interpolate};
pub use target::{AttackTarget, TargetPriority, find_target};
pub use aircraft::{
    AmbientTraffic, ExternalRoute, FlightKinematics, FlightStatus, MissionAircraft, SimulatedFlight,
    StaticKinematics,
};
pub use missile::{GuidanceMode, GuidanceParameters, Missile, MissileStatus};
