// 目標割り当て（貪欲法ビンパッキング）
pub mod assignment;

// 飛行経路合成
pub mod synthesis;

pub use assignment::{AircraftAllocation, AssignmentPlan, plan_assignments};
pub use synthesis::{SynthesisParameters, centerline_path, synthesize_flights, synthesize_path};
