//! # strikesim
//!
//! 戦術ミッション計画と交戦シミュレーションのエンジンです。
//!
//! 攻撃目標をミッション機へ割り当て、時刻付きの飛行経路を合成し、
//! 比例航法ミサイル・目標破壊・機体接近を決定論的な時間刻みで再生します。
//!
//! ```no_run
//! use strikesim::scenario::ScenarioConfig;
//! use strikesim::simulation::{PlaybackController, SimulationEngine};
//!
//! let config = ScenarioConfig::from_file("scenarios/strike_package.yaml")?;
//! let engine = SimulationEngine::from_scenario(&config)?;
//! let mut playback = PlaybackController::new(engine, &config.sim);
//! let status = playback.run_to_end();
//! println!("残目標: {}", status.targets_remaining);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engagement;
pub mod error;
pub mod logging;
pub mod models;
pub mod planning;
pub mod proximity;
pub mod scenario;
pub mod simulation;

pub use error::MissionError;
