use clap::{Arg, ArgAction, Command, value_parser};
use strikesim::logging::{LogConfig, LogOutput, init_logging, level_for_verbosity, parse_log_level};
use strikesim::planning::{AssignmentPlan, plan_assignments};
use strikesim::scenario::ScenarioConfig;
use strikesim::simulation::{PlaybackController, SimulationEngine};

fn main() {
    let matches = Command::new("strikesim")
        .version("0.1.0")
        .about("戦術ミッションシミュレーション (Strike Mission Simulation)")
        .long_about(
            "攻撃目標の割り当て・飛行経路の合成・ミサイル交戦の再生を行う\n\
             時間駆動型のミッション計画シミュレーションです。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定"),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオ情報と割り当て計画のみ表示して終了"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: デバッグ, -vv: トレース)"),
        )
        .arg(
            Arg::new("speed")
                .long("speed")
                .value_name("X")
                .value_parser(value_parser!(f64))
                .help("再生速度倍率 (シナリオの speed_multiplier を上書き)"),
        )
        .arg(
            Arg::new("realtime")
                .long("realtime")
                .action(ArgAction::SetTrue)
                .conflicts_with("info")
                .help("実時間のティック周期で再生"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)"),
        )
        .get_matches();

    println!("戦術ミッションシミュレーション - strikesim v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    let level = match matches.get_one::<String>("log-level") {
        Some(level) => parse_log_level(level),
        None => Ok(level_for_verbosity(verbose_level)),
    };
    let output = matches
        .get_one::<String>("log-output")
        .map(|s| s.parse::<LogOutput>())
        .unwrap_or(Ok(LogOutput::Console));

    let _guard = match (level, output) {
        (Ok(level), Ok(output)) => {
            let config = LogConfig {
                level,
                output,
                ..LogConfig::default()
            };
            match init_logging(config) {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("エラー: {}", e);
                    std::process::exit(1);
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        let options = RunOptions {
            info_only: matches.get_flag("info"),
            realtime: matches.get_flag("realtime"),
            speed: matches.get_one::<f64>("speed").copied(),
            verbose_level,
        };
        match run_scenario(scenario_path, &options) {
            Ok(()) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        show_default_help();
    }
}

struct RunOptions {
    info_only: bool,
    realtime: bool,
    speed: Option<f64>,
    verbose_level: u8,
}

/// シナリオファイルを読み込んで実行
fn run_scenario(scenario_path: &str, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut scenario = ScenarioConfig::from_file(scenario_path)?;
    if let Some(speed) = options.speed {
        scenario.sim.speed_multiplier = speed;
        scenario.validate()?;
    }

    if options.verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    if options.info_only {
        scenario.print_summary();
        println!();
        let mut aircraft = scenario.aircraft.clone();
        let plan = plan_assignments(&scenario.targets, &mut aircraft)?;
        print_plan(&plan);
        return Ok(());
    }

    execute_scenario(scenario, options)
}

/// シナリオの実行
fn execute_scenario(scenario: ScenarioConfig, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    let engine = SimulationEngine::from_scenario(&scenario)?;
    if let Some(plan) = &engine.assignment_plan {
        print_plan(plan);
        println!();
    }

    let mut playback = PlaybackController::new(engine, &scenario.sim);

    if options.realtime {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
        runtime.block_on(playback.run_realtime());
    } else {
        playback.run_to_end();
    }

    print_mission_summary(&playback.engine);

    Ok(())
}

fn print_plan(plan: &AssignmentPlan) {
    println!("=== 割り当て計画 ===");
    for allocation in &plan.allocations {
        let targets = if allocation.target_ids.is_empty() {
            "(なし)".to_string()
        } else {
            allocation.target_ids.join(", ")
        };
        println!(
            "  {} ({}): {}  残弾 {}/{}発",
            allocation.aircraft_id, allocation.callsign, targets, allocation.remaining_ammo, allocation.ammo_capacity
        );
    }
    if !plan.is_complete() {
        println!("  未割り当て: {}", plan.unassigned_target_ids.join(", "));
    }
}

fn print_mission_summary(engine: &SimulationEngine) {
    let status = engine.mission_status();

    println!("=== ミッション結果 ===");
    println!("終了時刻: {:.1}分 ({}ステップ)", engine.current_time_min, engine.step_count);
    println!(
        "目標: {}/{} 破壊 (残り {})",
        status.destroyed_targets, status.total_targets, status.targets_remaining
    );
    println!(
        "ミサイル: 発射 {}発, 命中 {}発, 失探 {}発",
        status.missiles_launched, status.missiles_hit, status.missiles_missed
    );
    for (aircraft_id, kills) in &status.destroyed_by_aircraft {
        println!("  {}: {}目標撃破", aircraft_id, kills);
    }

    println!();
    println!("=== イベントログ ===");
    for event in engine.tracker().events() {
        println!(
            "  {:>6.2}分 {:<14} {} ({}) by {}",
            event.time_min,
            format!("{:?}", event.kind),
            event.target_name,
            event.target_id,
            event.launching_callsign
        );
    }
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  strikesim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>     シナリオファイルを指定して実行");
    println!("  -i, --info                シナリオ情報と割り当て計画のみ表示");
    println!("  -v, --verbose             詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --speed <X>           再生速度倍率を上書き");
    println!("      --realtime            実時間のティック周期で再生");
    println!("      --log-level <LEVEL>   ログレベル");
    println!("      --log-output <OUTPUT> ログ出力先 (console, file, both)");
    println!("  -h, --help                このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/strike_package.yaml   - 直行経路の基本シナリオ");
    println!("  scenarios/external_routes.yaml  - 外部経路（詳細経路・中心線）と周辺機");
    println!();
    println!("例:");
    println!("  strikesim -s scenarios/strike_package.yaml");
    println!("  strikesim -s scenarios/strike_package.yaml -i");
    println!("  strikesim -s scenarios/external_routes.yaml --speed 60 -v");
    println!("  strikesim -s scenarios/strike_package.yaml --realtime --speed 30");
}
