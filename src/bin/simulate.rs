use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use treechop_server::constants::{
    PLAYER_RADIUS, ROUND_DURATION_MS, TICK_MS, WORLD_HEIGHT_PX, WORLD_WIDTH_PX,
};
use treechop_server::engine::{GameRoom, Room};
use treechop_server::rng::Rng;
use treechop_server::types::{JoinOptions, PlayerInput, Snapshot};

/// Runs seeded bot sessions against the room simulation and audits the
/// invariants of every tick.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 8)]
    bots: usize,
    #[arg(long, default_value_t = 3)]
    rounds: u64,
    #[arg(long, default_value_t = 1)]
    runs: u32,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    seed: u32,
    bots: usize,
    rounds: u64,
    ticks: u64,
    #[serde(rename = "treesChopped")]
    trees_chopped: u64,
    #[serde(rename = "treesGrown")]
    trees_grown: u64,
    #[serde(rename = "finalTrees")]
    final_trees: usize,
    #[serde(rename = "topScore")]
    top_score: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct RunOutcome {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTopScore")]
    average_top_score: f64,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let base_seed = cli.seed.unwrap_or_else(rand::random);
    let started_at_ms = now_ms();
    let mut results = Vec::new();
    let mut total_anomalies = 0usize;

    for run in 0..cli.runs.max(1) {
        let seed = base_seed.wrapping_add(run);
        emit_log(
            "info",
            "run_started",
            Some(seed),
            None,
            json!({ "bots": cli.bots, "rounds": cli.rounds }),
        );
        let outcome = run_session(seed, cli.bots, cli.rounds);

        for anomaly in &outcome.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                Some(seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        total_anomalies += outcome.anomaly_records.len();

        emit_log(
            "info",
            "run_finished",
            Some(seed),
            Some(outcome.result.ticks),
            json!({
                "treesChopped": outcome.result.trees_chopped,
                "treesGrown": outcome.result.trees_grown,
                "topScore": outcome.result.top_score,
                "anomalyCount": outcome.anomaly_records.len(),
            }),
        );
        match serde_json::to_string(&outcome.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                Some(seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        results.push(outcome.result);
    }

    let summary = build_run_summary(started_at_ms, now_ms(), results, total_anomalies);
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    emit_log(
        "info",
        "simulation_finished",
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageTopScore": summary.average_top_score,
        }),
    );

    if total_anomalies > 0 {
        std::process::exit(1);
    }
}

fn run_session(seed: u32, bots: usize, rounds: u64) -> RunOutcome {
    let mut room = GameRoom::with_start_time(seed, 0);
    let mut bot_rng = Rng::new(seed ^ 0x9e37_79b9);
    let ids: Vec<String> = (0..bots).map(|idx| format!("bot_{}", idx + 1)).collect();
    for (idx, id) in ids.iter().enumerate() {
        room.on_join(
            id,
            JoinOptions {
                name: Some(format!("Bot-{:02}", idx + 1)),
            },
        );
    }

    let max_ticks = (ROUND_DURATION_MS / TICK_MS + 1) * rounds.max(1);
    let mut anomalies = Vec::new();
    let mut trees_chopped = 0u64;
    let mut trees_grown = 0u64;
    let mut previous = room.snapshot();

    for _ in 0..max_ticks {
        for id in &ids {
            if bot_rng.chance(0.1) {
                room.on_input(id, random_input(&mut bot_rng));
            }
        }
        let event = room.on_tick(TICK_MS);
        let tick = room.tick_count();
        let snapshot = room.snapshot();

        let grown = event.map(|event| event.grown).unwrap_or(0);
        let chopped = count_chops(&previous, &snapshot);
        trees_chopped += chopped as u64;
        trees_grown += grown as u64;

        for message in collect_tick_anomalies(&previous, &snapshot, grown, chopped) {
            push_anomaly(&mut anomalies, tick, message);
        }
        previous = snapshot;

        if room.round_count() >= rounds {
            break;
        }
    }

    let anomaly_summary = summarize_anomalies(&anomalies);

    RunOutcome {
        result: RunResultLine {
            seed,
            bots,
            rounds: room.round_count(),
            ticks: room.tick_count(),
            trees_chopped,
            trees_grown,
            final_trees: room.world().tree_count(),
            top_score: previous
                .players
                .values()
                .map(|player| player.score)
                .max()
                .unwrap_or(0),
            anomalies: anomaly_summary,
        },
        anomaly_records: anomalies,
    }
}

fn random_input(rng: &mut Rng) -> PlayerInput {
    PlayerInput {
        up: rng.chance(0.3),
        down: rng.chance(0.3),
        left: rng.chance(0.3),
        right: rng.chance(0.3),
        chop: rng.chance(0.6),
    }
}

fn count_chops(before: &Snapshot, after: &Snapshot) -> usize {
    before
        .players
        .iter()
        .filter_map(|(id, player)| {
            after
                .players
                .get(id)
                .map(|next| next.score.saturating_sub(player.score) as usize)
        })
        .sum()
}

fn collect_tick_anomalies(
    before: &Snapshot,
    after: &Snapshot,
    grown: usize,
    chopped: usize,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    for (id, player) in &after.players {
        if player.x < PLAYER_RADIUS
            || player.x > WORLD_WIDTH_PX - PLAYER_RADIUS
            || player.y < PLAYER_RADIUS
            || player.y > WORLD_HEIGHT_PX - PLAYER_RADIUS
        {
            anomalies.push(format!("player {id} out of bounds"));
        }
        if let Some(prev) = before.players.get(id) {
            if player.score < prev.score {
                anomalies.push(format!("player {id} score decreased"));
            }
            if player.score > prev.score + 1 {
                anomalies.push(format!("player {id} chopped more than one tree in a tick"));
            }
        }
        if player.facing_x.abs() > 1 || player.facing_y.abs() > 1 {
            anomalies.push(format!("player {id} has invalid facing"));
        }
    }

    if after.trees.len() != before.trees.len() {
        anomalies.push("tree grid resized".to_string());
    }
    if after.trees.iter().any(|&tile| tile > 1) {
        anomalies.push("tree grid holds value outside 0/1".to_string());
    }

    let before_count = before.trees.iter().filter(|&&tile| tile == 1).count();
    let after_count = after.trees.iter().filter(|&&tile| tile == 1).count();
    if before_count + grown != after_count + chopped {
        anomalies.push("tree count does not match chops and regrowth".to_string());
    }
    if after.round_ends_at < after.server_now_ms {
        anomalies.push("round timer fell behind".to_string());
    }
    anomalies
}

fn push_anomaly(records: &mut Vec<AnomalyRecord>, tick: u64, message: String) {
    records.push(AnomalyRecord { tick, message });
}

fn summarize_anomalies(records: &[AnomalyRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.message.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn build_run_summary(
    started_at_ms: u64,
    finished_at_ms: u64,
    runs: Vec<RunResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let run_count = runs.len();
    let average_top_score = if run_count == 0 {
        0.0
    } else {
        runs.iter().map(|run| run.top_score as f64).sum::<f64>() / run_count as f64
    };
    RunSummary {
        started_at_ms,
        finished_at_ms,
        run_count,
        anomaly_count,
        average_top_score,
        runs,
    }
}

fn emit_log(level: &str, event: &str, seed: Option<u32>, tick: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => eprintln!("{{\"level\":\"error\",\"event\":\"log_serialize_failed\",\"error\":\"{error}\"}}"),
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
