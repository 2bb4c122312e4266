//! Shared record formatting helpers for CLI output.

use vectorscout_core::format::{format_duration_secs, format_relative_time};
use vectorscout_core::{ActionRecord, AutoPath, MatchScoutData, PitScoutData};

/// Qualitative detail as compact JSON, empty when absent.
pub fn detail_content(record: &ActionRecord) -> String {
    record
        .qualitative_data()
        .and_then(|data| data.to_json().ok())
        .unwrap_or_default()
}

/// One action row: phase, name, duration and detail.
pub fn action_line(record: &ActionRecord) -> String {
    format!(
        "{:<8} {:<14} {:>7}  {}",
        record.phase().as_str(),
        record.action_type().name(),
        format_duration_secs(record.duration_ms()),
        detail_content(record)
    )
    .trim_end()
    .to_string()
}

/// Steps of a path as compact tokens, e.g. `S:3 A:Load L:Neutral`.
pub fn path_steps(path: &AutoPath) -> String {
    path.steps
        .iter()
        .map(|step| format!("{}:{}", step.step_type.tag(), step.value))
        .collect::<Vec<_>>()
        .join(" ")
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Detail block for a match record.
pub fn match_detail(data: &MatchScoutData) -> Vec<String> {
    let mut lines = vec![
        format!("Event:       {}", data.event),
        format!("Match:       {}", data.match_number),
        format!("Robot:       {}", data.robot_designation),
        format!("Team:        {}", data.team_number),
        format!("Scout:       {}", data.scout_name),
        format!("Start:       {}", data.start_position),
        format!("Loaded:      {}", yes_no(data.loaded)),
        format!("No show:     {}", yes_no(data.no_show)),
        format!("Actions:     {}", data.action_records.len()),
    ];
    lines.extend(
        data.action_records
            .iter()
            .map(|record| format!("  {}", action_line(record))),
    );
    lines
}

/// Detail block for a pit record.
pub fn pit_detail(data: &PitScoutData) -> Vec<String> {
    let mut lines = vec![
        format!("Event:       {}", data.event),
        format!("Team:        {}", data.team_number),
        format!("Drivetrain:  {}", data.drivetrain_type),
        format!("Role:        {}", data.preferred_role),
        format!("Path:        {}", data.preferred_path),
        format!("Auto paths:  {}", data.auto_paths.len()),
    ];
    for path in &data.auto_paths {
        let mut line = format!("  {:<4} {}", path.name, path_steps(path));
        if let Some(drawing) = &path.drawing_path {
            line.push_str(&format!("  [{}]", drawing));
        }
        lines.push(line);
    }
    lines
}

/// One list row for a stored match record.
pub fn match_row(data: &MatchScoutData) -> String {
    format!(
        "{:>5}  {:<12} Q{:<4} {:<6} {:>6}  {:<12} {:>3} actions  {}{}",
        data.id.unwrap_or_default(),
        truncate(&data.event, 12),
        data.match_number,
        data.robot_designation,
        data.team_number,
        truncate(&data.scout_name, 12),
        data.action_records.len(),
        format_relative_time(data.created_at),
        if data.transfer_generated { "  (sent)" } else { "" }
    )
}

/// One list row for a stored pit record.
pub fn pit_row(data: &PitScoutData) -> String {
    format!(
        "{:>5}  {:<12} {:>6}  {:<8} {:<8} {:>2} paths  {}",
        data.id.unwrap_or_default(),
        truncate(&data.event, 12),
        data.team_number,
        truncate(&data.drivetrain_type, 8),
        truncate(&data.preferred_role, 8),
        data.auto_paths.len(),
        format_relative_time(data.created_at)
    )
}

fn truncate(input: &str, max_chars: usize) -> &str {
    if input.chars().count() <= max_chars {
        return input;
    }
    input
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| &input[..idx])
        .unwrap_or(input)
}
