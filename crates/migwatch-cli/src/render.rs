use crate::events::{self, Event};
use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use migwatch_core::capacity::format_bytes;
use migwatch_core::{MigrationView, PhaseCategory, ProgressEstimate, Style, VmView, WatchConfig};
use std::io::{self, IsTerminal, Write};

/// Whether output carries ANSI colour. Decided once at startup and passed
/// to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn detect() -> Self {
        Self::new(io::stdout().is_terminal())
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(self) -> bool {
        self.enabled
    }

    fn paint(self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(self, text: &str) -> String {
        if self.enabled {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

fn phase_color(category: PhaseCategory) -> Color {
    match category {
        PhaseCategory::Succeeded => Color::Green,
        PhaseCategory::Failed => Color::Red,
        PhaseCategory::Running => Color::Yellow,
        PhaseCategory::Unrecognized => Color::Magenta,
    }
}

fn phase_icon(category: PhaseCategory) -> &'static str {
    match category {
        PhaseCategory::Succeeded => "✅",
        PhaseCategory::Failed => "❌",
        PhaseCategory::Running => "⏳",
        PhaseCategory::Unrecognized => "•",
    }
}

/// Coarse age of an RFC3339 timestamp: seconds, minutes or hours.
pub fn age(timestamp: &str, now: DateTime<Utc>) -> String {
    let Ok(created) = DateTime::parse_from_rfc3339(timestamp) else {
        return "?".to_string();
    };
    let seconds = (now - created.with_timezone(&Utc)).num_seconds().max(0);
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}h", seconds / 3600)
    }
}

fn pad(text: &str, width: usize) -> String {
    let visible = text.chars().count();
    if visible >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - visible))
    }
}

/// `name:status` of the first stage that reports a status.
fn current_stage(vm: &VmView<'_>) -> String {
    vm.pipeline
        .iter()
        .find_map(|stage| {
            let status = stage.status.as_deref().filter(|s| !s.is_empty())?;
            Some(format!("{}:{}", stage.name.as_deref().unwrap_or("stage"), status))
        })
        .unwrap_or_default()
}

pub struct Renderer<'c> {
    config: &'c WatchConfig,
    palette: Palette,
    now: DateTime<Utc>,
    width: usize,
}

impl<'c> Renderer<'c> {
    pub fn new(config: &'c WatchConfig, palette: Palette, now: DateTime<Utc>, width: usize) -> Self {
        Self {
            config,
            palette,
            now,
            width: width.max(1),
        }
    }

    fn visible<'v, 'a>(&self, view: &'v MigrationView<'a>) -> Vec<&'v VmView<'a>> {
        view.vms
            .iter()
            .filter(|vm| self.config.show_completed || !vm.is_completed())
            .filter(|vm| !self.config.errors_only || vm.has_failure())
            .collect()
    }

    pub fn render(&self, out: &mut dyn Write, views: &[MigrationView<'_>]) -> io::Result<()> {
        if views.is_empty() {
            return writeln!(out, "{}", self.palette.dim("(no migrations found)"));
        }
        match self.config.style {
            Style::Pretty => self.pretty(out, views),
            Style::Table => self.table(out, views),
        }
    }

    fn pretty(&self, out: &mut dyn Write, views: &[MigrationView<'_>]) -> io::Result<()> {
        let p = self.palette;
        for view in views {
            let mode = if view.warm { "warm" } else { "cold" };
            let target = if view.target_namespace.is_empty() {
                "?"
            } else {
                view.target_namespace
            };
            let header = format!(
                "{}  ({})  age:{}  mode:{}  target:{}",
                view.plan,
                view.name(),
                age(view.creation_timestamp(), self.now),
                mode,
                target
            );
            writeln!(out, "{}", p.bold(&header))?;
            writeln!(out, "{}", "=".repeat(self.width))?;

            let conditions: Vec<String> =
                view.conditions().iter().filter_map(|c| c.summary()).collect();
            if !conditions.is_empty() {
                writeln!(out, "{}", p.dim(&format!("   conditions: {}", conditions.join(", "))))?;
            }
            writeln!(out)?;

            for vm in self.visible(view) {
                self.pretty_vm(out, vm)?;
            }
        }
        Ok(())
    }

    fn pretty_vm(&self, out: &mut dyn Write, vm: &VmView<'_>) -> io::Result<()> {
        let p = self.palette;
        let category = vm.phase_category();
        let color = phase_color(category);

        let mut line = format!(
            "  {} {}  phase={}",
            p.paint(&format!("{} {}", phase_icon(category), vm.phase), color),
            vm.name,
            p.paint(vm.phase, color)
        );
        if let Some(error) = vm.error {
            line.push_str(&format!("  {}", p.paint(&format!("error={}", error), Color::Red)));
        }
        writeln!(out, "{}", line)?;

        if vm.pipeline.is_empty() {
            writeln!(out, "{}", p.dim("    ↳ (no pipeline reported)"))?;
        }
        for stage in vm.pipeline {
            let mut segment = format!(
                "    ↳ {}: {}",
                stage.name.as_deref().unwrap_or("stage"),
                stage.status.as_deref().unwrap_or("unknown")
            );
            if let Some(started) = stage.started.as_deref().filter(|s| !s.is_empty()) {
                segment.push_str(&format!("  start={}", started));
            }
            if let Some(ended) = stage.ended.as_deref().filter(|s| !s.is_empty()) {
                segment.push_str(&format!("  end={}", ended));
            }
            if let Some((copied, total)) = stage.progress.as_ref().and_then(|pr| pr.usable()) {
                segment.push_str(&format!(
                    "  progress={}/{}",
                    format_bytes(copied as f64),
                    format_bytes(total as f64)
                ));
            }
            writeln!(out, "{}", p.dim(&segment))?;
        }

        let progress = match vm.progress {
            ProgressEstimate::Unavailable => "    progress: n/a".to_string(),
            estimate => match estimate.source() {
                Some(source) => format!("    progress ({}): {}", source, estimate),
                None => format!("    progress: {}", estimate),
            },
        };
        writeln!(out, "{}", p.paint(&progress, Color::Cyan))?;

        for hook in vm.hooks() {
            let name = hook
                .name
                .as_deref()
                .or(hook.hook_type.as_deref())
                .unwrap_or("hook");
            let mut text = format!(
                "    hook {}: {}",
                name,
                hook.status.as_deref().unwrap_or("unknown")
            );
            if let Some(message) = hook.message.as_deref().filter(|m| !m.is_empty()) {
                text.push_str(&format!("  {}", message));
            }
            writeln!(out, "{}", p.paint(&text, Color::Cyan))?;
        }

        let conditions: Vec<String> = vm.conditions().iter().filter_map(|c| c.summary()).collect();
        if !conditions.is_empty() {
            writeln!(out, "{}", p.dim(&format!("    conditions: {}", conditions.join(", "))))?;
        }
        writeln!(out)
    }

    fn table(&self, out: &mut dyn Write, views: &[MigrationView<'_>]) -> io::Result<()> {
        const HEADERS: [&str; 8] = [
            "PLAN", "MIGRATION", "AGE", "VM", "PHASE", "STAGE", "PROGRESS", "ERROR",
        ];
        const PHASE_COLUMN: usize = 4;

        let mut rows: Vec<([String; 8], Color)> = Vec::new();
        for view in views {
            let age = age(view.creation_timestamp(), self.now);
            for vm in self.visible(view) {
                let progress = if vm.progress.is_available() {
                    vm.progress.to_string()
                } else {
                    String::new()
                };
                rows.push((
                    [
                        view.plan.to_string(),
                        view.name().to_string(),
                        age.clone(),
                        vm.name.to_string(),
                        vm.phase.to_string(),
                        current_stage(vm),
                        progress,
                        vm.error.unwrap_or_default().to_string(),
                    ],
                    phase_color(vm.phase_category()),
                ));
            }
        }

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
        for (cells, _) in &rows {
            for (width, cell) in widths.iter_mut().zip(cells.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let header: Vec<String> = HEADERS
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w))
            .collect();
        writeln!(out, "{}", header.join("  "))?;

        for (cells, color) in &rows {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(column, (cell, width))| {
                    let padded = pad(cell, *width);
                    if column == PHASE_COLUMN {
                        self.palette.paint(&padded, *color)
                    } else {
                        padded
                    }
                })
                .collect();
            writeln!(out, "{}", line.join("  "))?;
        }
        Ok(())
    }

    pub fn events(&self, out: &mut dyn Write, events: &[Event]) -> io::Result<()> {
        if events.is_empty() {
            return writeln!(out, "(no recent events)");
        }
        let limit = self.config.event_limit;
        writeln!(
            out,
            "{}",
            self.palette.bold(&format!(
                "Recent Events (last ~{}) in {}",
                limit, self.config.namespace
            ))
        )?;
        writeln!(
            out,
            "{:<6}  {:<8}  {:<20}  {:<40}  MESSAGE",
            "AGE", "TYPE", "REASON", "OBJECT"
        )?;
        for event in events::recent(events, limit) {
            let age = event
                .timestamp()
                .map(|ts| age(ts, self.now))
                .unwrap_or_else(|| "?".to_string());
            writeln!(
                out,
                "{:<6}  {:<8}  {:<20}  {:<40}  {}",
                age,
                event.event_type,
                event.reason,
                event.object(),
                event.message
            )?;
        }
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migwatch_core::{build_dashboard, DashboardOptions, ResourceCollection};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-02-01T02:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn snapshot() -> (ResourceCollection, ResourceCollection) {
        let resources = serde_json::from_value(json!({"items": [
            {"kind": "Plan", "metadata": {"name": "wave"}, "spec": {"targetNamespace": "prod", "warm": true}},
            {
                "kind": "Migration",
                "metadata": {"name": "wave-1", "creationTimestamp": "2025-02-01T00:00:00Z"},
                "spec": {"plan": {"name": "wave"}},
                "status": {
                    "conditions": [{"type": "Executing", "status": "True"}],
                    "vms": [
                        {"name": "web01", "phase": "CopyDisks", "pipeline": [
                            {"name": "DiskTransfer", "status": "Running",
                             "progress": {"totalBytes": 2000000, "copiedBytes": 1000000}}
                        ]},
                        {"name": "db01", "phase": "Completed"},
                        {"name": "app01", "phase": "Failed", "error": {"message": "boom"},
                         "hooks": [{"type": "PreHook", "status": "Failed", "message": "exit 1"}]}
                    ]
                }
            }
        ]}))
        .unwrap();
        let transfers = serde_json::from_value(json!({"items": [
            {"kind": "DataVolume",
             "metadata": {"name": "d", "namespace": "prod", "labels": {"vmName": "web01"}},
             "spec": {"storage": {"resources": {"requests": {"storage": "10GB"}}}},
             "status": {"progress": "25%"}}
        ]}))
        .unwrap();
        (resources, transfers)
    }

    fn render(config: &WatchConfig) -> String {
        let (resources, transfers) = snapshot();
        let views = build_dashboard(&resources, &transfers, &DashboardOptions::from(config));
        let mut out = Vec::new();
        Renderer::new(config, Palette::plain(), now(), 20)
            .render(&mut out, &views)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_age() {
        assert_eq!(age("2025-02-01T01:59:30Z", now()), "30s");
        assert_eq!(age("2025-02-01T01:30:00Z", now()), "30m");
        assert_eq!(age("2025-01-31T00:00:00Z", now()), "26h");
        assert_eq!(age("2025-02-01T04:00:00+02:00", now()), "0s");
        assert_eq!(age("yesterday", now()), "?");
    }

    #[test]
    fn test_pretty_hides_completed_by_default() {
        let output = render(&WatchConfig::default());
        assert!(output.contains("wave  (wave-1)  age:2h  mode:warm  target:prod"));
        assert!(output.contains("conditions: Executing=True"));
        assert!(output.contains("⏳ CopyDisks web01  phase=CopyDisks"));
        assert!(output.contains("↳ DiskTransfer: Running  progress=1.00MB/2.00MB"));
        assert!(output.contains("progress (storage): 25% 2.50GB/10.0GB"));
        assert!(output.contains("error=boom"));
        assert!(output.contains("hook PreHook: Failed  exit 1"));
        assert!(!output.contains("db01"));
    }

    #[test]
    fn test_pretty_errors_only_and_completed() {
        let config = WatchConfig {
            errors_only: true,
            show_completed: true,
            ..WatchConfig::default()
        };
        let output = render(&config);
        assert!(output.contains("app01"));
        assert!(!output.contains("web01"));
        assert!(!output.contains("db01"));
    }

    #[test]
    fn test_errors_only_keeps_completed_with_errors() {
        let resources: ResourceCollection = serde_json::from_value(json!({"items": [
            {
                "kind": "Migration",
                "metadata": {"name": "wave-2", "creationTimestamp": "2025-02-01T00:00:00Z"},
                "spec": {"plan": {"name": "wave"}, "targetNamespace": "prod"},
                "status": {"vms": [
                    {"name": "mail01", "phase": "CompletedWithErrors"},
                    {"name": "dns01", "phase": "CopyDisks"}
                ]}
            }
        ]}))
        .unwrap();
        let config = WatchConfig {
            errors_only: true,
            ..WatchConfig::default()
        };
        let views = build_dashboard(
            &resources,
            &ResourceCollection::default(),
            &DashboardOptions::from(&config),
        );
        let mut out = Vec::new();
        Renderer::new(&config, Palette::plain(), now(), 20)
            .render(&mut out, &views)
            .unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("mail01"));
        assert!(!output.contains("dns01"));
    }

    #[test]
    fn test_table_columns_are_aligned() {
        let config = WatchConfig {
            style: Style::Table,
            show_completed: true,
            ..WatchConfig::default()
        };
        let output = render(&config);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("PLAN  MIGRATION  AGE  VM   "));

        let vm_column = lines[0].find("VM").unwrap();
        let phase_column = lines[0].find("PHASE").unwrap();
        for line in &lines[1..] {
            assert_eq!(&line[phase_column - 2..phase_column], "  ");
            assert_ne!(&line[vm_column..vm_column + 1], " ");
        }
        assert!(lines[1].contains("DiskTransfer:Running"));
        assert!(lines[1].contains("25% 2.50GB/10.0GB"));
        assert!(lines[3].contains("boom"));
    }

    #[test]
    fn test_events_section() {
        let config = WatchConfig::default();
        let renderer = Renderer::new(&config, Palette::plain(), now(), 80);

        let mut empty = Vec::new();
        renderer.events(&mut empty, &[]).unwrap();
        assert_eq!(String::from_utf8(empty).unwrap(), "(no recent events)\n");

        let list: events::EventList = serde_json::from_value(json!({"items": [{
            "type": "Warning", "reason": "Failed", "message": "disk copy failed",
            "lastTimestamp": "2025-02-01T01:55:00Z",
            "involvedObject": {"kind": "Migration", "name": "wave-1"}
        }]}))
        .unwrap();
        let mut out = Vec::new();
        renderer.events(&mut out, &list.items).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Recent Events (last ~50) in openshift-mtv"));
        assert!(output.contains("5m      Warning   Failed"));
        assert!(output.contains("Migration/wave-1"));
    }
}
