//! Colored terminal rendering for pass reports and plans.

use calsync_core::error::Target;
use calsync_core::reconcile::{Change, ChangeKind, Failure, PassReport, Plan};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            ChangeKind::Create => symbol.green().to_string(),
            ChangeKind::Update => symbol.yellow().to_string(),
            ChangeKind::Delete => symbol.red().to_string(),
            ChangeKind::Retire => symbol.dimmed().to_string(),
        }
    }
}

fn colorize(kind: ChangeKind, text: &str) -> String {
    match kind {
        ChangeKind::Create => text.green().to_string(),
        ChangeKind::Update => text.yellow().to_string(),
        ChangeKind::Delete => text.red().to_string(),
        ChangeKind::Retire => text.dimmed().to_string(),
    }
}

impl Render for Change {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            self.kind.render(),
            colorize(self.kind, &self.title),
            format!("({})", self.event_id).dimmed()
        )
    }
}

impl Render for Failure {
    fn render(&self) -> String {
        let step = self
            .step
            .map(|s| format!("failed to {}: ", s))
            .unwrap_or_default();
        format!(
            "{} {} {}{}",
            "!".red(),
            self.title.red(),
            step.dimmed(),
            self.error
        )
    }
}

const TARGETS: [Target; 3] = [Target::Tasks, Target::Schedule, Target::Store];

/// Show counts instead of individual events above this many changes per target
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(count: usize) -> &'static str {
    if count == 1 { "event" } else { "events" }
}

fn render_changes(changes: &[Change], verbose: bool, lines: &mut Vec<String>) {
    for target in TARGETS {
        let for_target: Vec<_> = changes.iter().filter(|c| c.target == target).collect();
        if for_target.is_empty() {
            continue;
        }

        lines.push(format!("{}", target.to_string().bold()));
        if verbose || for_target.len() <= COMPACT_THRESHOLD {
            for change in for_target {
                lines.push(format!("   {}", change.render()));
            }
            continue;
        }

        for (kind, label) in [
            (ChangeKind::Create, "new"),
            (ChangeKind::Update, "changed"),
            (ChangeKind::Delete, "deleted"),
            (ChangeKind::Retire, "retired"),
        ] {
            let count = for_target.iter().filter(|c| c.kind == kind).count();
            if count > 0 {
                let text = format!("({} {} {})", count, label, pluralize(count));
                lines.push(format!("   {} {}", kind.render(), colorize(kind, &text)));
            }
        }
    }
}

pub trait ReportRender {
    fn render(&self, verbose: bool) -> String;
    fn render_summary(&self) -> String;
}

impl ReportRender for PassReport {
    fn render(&self, verbose: bool) -> String {
        if self.is_empty() {
            return "No changes".dimmed().to_string();
        }

        let mut lines = Vec::new();
        render_changes(&self.changes, verbose, &mut lines);

        if !self.failures.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("{}", "Failed".red().bold()));
            lines.extend(self.failures.iter().map(|f| format!("   {}", f.render())));
        }

        lines.join("\n")
    }

    fn render_summary(&self) -> String {
        let mut lines = Vec::new();
        for target in [Target::Tasks, Target::Schedule] {
            let (created, updated, deleted) = self.counts(target);
            if created + updated + deleted > 0 {
                lines.push(format!(
                    "{}: {} created, {} updated, {} deleted",
                    target, created, updated, deleted
                ));
            }
        }
        lines.join("\n")
    }
}

impl ReportRender for Plan {
    fn render(&self, verbose: bool) -> String {
        if self.is_empty() {
            return "Everything is in sync".dimmed().to_string();
        }

        let mut lines = Vec::new();
        if !self.additions.is_empty() {
            lines.push(format!("{}", "New events".bold()));
            for addition in &self.additions {
                lines.push(format!(
                    "   {} {} {}",
                    ChangeKind::Create.render(),
                    addition.event.title.green(),
                    format!("(from {})", addition.origin).dimmed()
                ));
            }
        }

        // Additions are listed above, only resolutions go by target
        let resolved = self.resolution_changes();
        if !resolved.is_empty() && !lines.is_empty() {
            lines.push(String::new());
        }
        render_changes(&resolved, verbose, &mut lines);

        lines.join("\n")
    }

    fn render_summary(&self) -> String {
        let changes = self.changes();
        format!(
            "{} pending {}",
            changes.len(),
            if changes.len() == 1 { "change" } else { "changes" }
        )
    }
}
