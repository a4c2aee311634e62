//! Terminal rendering for every console view.
//!
//! Renderers return strings so `main` decides where they go and tests can
//! inspect them.

use colored::{ColoredString, Colorize};
use std::fmt::Write;
use tc_core::{
    CaseDetailView, CaseListView, CoreResult, Decision, EntityGraph, EntityKind,
    ExperimentComparison, ExperimentSummary, GraphSurface, LayoutOptions, MetricComparison,
    Overview, SeriesPoint,
};

const RULE: &str = "─────────────────────────";
const BAR_WIDTH: usize = 24;

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title.bold());
    let _ = writeln!(out, "{}", RULE);
}

/// Horizontal bar of `width` cells with `filled` of them solid.
pub fn bar(filled: usize, width: usize) -> String {
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn severity_colored(severity: u8) -> ColoredString {
    let text = format!("{:>3}", severity);
    match severity {
        80..=u8::MAX => text.red().bold(),
        50..=79 => text.yellow(),
        _ => text.green(),
    }
}

fn decision_colored(decision: &str) -> ColoredString {
    match decision.parse::<Decision>() {
        Ok(Decision::Escalate) => decision.red().bold(),
        Ok(Decision::CreateTicket) => decision.yellow(),
        Ok(Decision::AutoClose) => decision.green(),
        _ => decision.dimmed(),
    }
}

fn kind_colored(kind: EntityKind, text: &str) -> ColoredString {
    match kind {
        EntityKind::User => text.magenta(),
        EntityKind::Host => text.green(),
        EntityKind::Ip => text.cyan(),
        EntityKind::Domain => text.yellow(),
        EntityKind::Unknown => text.dimmed(),
    }
}

/// Stat cards and the cases-over-time series.
pub fn overview(overview: &Overview) -> String {
    let mut out = String::new();
    let s = &overview.stats;
    heading(&mut out, "Overview (24h)");

    let cards = [
        ("Cases (24h)", s.cases),
        ("Tickets", s.tickets),
        ("Auto-Closed", s.auto_closed),
        ("Escalations", s.escalations),
        ("Ingested", s.ingested),
        ("Deduped", s.deduped),
        ("Errors", s.errors),
    ];
    for (title, value) in cards {
        let _ = writeln!(out, "  {:<12} {}", title, value.to_string().bold());
    }

    out.push('\n');
    heading(&mut out, "Cases Over Time");
    out.push_str(&series(&overview.series));
    out
}

/// One line per hour bucket, bars scaled to the busiest hour.
pub fn series(points: &[SeriesPoint]) -> String {
    if points.is_empty() {
        return format!("  {}\n", "No cases in the last 24 hours".dimmed());
    }
    let max = points.iter().map(|p| p.v).max().unwrap_or(1).max(1);
    let mut out = String::new();
    for point in points {
        let filled = ((point.v as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "  {}  {} {}",
            point.t,
            bar(filled.max(1), BAR_WIDTH).cyan(),
            point.v
        );
    }
    out
}

/// The case table.
pub fn case_table(view: &CaseListView) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Cases ({})", view.count()));

    if let Some(error) = &view.error {
        let _ = writeln!(out, "{} {}", "Error:".red().bold(), error);
    }
    if view.rows.is_empty() {
        let _ = writeln!(out, "No cases found");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<38} {:<26} {:>3}  {:<14} {:<10} SUMMARY",
        "CASE", "CREATED", "SEV", "DECISION", "QUEUE"
    );
    for row in &view.rows {
        let decision = format!("{:<14}", row.decision.as_str());
        let _ = writeln!(
            out,
            "{:<38} {:<26} {}  {} {:<10} {}",
            row.case_id,
            row.created_at,
            severity_colored(row.severity),
            decision_colored(&decision),
            row.queue,
            row.summary
        );
    }
    out
}

/// The full case detail view, with the graph drawn by `surface`.
pub fn case_detail<S>(view: &CaseDetailView, surface: &S) -> CoreResult<String>
where
    S: GraphSurface<Handle = TextGraph>,
{
    let mut out = String::new();
    let case = &view.case;

    heading(&mut out, &format!("Case {}", case.case_id));
    let _ = writeln!(out, "  Decision:   {}", decision_colored(view.decision_label()));
    let _ = writeln!(out, "  Severity:   {}", severity_colored(case.severity));
    let _ = writeln!(out, "  Queue:      {}", case.queue);
    let _ = writeln!(out, "  Created:    {}", case.created_at);
    if !case.summary.is_empty() {
        let _ = writeln!(out, "  Summary:    {}", case.summary);
    }
    if let Some(ticket) = &view.ticket {
        let _ = writeln!(out, "  Ticket:     {}", ticket);
    }

    out.push('\n');
    heading(&mut out, "Scoring");
    let _ = writeln!(out, "  Confidence: {}", view.scoring.confidence_display());
    for row in &view.scoring.contributions {
        let _ = writeln!(
            out,
            "  {:>7}  {:<32} {}",
            row.points_display(),
            row.name,
            row.reason.dimmed()
        );
    }

    out.push('\n');
    heading(&mut out, "Entity Graph");
    let handle = surface.mount(&view.graph, &LayoutOptions::default())?;
    out.push_str(handle.text());
    drop(handle);

    if !view.routing.is_empty() {
        out.push('\n');
        heading(&mut out, "Routing");
        for (key, value) in &view.routing {
            let _ = writeln!(out, "  {}: {}", key, value);
        }
    }

    out.push('\n');
    heading(&mut out, "Recommended Actions");
    if view.recommended_actions.is_empty() {
        let _ = writeln!(out, "  {}", "None".dimmed());
    }
    for action in &view.recommended_actions {
        match action.playbook_action() {
            Some(name) => {
                let _ = writeln!(out, "  • {} {}", action.title, format!("(playbook {})", name).dimmed());
            }
            None => {
                let _ = writeln!(out, "  • {}", action.title);
            }
        }
    }

    out.push('\n');
    heading(&mut out, "Timeline");
    if view.timeline.is_empty() {
        let _ = writeln!(out, "  {}", "No events".dimmed());
    }
    for event in &view.timeline {
        let _ = writeln!(out, "  {}  {}", event.created_at, event.stage.bold());
    }

    out.push('\n');
    heading(&mut out, "Enrichments");
    let _ = writeln!(out, "{}", view.enrichments_pretty());

    Ok(out)
}

/// The experiment list.
pub fn experiments(items: &[ExperimentSummary]) -> String {
    let mut out = String::new();
    heading(&mut out, "Experiments");
    if items.is_empty() {
        let _ = writeln!(out, "No experiments yet. Run `triage-console replay` to start one.");
        return out;
    }
    for item in items {
        let _ = writeln!(
            out,
            "  {} · {}  {}",
            item.short_id().bold(),
            item.created_at,
            format!("[{} → {}]", item.since, item.until).dimmed()
        );
    }
    out
}

/// Before/after reduction bars for one experiment.
pub fn comparison(comparison: &ExperimentComparison) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("Experiment {} Before / After", comparison.experiment_id),
    );
    let _ = writeln!(
        out,
        "  Cases: {} → {}",
        comparison.total_cases_before, comparison.total_cases_after
    );
    out.push_str(&reduction_line("Ticket Reduction %", &comparison.tickets, false));
    out.push_str(&reduction_line(
        "Auto-close Rate %",
        &comparison.auto_close_rate,
        true,
    ));
    out
}

fn reduction_line(title: &str, metric: &MetricComparison, percent: bool) -> String {
    let fmt = |v: f64| {
        if percent {
            format!("{:.1}%", v)
        } else {
            format!("{}", v)
        }
    };
    let filled = (metric.reduction_pct as usize * BAR_WIDTH) / 100;
    format!(
        "  {:<20} {} {:>3}%  {}\n",
        title,
        bar(filled, BAR_WIDTH).green(),
        metric.reduction_pct,
        format!("({} → {})", fmt(metric.before), fmt(metric.after)).dimmed()
    )
}

/// Text rendering of a mounted graph.
#[derive(Debug)]
pub struct TextGraph {
    text: String,
}

impl TextGraph {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Graph surface that prints an adjacency listing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextGraphSurface;

impl GraphSurface for TextGraphSurface {
    type Handle = TextGraph;

    fn mount(&self, graph: &EntityGraph, _layout: &LayoutOptions) -> CoreResult<TextGraph> {
        let mut text = String::new();
        if graph.is_empty() {
            let _ = writeln!(text, "  {}", "No entities".dimmed());
            return Ok(TextGraph { text });
        }

        for node in &graph.nodes {
            let _ = writeln!(
                text,
                "  {} {}",
                kind_colored(node.kind, "●"),
                kind_colored(node.kind, &node.id)
            );
            for edge in graph.outgoing(&node.id) {
                let target = if edge.dangling {
                    format!("{} {}", edge.to, "(not in graph)".dimmed())
                } else {
                    edge.to.clone()
                };
                let _ = writeln!(text, "      ─{}→ {}", edge.label, target);
            }
        }

        let orphans: Vec<_> = graph
            .dangling_edges()
            .filter(|e| graph.node(&e.from).is_none())
            .collect();
        for edge in orphans {
            let _ = writeln!(
                text,
                "  {} {} ─{}→ {}",
                "?".dimmed(),
                edge.from,
                edge.label,
                edge.to
            );
        }
        if graph.merged_duplicates > 0 {
            let _ = writeln!(
                text,
                "  {}",
                format!("({} duplicate entities merged)", graph.merged_duplicates).dimmed()
            );
        }
        Ok(TextGraph { text })
    }
}
