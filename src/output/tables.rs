use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use super::accessories::{
    approvers_summary, comments_summary, merged_by_summary, pipeline_summary,
    pipeline_target_url, relative_age, Freshness,
};
use crate::providers::gitlab::types::{
    MergeRequest, MergeRequestState, Pipeline, PipelineStatus, Project,
};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn projects_table(projects: &[Project]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Project", "Name", "Default branch"]);
    for project in projects {
        table.add_row(vec![
            Cell::new(&project.full_path),
            Cell::new(&project.name),
            Cell::new(project.default_branch.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

pub fn merge_requests_table(
    mrs: &[MergeRequest],
    colorized_dates: bool,
    now: DateTime<Utc>,
) -> Table {
    let mut table = create_table();
    table.set_header(vec![
        "MR", "Title", "Flags", "Author", "Pipeline", "Comments", "Approvals", "Age",
    ]);

    for mr in mrs {
        table.add_row(vec![
            Cell::new(format!("{} !{}", mr.project.full_path, mr.iid)),
            title_cell(mr),
            Cell::new(flags(mr)),
            author_cell(mr),
            pipeline_cell(mr.head_pipeline.as_ref()),
            comments_cell(mr),
            approvals_cell(mr),
            age_cell(mr, colorized_dates, now),
        ]);
    }
    table
}

pub fn pipeline_table(pipeline: &Pipeline) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Branch", "Status", "Commit", "Summary", "Link"]);
    table.add_row(vec![
        Cell::new(pipeline.branch_name.as_deref().unwrap_or("-")),
        status_cell(&pipeline.status),
        Cell::new(pipeline.commit.as_ref().map_or("", |c| c.title.as_str())),
        Cell::new(pipeline_summary(pipeline).unwrap_or_default()),
        Cell::new(pipeline_target_url(pipeline).unwrap_or("-")),
    ]);
    table
}

fn title_cell(mr: &MergeRequest) -> Cell {
    match &mr.jira {
        Some(jira) => Cell::new(format!("{}\n{}", mr.title, jira.url)),
        None => Cell::new(&mr.title),
    }
}

fn flags(mr: &MergeRequest) -> String {
    let mut flags = Vec::new();
    if mr.has_updates {
        flags.push("updated");
    }
    if mr.has_conflicts {
        flags.push("conflicts");
    }
    if mr.draft {
        flags.push("draft");
    }
    flags.join(", ")
}

fn author_cell(mr: &MergeRequest) -> Cell {
    let text = match (&mr.author, merged_by_summary(mr)) {
        (Some(author), Some(merged_by)) => format!("{}\n{merged_by}", author.display_name),
        (Some(author), None) => author.display_name.clone(),
        (None, Some(merged_by)) => merged_by,
        (None, None) => "-".to_string(),
    };

    if mr.author.as_ref().is_some_and(|a| a.is_me) {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text)
    }
}

fn pipeline_cell(pipeline: Option<&Pipeline>) -> Cell {
    let Some(pipeline) = pipeline else {
        return Cell::new("-");
    };
    let text = pipeline_summary(pipeline).unwrap_or_else(|| pipeline.status.to_string());
    status_colored(Cell::new(text), &pipeline.status)
}

fn status_cell(status: &PipelineStatus) -> Cell {
    status_colored(Cell::new(status), status)
}

fn status_colored(cell: Cell, status: &PipelineStatus) -> Cell {
    match status {
        PipelineStatus::Failed => cell.fg(TableColor::Red),
        PipelineStatus::Running => cell.fg(TableColor::Blue),
        PipelineStatus::Success => cell.fg(TableColor::Green),
        _ => cell,
    }
}

fn comments_cell(mr: &MergeRequest) -> Cell {
    let Some(summary) = comments_summary(mr) else {
        return Cell::new("");
    };
    let cell = Cell::new(format!("{} · {}", summary.count, summary.tooltip));
    if summary.by_me {
        cell.fg(TableColor::Yellow)
    } else {
        cell
    }
}

fn approvals_cell(mr: &MergeRequest) -> Cell {
    let Some(summary) = approvers_summary(mr) else {
        return Cell::new("");
    };
    if mr.has_all_approvals {
        Cell::new(summary).fg(TableColor::Green)
    } else {
        Cell::new(summary)
    }
}

fn age_cell(mr: &MergeRequest, colorized: bool, now: DateTime<Utc>) -> Cell {
    if mr.state == MergeRequestState::Merged {
        return Cell::new("");
    }
    let (text, freshness) = relative_age(mr.created_at, now);
    let cell = Cell::new(text);
    if !colorized {
        return cell;
    }
    match freshness {
        Freshness::Fresh => cell.fg(TableColor::Green),
        Freshness::Aging => cell.fg(TableColor::Yellow),
        Freshness::Stale => cell.fg(TableColor::Red),
    }
}
