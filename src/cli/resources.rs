use super::ui;
use crate::core::resource::Resource;
use comfy_table::Cell;
use std::time::Duration;

fn format_interval(interval: Option<Duration>) -> String {
    match interval {
        Some(d) if d.as_secs() % 60 == 0 => format!("{}m", d.as_secs() / 60),
        Some(d) => format!("{}s", d.as_secs()),
        None => "on load".to_string(),
    }
}

/// Renders the resource catalog: routes, backend paths, forwarded query
/// parameters, cache policy and the dashboard's polling interval.
pub fn display_catalog() -> String {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Resource"),
        ui::header_cell("Route"),
        ui::header_cell("Backend path"),
        ui::header_cell("Query (default)"),
        ui::header_cell("Cache"),
        ui::header_cell("Refresh"),
    ]);

    for resource in Resource::all() {
        let params = resource.query_params();
        let query_cell = if params.is_empty() {
            ui::na_cell()
        } else {
            let text = params
                .iter()
                .map(|p| format!("{}={}", p.name, p.default))
                .collect::<Vec<_>>()
                .join(", ");
            Cell::new(text)
        };

        table.add_row(vec![
            Cell::new(resource.slug()),
            Cell::new(resource.route()),
            Cell::new(resource.upstream_template()),
            query_cell,
            Cell::new(resource.cache_policy().to_string()),
            Cell::new(format_interval(resource.refresh_interval())),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Resources", ui::StyleType::Title),
        table
    )
}
