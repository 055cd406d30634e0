use contracts::shared::tableau_widget::{cell, ChartData, ChartType, PieSlice, RenderPayload};

/// Reshape chart data into what the renderer expects for the chart type
pub fn render_payload(chart_type: ChartType, chart: &ChartData) -> RenderPayload {
    match chart_type {
        ChartType::Pie => RenderPayload::Pie {
            slices: pie_slices(chart),
        },
        ChartType::Table => {
            let columns: Vec<String> = std::iter::once(chart.x_key.clone())
                .chain(chart.y_keys.iter().cloned())
                .collect();
            let rows = chart
                .data
                .iter()
                .map(|row| columns.iter().map(|c| cell(row, c).clone()).collect())
                .collect();
            RenderPayload::Table { columns, rows }
        }
        ChartType::Bar
        | ChartType::Line
        | ChartType::Area
        | ChartType::Radar
        | ChartType::Scatter => RenderPayload::Series(chart.clone()),
    }
}

/// `xKey → name`, first `yKey → value`; non-numeric values count as zero
fn pie_slices(chart: &ChartData) -> Vec<PieSlice> {
    let Some(y_key) = chart.y_keys.first() else {
        return Vec::new();
    };
    chart
        .data
        .iter()
        .map(|row| {
            let value = cell(row, y_key).as_number();
            PieSlice {
                name: cell(row, &chart.x_key).as_text(),
                value: if value.is_nan() { 0.0 } else { value },
            }
        })
        .collect()
}
