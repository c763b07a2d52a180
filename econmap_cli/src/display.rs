use comfy_table::{presets::NOTHING, *};
use itertools::izip;

use econmap::{
    metric::{Metric, MetricSummary},
    COL,
};
use polars::frame::DataFrame;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

pub fn display_metrics() {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Label").add_attribute(Attribute::Bold),
    ]);
    for metric in <Metric as strum::IntoEnumIterator>::iter() {
        table.add_row(vec![metric.column(), metric.label()]);
    }
    println!("\n{}", table);
}

pub fn display_summary(summaries: &[MetricSummary]) {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Countries with value").add_attribute(Attribute::Bold),
        Cell::new("Missing").add_attribute(Attribute::Bold),
        Cell::new("Min").add_attribute(Attribute::Bold),
        Cell::new("Max").add_attribute(Attribute::Bold),
        Cell::new("Mean").add_attribute(Attribute::Bold),
    ]);
    for summary in summaries {
        table.add_row(vec![
            summary.metric.label().to_string(),
            summary.present.to_string(),
            summary.missing.to_string(),
            format_value(summary.min),
            format_value(summary.max),
            format_value(summary.mean),
        ]);
    }
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Left);
    }
    println!("\n{}", table);
}

pub fn display_merged(merged: DataFrame, max_results: Option<usize>) -> anyhow::Result<()> {
    let df_to_show = match max_results {
        Some(max) => merged.head(Some(max)),
        None => merged,
    };
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Country").add_attribute(Attribute::Bold),
        Cell::new(Metric::EciTrade.label()).add_attribute(Attribute::Bold),
        Cell::new(Metric::QuantityMarketShare.label()).add_attribute(Attribute::Bold),
        Cell::new(Metric::SelfExposure.label()).add_attribute(Attribute::Bold),
    ]);
    for (country_code, eci_trade, quantity_market_share, self_exposure) in izip!(
        df_to_show.column(COL::COUNTRY_CODE)?.str()?,
        df_to_show.column(COL::ECI_TRADE)?.f64()?,
        df_to_show.column(COL::QUANTITY_MARKET_SHARE)?.f64()?,
        df_to_show.column(COL::SELF_EXPOSURE)?.f64()?,
    ) {
        table.add_row(vec![
            country_code.unwrap_or_default().to_string(),
            format_value(eci_trade),
            format_value(quantity_market_share),
            format_value(self_exposure),
        ]);
    }
    println!("\n{}", table);
    Ok(())
}
