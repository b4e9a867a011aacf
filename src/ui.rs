use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use console::style;

use crate::model::RiskLevel;

pub fn render_header(title: &str) {
    println!("\n{}", style(format!("▸ {title}")).cyan().bold());
}

pub fn build_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.iter().map(|text| header_cell(text)).collect::<Vec<_>>());
    table
}

pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
        .add_attribute(Attribute::Underlined)
}

pub fn label_cell(text: &str) -> Cell {
    Cell::new(text).fg(Color::Rgb {
        r: 160,
        g: 196,
        b: 255,
    })
}

pub fn risk_cell(risk: RiskLevel) -> Cell {
    Cell::new(risk.label()).fg(risk_color(risk))
}

pub fn risk_color(risk: RiskLevel) -> Color {
    match risk {
        RiskLevel::Safe => Color::Green,
        RiskLevel::Low => Color::White,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
    }
}

/// Variante para texto plano fuera de tablas.
pub fn style_risk(risk: RiskLevel) -> console::StyledObject<&'static str> {
    let text = risk.label();
    match risk {
        RiskLevel::Safe => style(text).green(),
        RiskLevel::Low => style(text).white(),
        RiskLevel::Medium => style(text).yellow(),
        RiskLevel::High => style(text).red(),
    }
}
