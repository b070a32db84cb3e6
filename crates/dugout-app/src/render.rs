// Plain-text rendering for the command-line front end.

use std::fmt::Write;

use dugout_baseball::format::format_line_stat;
use dugout_baseball::{CareerTable, RatedStat, ReferenceFrame};

use crate::card::PlayerCard;

const KEY_WIDTH: usize = 22;
const VALUE_WIDTH: usize = 8;
const SEASON_WIDTH: usize = 8;

fn percentile_cell(stat: &RatedStat) -> String {
    match stat.percentile {
        Some(p) => format!("{p:>3}"),
        None => "  -".to_string(),
    }
}

fn frame_label(frame: ReferenceFrame) -> &'static str {
    match frame {
        ReferenceFrame::League { qualified: true } => "qualified league",
        ReferenceFrame::League { qualified: false } => "league",
        ReferenceFrame::SelfHistory => "own seasons",
    }
}

/// One row per display column: key, value, percentile, tier.
pub fn render_card(card: &PlayerCard) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "player {} | {} {} | percentiles vs {} ({} qualified)",
        card.player_id,
        card.season,
        card.group,
        frame_label(card.frame),
        card.population_size
    );
    for stat in &card.stats {
        let _ = writeln!(
            out,
            "{:<KEY_WIDTH$}{:>VALUE_WIDTH$}  {}  {}",
            stat.key,
            stat.display,
            percentile_cell(stat),
            stat.tier.label()
        );
    }
    out
}

/// Seasons as rows, display columns as columns, each value followed by
/// its self-relative percentile. The career line closes the table.
pub fn render_career(table: &CareerTable) -> String {
    let columns = table.group.display_columns();
    let mut out = String::new();

    let _ = write!(out, "{:<SEASON_WIDTH$}", "season");
    for key in columns {
        let _ = write!(out, "{:>w$}", key, w = column_width(key));
    }
    out.push('\n');

    for row in &table.rows {
        let _ = write!(out, "{:<SEASON_WIDTH$}", row.season);
        for (key, stat) in columns.iter().zip(&row.stats) {
            let cell = match stat.percentile {
                Some(p) => format!("{} ({p})", stat.display),
                None => stat.display.clone(),
            };
            let _ = write!(out, "{:>w$}", cell, w = column_width(key));
        }
        out.push('\n');
    }

    if let Some(career) = &table.career {
        let _ = write!(out, "{:<SEASON_WIDTH$}", "career");
        for key in columns {
            let _ = write!(out, "{:>w$}", format_line_stat(career, key), w = column_width(key));
        }
        out.push('\n');
    }
    out
}

fn column_width(key: &str) -> usize {
    key.len().max(VALUE_WIDTH + 5) + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardRequest;
    use dugout_baseball::{
        build_career, CareerRules, Population, PopulationEntry, QualificationRules, SeasonLine,
        StatGroup, StatLine,
    };

    #[test]
    fn card_rows_show_value_percentile_and_tier() {
        let entries = (1..=4)
            .map(|i| PopulationEntry {
                player_id: Some(i),
                name: format!("P{i}"),
                team: None,
                line: StatLine::new()
                    .with("plateAppearances", 500.0)
                    .with("homeRuns", f64::from(i) * 10.0),
            })
            .collect();
        let population = Population::new(StatGroup::Hitting, entries)
            .qualify(&QualificationRules::default());
        let request = CardRequest {
            player_id: 4,
            season: 2023,
            group: StatGroup::Hitting,
        };
        let line = StatLine::new().with("homeRuns", 40.0);
        let text = render_card(&PlayerCard::build(request, line, &population));

        assert!(text.starts_with("player 4 | 2023 hitting | percentiles vs qualified league (4 qualified)"));
        let hr_row = text.lines().find(|l| l.starts_with("homeRuns")).unwrap();
        assert!(hr_row.contains(" 88  elite"), "{hr_row}");
        let avg_row = text.lines().find(|l| l.starts_with("avg")).unwrap();
        assert!(avg_row.contains("  -  unknown"), "{avg_row}");
    }

    #[test]
    fn career_table_ends_with_career_line() {
        let seasons = ["2022", "2023"]
            .iter()
            .map(|year| SeasonLine {
                season: year.to_string(),
                sport_id: Some(1),
                team: None,
                line: StatLine::new().with("atBats", 100.0).with("hits", 25.0),
            })
            .collect();
        let table = build_career(seasons, StatGroup::Hitting, &CareerRules::default());
        let text = render_career(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("season"));
        assert!(lines[3].starts_with("career"));
        assert!(lines[3].contains(".250"));
    }
}
