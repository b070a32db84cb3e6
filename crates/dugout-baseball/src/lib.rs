// Baseball stat engine: stat lines, derived stats, innings arithmetic,
// qualification, percentile ranking and career aggregation.

pub mod career;
pub mod enhance;
pub mod format;
pub mod innings;
pub mod keys;
pub mod percentile;
pub mod population;
pub mod qualify;
pub mod statline;

pub use career::{aggregate_lines, build_career, CareerRules, CareerTable, SeasonLine};
pub use enhance::enhance;
pub use keys::StatGroup;
pub use percentile::{calculate_percentile, Direction, PercentileTier};
pub use population::{
    league_percentile, Population, PopulationEntry, QualifiedPopulation, RatedStat, ReferenceFrame,
    ReferencePopulation,
};
pub use qualify::QualificationRules;
pub use statline::{StatLine, StatValue};
