//! Population, demand, and pandemic scenario projection

mod growth;
mod population;
mod demand;
mod pandemic;

pub use growth::{compound_average, linear_trend, mean_annual_change, GrowthError, GrowthEstimate, GrowthStrategy};
pub use population::{project, PopulationForecast, PopulationForecastPoint, PopulationForecaster, PopulationTotal};
pub use demand::{total_demand, DemandForecastPoint, DemandForecaster};
pub use pandemic::{
    total_surge_demand, DecayShape, ExponentialSurge, LinearSurge, PandemicScenarioPoint, PandemicSimulator,
    SurgeCurve,
};
