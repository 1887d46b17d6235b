pub mod negotiator;
pub mod params;

pub use negotiator::{FlowError, FlowEvent, FlowState, GoalContext, ParameterFlow};
pub use params::ParamSet;
