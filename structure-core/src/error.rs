use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructureError {
    #[error("max cover must exceed zero in a sowing record (got {max_cover})")]
    InvalidMaxCover { max_cover: f64 },
    #[error("bud number must exceed zero in a sowing record (got {bud_number})")]
    InvalidBudNumber { bud_number: f64 },
    #[error("thinning proportion must lie within [0, 1] (got {proportion})")]
    InvalidThinProportion { proportion: f64 },
    #[error("initial main-stem node number must exceed zero (got {node_number})")]
    InvalidInitialNodeNumber { node_number: f64 },
    #[error("{operation} requires an active season")]
    SeasonInactive { operation: &'static str },
    #[error("primary bud number is zero")]
    ZeroPrimaryBudNumber,
}

pub type Result<T> = std::result::Result<T, StructureError>;
