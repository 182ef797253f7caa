/// Identifier for a plant instance owned by the host.
///
/// Sowing and plant-ending events are addressed by this id; a
/// [`crate::structure::Structure`] ignores events for any other plant.
pub type PlantId = usize;
