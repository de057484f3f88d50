//! Output heads and the shared device/weights infrastructure they run on.

pub mod heads;
pub mod shared;

pub use heads::{
    ArgumentOnlyHead, ArgumentProjection, ArgumentRegressionHead, CommandArgumentHead,
    HierarchicalHead, ResidualMlp,
};
pub use shared::device::{DeviceKind, DeviceProfile, DeviceSelector};
pub use shared::weights::{fresh_var_builder, load_weights, save_weights};
