//! Output heads mapping encoder/decoder hidden state to task logits.
//!
//! Every head owns its parameters through `candle_nn::Linear` and names
//! them so converted checkpoints load without remapping:
//!
//! | Head | Parameters |
//! |---|---|
//! | [`CommandArgumentHead`] | `command_fcn.*`, `args_fcn.*` |
//! | [`ArgumentOnlyHead`] | `args_fcn.*` |
//! | [`ArgumentRegressionHead`] | `args_fcn.*` or `args_fcn.{0,1}.*` |
//! | [`HierarchicalHead`] | `visibility_fcn.*`, `z_fcn.*` |
//! | [`ResidualMlp`] | `linear{1..4}.0.*` |
//!
//! Build from `VarBuilder::from_varmap` to train, or from
//! [`load_weights`](crate::models::shared::weights::load_weights) to run a
//! checkpoint.

pub mod argument;
pub mod command;
pub mod hierarchical;
pub mod projection;
pub mod residual;

pub use argument::{ArgumentOnlyHead, ArgumentRegressionHead};
pub use command::CommandArgumentHead;
pub use hierarchical::HierarchicalHead;
pub use projection::ArgumentProjection;
pub use residual::ResidualMlp;
