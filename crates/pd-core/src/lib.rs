pub mod codec;
pub mod config;
pub mod defaults;
pub mod geometry;
pub mod hit;
pub mod id;
pub mod layout;
pub mod lint;
pub mod model;
pub mod patch;
pub mod transform;

pub use codec::{DeserializationError, SerializationError};
pub use config::{ConfigError, EditorConfig};
pub use geometry::Bounds;
pub use hit::{NodeRef, hit_test};
pub use id::NodeId;
pub use layout::{PanelLayout, Viewport, panel_geometry};
pub use lint::{LintDiagnostic, LintSeverity, lint_document};
pub use model::*;
pub use patch::NodePatch;
pub use transform::{TransformEnd, fold_node, fold_panel};
