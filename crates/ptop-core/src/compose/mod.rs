//! Template selection and query composition.
//!
//! The [`TemplateRegistry`] maps a [`QueryType`] selector to the ordered
//! [`TemplateKind`]s to run; the [`QueryComposer`] renders each kind for
//! every target metric and wraps it in the label join so the resulting
//! vector carries namespace, pod and deployment labels.

pub mod composer;
pub mod registry;
pub mod template;

pub use composer::{ComposedQuery, QueryComposer, DEPLOYMENT_LABEL, NAMESPACE_LABEL, POD_LABEL};
pub use registry::{select_templates, QueryType, TemplateKind, TemplateRegistry};
pub use template::{ComposeError, Template};
