// Adapters layer: concrete classifiers and the artifact loader that builds them.

pub mod artifact;
pub mod forest;
pub mod linear;

pub use artifact::{JsonArtifactLoader, ModelArtifact, ModelSpec, ARTIFACT_FORMAT_VERSION};
pub use forest::{DecisionTree, TreeEnsemble, TreeNode};
pub use linear::{LogisticRegression, StandardScaler};
