pub mod dependency_dag;

pub use dependency_dag::DependencyDag;
