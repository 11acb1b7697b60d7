pub mod compiler_frontend;
pub mod settings;

pub use compiler_frontend::compiler_errors::{CompilerError, CompilerMessages, ErrorType};
pub use compiler_frontend::dfir::dfir_graph::DataflowGraph;
pub use compiler_frontend::type_inference::types::{InferenceReport, PortAnnotation};
pub use compiler_frontend::{
    InferenceFrontend, InferencePhase, infer_and_collect_messages, infer_types,
};
pub use settings::InferenceConfig;
