use crate::compiler_frontend::compiler_messages::port_diagnostics::PortDiagnostics;
use crate::compiler_frontend::dfir::dfir_nodes::{NodeId, PortId, ScopeId};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

// The final set of fatal errors and recoverable port diagnostics emitted from inference
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub diagnostics: PortDiagnostics,
}

impl CompilerMessages {
    pub fn from_error(error: CompilerError) -> Self {
        CompilerMessages {
            errors: vec![error],
            diagnostics: PortDiagnostics::default(),
        }
    }

    pub fn from_diagnostics(diagnostics: PortDiagnostics) -> Self {
        CompilerMessages {
            errors: Vec::new(),
            diagnostics,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.diagnostics.is_empty()
    }
}

#[derive(Debug, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    CompilationStage,

    // Optional suggestions
    PrimarySuggestion,

    LifetimeHint, // For lifetime inference explanations
}

/// Where in the dataflow graph an error was raised.
/// There is no source text at this level, so locations name graph entities instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    pub scope: Option<ScopeId>,
    pub node: Option<NodeId>,
    pub port: Option<PortId>,
}

impl ErrorLocation {
    pub fn at_scope(scope: ScopeId) -> Self {
        ErrorLocation {
            scope: Some(scope),
            ..ErrorLocation::default()
        }
    }

    pub fn at_node(node: NodeId) -> Self {
        ErrorLocation {
            node: Some(node),
            ..ErrorLocation::default()
        }
    }

    pub fn at_port(node: NodeId, port: PortId) -> Self {
        ErrorLocation {
            node: Some(node),
            port: Some(port),
            ..ErrorLocation::default()
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if let Some(scope) = self.scope {
            parts.push(format!("{scope}"));
        }
        if let Some(node) = self.node {
            parts.push(format!("{node}"));
        }
        if let Some(port) = self.port {
            parts.push(format!("{port}"));
        }

        if parts.is_empty() {
            write!(f, "<unknown location>")
        } else {
            write!(f, "{}", parts.join(" / "))
        }
    }
}

#[derive(Debug)]
pub struct CompilerError {
    pub msg: String,
    pub location: ErrorLocation,
    pub error_type: ErrorType,

    // This is for creating more structured and detailed error messages
    pub metadata: HashMap<ErrorMetaDataKey, &'static str>,
}

impl CompilerError {
    pub fn new(
        msg: impl Into<String>,
        location: ErrorLocation,
        error_type: ErrorType,
    ) -> CompilerError {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: HashMap::new(),
        }
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: &'static str) {
        self.metadata.insert(key, value);
    }

    /// Create a compiler error (internal bug, not user's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompilerError {
            msg: msg.into(),
            location: ErrorLocation::default(),
            error_type: ErrorType::Compiler,
            metadata: HashMap::new(),
        }
    }

    /// Create a file system error for a config file that could not be read
    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        CompilerError {
            msg: format!("{}: {}", path.display(), msg.into()),
            location: ErrorLocation::default(),
            error_type: ErrorType::File,
            metadata: HashMap::new(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        CompilerError {
            msg: msg.into(),
            location: ErrorLocation::default(),
            error_type: ErrorType::Config,
            metadata: HashMap::new(),
        }
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: {}",
            error_type_to_str(&self.error_type),
            self.location,
            self.msg
        )
    }
}

impl std::error::Error for CompilerError {}

// Adds more information to the CompilerError
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ErrorType {
    File,
    Config,
    Compiler,

    // Borrow and termination insertion disagree about a lifetime group.
    // This is an inconsistency inside the inference engine, never a user mistake.
    LifetimeTermination,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::Compiler => "Compiler Bug",
        ErrorType::Config => "Malformed Config",
        ErrorType::File => "File Error",
        ErrorType::LifetimeTermination => "Lifetime Termination Mismatch",
    }
}

/// Returns a new CompilerError for internal compiler bugs.
///
/// Compiler errors indicate bugs in the inference engine itself or a host graph that
/// breaks the engine's contract, not user code issues.
#[macro_export]
macro_rules! return_compiler_error {
    // Variant with format string, arguments, and metadata (with semicolon separator)
    ($fmt:expr, $($arg:expr),+ ; { $( $key:ident => $value:expr ),* $(,)? }) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: format!($fmt, $($arg),+),
            location: $crate::compiler_frontend::compiler_errors::ErrorLocation::default(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Compiler,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        });
    }};
    // Variant with format string and arguments (no metadata)
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: format!($fmt, $($arg),+),
            location: $crate::compiler_frontend::compiler_errors::ErrorLocation::default(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Compiler,
            metadata: std::collections::HashMap::new(),
        });
    }};
    // Variant with message and metadata (with semicolon separator)
    ($msg:expr ; { $( $key:ident => $value:expr ),* $(,)? }) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $crate::compiler_frontend::compiler_errors::ErrorLocation::default(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Compiler,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        });
    }};
    // Simple variant with just message (no metadata)
    ($msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $crate::compiler_frontend::compiler_errors::ErrorLocation::default(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Compiler,
            metadata: std::collections::HashMap::new(),
        });
    }};
}

/// Returns a new CompilerError for a lifetime group whose termination points do not
/// cover all of its borrow points.
///
/// Usage: `return_lifetime_termination_error!("message", location, { CompilationStage => "Borrow Insertion" })`;
#[macro_export]
macro_rules! return_lifetime_termination_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::LifetimeTermination,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        })
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::LifetimeTermination,
            metadata: std::collections::HashMap::new(),
        })
    };
}

/// Returns a new CompilerError for a malformed inference config.
///
/// Usage: `return_config_error!("message", { PrimarySuggestion => "..." })`;
#[macro_export]
macro_rules! return_config_error {
    ($msg:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $crate::compiler_frontend::compiler_errors::ErrorLocation::default(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Config,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        })
    };
    ($msg:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::config_error($msg))
    };
}

/// Returns a new CompilerError for a config file that could not be read
///
/// Usage: `return_file_error!(path, "message")`;
#[macro_export]
macro_rules! return_file_error {
    ($path:expr, $msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::file_error(
            $path, $msg,
        ));
    }};
}
