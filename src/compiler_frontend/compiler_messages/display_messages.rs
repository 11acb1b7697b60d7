use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages, ErrorType};
use crate::compiler_frontend::compiler_messages::port_diagnostics::{
    DiagnosticKind, PortDiagnostic, PortDiagnostics,
};
use saying::say;

pub fn print_compiler_messages(messages: CompilerMessages) {
    // Fatal errors first, then one block per port that has diagnostics
    for err in messages.errors {
        print_formatted_error(err);
    }

    print_port_diagnostics(&messages.diagnostics);
}

pub fn print_port_diagnostics(diagnostics: &PortDiagnostics) {
    let mut current_port = None;

    for diagnostic in diagnostics.sorted() {
        if current_port != Some(diagnostic.port) {
            current_port = Some(diagnostic.port);
            say!("\n(ಠ_ಠ) ", Dark Magenta { diagnostic.port.to_string() });
        }

        print_port_diagnostic(diagnostic);
    }
}

fn print_port_diagnostic(diagnostic: &PortDiagnostic) {
    match &diagnostic.kind {
        DiagnosticKind::TypeMismatch { .. } => {
            say!(Red "  Type Error: ", { diagnostic.message() });
        }
        DiagnosticKind::NotMutable => {
            say!(Red "  Mutability: ", { diagnostic.message() });
        }
        DiagnosticKind::FailedConstraint(_) => {
            say!(Red "  Constraint: ", { diagnostic.message() });
        }
        DiagnosticKind::FeatureDisabled(_) => {
            say!(Yellow "  Disabled: ", { diagnostic.message() });
        }
    }
}

pub fn print_formatted_error(e: CompilerError) {
    let location = e.location.to_string();

    match e.error_type {
        ErrorType::File => {
            say!(Yellow "🏚 Can't find/read file or directory");
            say!(e.msg);
            return;
        }

        ErrorType::Config => {
            say!("\n (-_-)  🔥🔥🔥🔥 ", Dark Magenta location, " 🔥🔥🔥🔥  <(^~^)/ ");
            say!(Yellow "CONFIG FILE ISSUE- ");
            say!(Dark Yellow "Malformed inference config, something doesn't make sense inside it");
        }

        ErrorType::Compiler => {
            say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥🔥 ", Dark Magenta location, " 🔥🔥🔥🔥  ╰(° _ o╰) ");
            say!(Yellow "COMPILER BUG - ");
            say!(Dark Yellow "inference developer skill issue (not your fault)");
        }

        ErrorType::LifetimeTermination => {
            say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥 ", Dark Magenta location, " 🔥🔥🔥  ╰(°□°╰) ");
            say!(Yellow "LIFETIME TERMINATION BUG - ");
            say!(Dark Yellow "borrow insertion disagrees with itself (not your fault)");
        }
    }

    say!(Red e.msg);

    for (key, value) in &e.metadata {
        say!(Dark Magenta format!("{key:?}: "), { value.to_string() });
    }
}
