/// Target Function Module
///
/// The two declarations that get redirected to the replacement networking module,
/// and the structural predicates that recognise them.

use crate::domain::ast::FuncDecl;

/// A redirected entry point of the net package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKind {
    /// `func (d *Dialer) DialContext(ctx context.Context, network, address string) (Conn, error)`
    DialContext,
    /// `func Listen(network, address string) (Listener, error)`
    Listen,
}

impl TargetKind {
    /// Stub emission order.
    pub const ALL: [TargetKind; 2] = [TargetKind::DialContext, TargetKind::Listen];

    /// Structural predicate over a top-level declaration. Matching is purely by name:
    /// any type spelled `Dialer` qualifies as the receiver, which must be named.
    pub fn matches(&self, decl: &FuncDecl) -> bool {
        match self {
            TargetKind::DialContext => {
                if decl.name != "DialContext" {
                    return false;
                }
                match decl.receiver.as_deref() {
                    Some([recv]) => recv.names.len() == 1 && recv.ty.is_pointer_to("Dialer"),
                    _ => false,
                }
            }
            TargetKind::Listen => decl.name == "Listen" && decl.receiver.is_none(),
        }
    }

    /// Local name of the body-less forward declaration.
    pub fn placeholder(&self) -> &'static str {
        match self {
            TargetKind::DialContext => "_dialContext",
            TargetKind::Listen => "_listen",
        }
    }

    /// Symbol exported by the replacement module.
    pub fn external_symbol(&self) -> &'static str {
        match self {
            TargetKind::DialContext => "DialContext",
            TargetKind::Listen => "Listen",
        }
    }

    /// `//go:linkname` line binding the placeholder to `module`.
    pub fn linkname_directive(&self, module: &str) -> String {
        format!(
            "//go:linkname {} {}.{}",
            self.placeholder(),
            module,
            self.external_symbol()
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::DialContext => "net.(*Dialer).DialContext",
            TargetKind::Listen => "net.Listen",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
