//! Netlist construction and query errors.

/// Errors raised while building or querying a design.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// The named module has no body to add instances or connections to.
    #[error("module '{module}' has no body")]
    NoBody {
        /// The module name.
        module: String,
    },

    /// An instance with this name already exists in the body.
    #[error("duplicate instance name '{name}'")]
    DuplicateInstance {
        /// The clashing instance name.
        name: String,
    },

    /// A path did not resolve to a wire.
    #[error("cannot select '{path}'")]
    UnknownSelect {
        /// The offending path in display form.
        path: String,
    },

    /// A connection endpoint has leaves of both directions.
    #[error("select '{select}' has mixed directions")]
    MixedDirection {
        /// The offending select in display form.
        select: String,
    },

    /// Both connection endpoints face the same direction.
    #[error("cannot connect '{a}' to '{b}': no driver/receiver pairing")]
    DirectionConflict {
        /// One endpoint.
        a: String,
        /// The other endpoint.
        b: String,
    },

    /// Connection endpoints differ structurally.
    #[error("shape mismatch connecting '{a}' to '{b}'")]
    ShapeMismatch {
        /// One endpoint.
        a: String,
        /// The other endpoint.
        b: String,
    },

    /// A named type wrapping a non-bit raw type reached a connection.
    #[error("named type at '{select}' does not wrap a bit")]
    NamedNotBit {
        /// The offending select in display form.
        select: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            NetlistError::NoBody {
                module: "top".into()
            }
            .to_string(),
            "module 'top' has no body"
        );
        assert_eq!(
            NetlistError::DuplicateInstance { name: "m0".into() }.to_string(),
            "duplicate instance name 'm0'"
        );
        assert_eq!(
            NetlistError::UnknownSelect {
                path: "self.bogus".into()
            }
            .to_string(),
            "cannot select 'self.bogus'"
        );
        assert_eq!(
            NetlistError::MixedDirection {
                select: "self".into()
            }
            .to_string(),
            "select 'self' has mixed directions"
        );
        assert_eq!(
            NetlistError::DirectionConflict {
                a: "a.out".into(),
                b: "b.out".into()
            }
            .to_string(),
            "cannot connect 'a.out' to 'b.out': no driver/receiver pairing"
        );
        assert_eq!(
            NetlistError::ShapeMismatch {
                a: "a.out".into(),
                b: "b.in".into()
            }
            .to_string(),
            "shape mismatch connecting 'a.out' to 'b.in'"
        );
        assert_eq!(
            NetlistError::NamedNotBit {
                select: "r.clk".into()
            }
            .to_string(),
            "named type at 'r.clk' does not wrap a bit"
        );
    }
}
