//! Payload boundary implemented by generated code.

use crate::error::{FromWireError, PayloadError};
use crate::wire::{EnvelopeKind, Value};

/// An outbound method payload, usually a generated `Args` struct.
pub trait Enveloper: Send + Sync {
    /// Name of the method being called.
    fn method_name(&self) -> &str;

    /// Kind of envelope the payload must be sent in.
    fn envelope_kind(&self) -> EnvelopeKind;

    /// Serialize the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is invalid, such as when a required
    /// field is unset.
    fn to_wire(&self) -> Result<Value, PayloadError>;
}

/// Types that can be read from a [`Value`].
pub trait FromWire: Sized {
    /// Convert `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not have the expected shape.
    fn from_wire(value: &Value) -> Result<Self, FromWireError>;
}
